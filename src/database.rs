// ABOUTME: SQLite-backed storage for local user accounts projected from ID-token claims
// ABOUTME: Provides upsert/get/delete keyed by the external user id
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Local user storage.
//!
//! A successful login upserts the user's row; disconnect deletes it.
//! The table is keyed by the external user id the accounting platform
//! assigns, so repeated sign-ins converge on one row per user.

use crate::models::LocalUser;
use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::str::FromStr;

/// SQLite store for [`LocalUser`] records.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    /// Open (creating if missing) the database at `database_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the URL is invalid or the database cannot
    /// be opened.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        Ok(Self { pool })
    }

    /// Create the users table when absent.
    ///
    /// # Errors
    ///
    /// Returns an error when the DDL statement fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                external_user_id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                session_id TEXT NOT NULL,
                name TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert the user or update the existing row for the same external
    /// user id.
    ///
    /// # Errors
    ///
    /// Returns an error when the statement fails.
    pub async fn upsert_user(&self, user: &LocalUser) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users (external_user_id, email, session_id, name, first_name, last_name)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(external_user_id) DO UPDATE SET
                email = excluded.email,
                session_id = excluded.session_id,
                name = excluded.name,
                first_name = excluded.first_name,
                last_name = excluded.last_name
            ",
        )
        .bind(&user.external_user_id)
        .bind(&user.email)
        .bind(&user.session_id)
        .bind(&user.name)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a user by external user id.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn get_user(&self, external_user_id: &str) -> Result<Option<LocalUser>> {
        let row = sqlx::query("SELECT * FROM users WHERE external_user_id = ?1")
            .bind(external_user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(LocalUser {
                external_user_id: row.try_get("external_user_id")?,
                email: row.try_get("email")?,
                session_id: row.try_get("session_id")?,
                name: row.try_get("name")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
            })),
            None => Ok(None),
        }
    }

    /// Delete a user's row. Deleting an absent row is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the statement fails.
    pub async fn delete_user(&self, external_user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE external_user_id = ?1")
            .bind(external_user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Number of stored users.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub async fn user_count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }
}
