//! Relational store for users, lists and tasks.
//!
//! A thin layer over an sqlx SQLite pool. Each method is a single statement
//! except [`Database::delete_list`], which removes a list and its tasks in one
//! transaction. Queries are built at runtime (`query_as`), so the crate builds
//! without a live database.

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::models::{List, ListId, NewTask, Task, User, UserId, UserLookup};

/// Handle to the domain database. Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (creating if needed) the SQLite database at `url` and applies
    /// pending migrations.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::from_pool(pool).await
    }

    /// A private in-memory database, used by tests and throwaway runs.
    ///
    /// The pool is pinned to a single connection that is never recycled,
    /// since each SQLite in-memory connection is its own database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Whether any user matches `lookup`.
    pub async fn user_exists(&self, lookup: UserLookup<'_>) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM users WHERE {} = ?)",
            lookup.column()
        );
        let (exists,): (bool,) = sqlx::query_as(&sql)
            .bind(lookup.value())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn find_user(&self, lookup: UserLookup<'_>) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT * FROM users WHERE {} = ?", lookup.column());
        sqlx::query_as::<_, User>(&sql)
            .bind(lookup.value())
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Inserts a user. A duplicate username or email surfaces as a unique
    /// violation (see [`crate::error::is_unique_violation`]).
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn create_list(&self, user_id: UserId, title: &str) -> Result<List, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, List>(
            "INSERT INTO lists (title, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING *",
        )
        .bind(title)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_list(&self, id: ListId) -> Result<Option<List>, sqlx::Error> {
        sqlx::query_as::<_, List>("SELECT * FROM lists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Lists owned by `user_id`, in storage order.
    pub async fn lists_by_user(&self, user_id: UserId) -> Result<Vec<List>, sqlx::Error> {
        sqlx::query_as::<_, List>("SELECT * FROM lists WHERE user_id = ? ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Deletes the list and every task in it. Returns the number of tasks
    /// removed.
    pub async fn delete_list(&self, id: ListId) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let tasks = sqlx::query("DELETE FROM tasks WHERE list_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let lists = sqlx::query("DELETE FROM lists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if lists == 0 {
            tx.rollback().await?;
            return Err(sqlx::Error::RowNotFound);
        }
        tx.commit().await?;
        Ok(tasks)
    }

    pub async fn create_task(&self, task: NewTask) -> Result<Task, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (title, description, due_date, completed, list_id, created_at, updated_at)
             VALUES (?, ?, ?, FALSE, ?, ?, ?)
             RETURNING *",
        )
        .bind(task.title)
        .bind(task.description)
        .bind(task.due_date)
        .bind(task.list_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Tasks in `list_id`, in storage order.
    pub async fn tasks_by_list(&self, list_id: ListId) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE list_id = ? ORDER BY id")
            .bind(list_id)
            .fetch_all(&self.pool)
            .await
    }
}
