//! Shared fixtures for integration tests
//!
//! `SqliteDriver` runs the MySQL platform's SQL against an in-memory SQLite
//! database. SQLite accepts backtick identifiers and `LIMIT n OFFSET m`,
//! which is everything the compiled statements need here.

#![allow(dead_code)]

use async_trait::async_trait;
use fluentdb::database::driver::{Driver, QueryResult};
use fluentdb::{Connection, ConnectionManager, Error, PlatformKind, Result, Row, SqlValue};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use std::sync::Arc;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub struct SqliteDriver {
    pool: SqlitePool,
}

impl SqliteDriver {
    pub async fn memory() -> Self {
        // One connection so every statement sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        Self { pool }
    }

    fn bind(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
        match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Float(f) => query.bind(f as f64),
            SqlValue::Double(f) => query.bind(f),
            SqlValue::Bytes(bytes) => query.bind(bytes),
            other => match other.as_i64() {
                Some(i) if !matches!(other, SqlValue::String(_) | SqlValue::Text(_)) => {
                    query.bind(i)
                }
                _ => query.bind(other.as_string().unwrap_or_default()),
            },
        }
    }

    fn convert(row: &SqliteRow) -> Result<Row> {
        let mut out = Row::with_capacity(row.columns().len());
        for column in row.columns() {
            let index = column.ordinal();
            let raw = row
                .try_get_raw(index)
                .map_err(|e| Error::driver(e.to_string()))?;

            let value = if raw.is_null() {
                SqlValue::Null
            } else {
                let type_name = raw.type_info().name().to_string();
                match type_name.as_str() {
                    "INTEGER" => row.try_get::<i64, _>(index).map(SqlValue::BigInt),
                    "REAL" => row.try_get::<f64, _>(index).map(SqlValue::Double),
                    "BLOB" => row.try_get::<Vec<u8>, _>(index).map(SqlValue::Bytes),
                    _ => row.try_get::<String, _>(index).map(SqlValue::String),
                }
                .map_err(|e| Error::driver(e.to_string()))?
            };
            out.push(column.name(), value);
        }
        Ok(out)
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        "sqlite-test"
    }

    fn escape(&self, value: &str) -> String {
        value.replace('\'', "''")
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::driver(e.to_string()))
    }

    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        let query = params.into_iter().fold(sqlx::query(sql), Self::bind);
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| Error::driver(e.to_string()))?;
        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(result.last_insert_rowid()),
        })
    }

    async fn fetch_all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>> {
        let query = params.into_iter().fold(sqlx::query(sql), Self::bind);
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::driver(e.to_string()))?;
        rows.iter().map(Self::convert).collect()
    }
}

/// Driver that never touches a database, for compile-only tests
pub struct OfflineDriver;

#[async_trait]
impl Driver for OfflineDriver {
    fn name(&self) -> &str {
        "offline"
    }

    fn escape(&self, value: &str) -> String {
        fluentdb::database::drivers::mysql::escape_string(value)
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }

    async fn execute(&self, _sql: &str, _params: Vec<SqlValue>) -> Result<QueryResult> {
        Ok(QueryResult::default())
    }

    async fn fetch_all(&self, _sql: &str, _params: Vec<SqlValue>) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }
}

pub async fn offline() -> Arc<Connection> {
    ConnectionManager::with_driver(PlatformKind::MySql, Arc::new(OfflineDriver))
        .expect("mysql platform")
        .connection()
        .await
        .expect("offline connection")
}

pub const DEPARTMENTS: [&str; 3] = ["Sales", "Engineering", "Support"];

const NAMES: [&str; 25] = [
    "Nathalie", "Omar", "Priya", "Quentin", "Rosa", "Samuel", "Tomoko", "Ulrich", "Valeria",
    "Wei", "Ximena", "Yusuf", "Zoe", "Amara", "Bruno", "Chiara", "Dmitri", "Elif", "Femi",
    "Gustav", "Hana", "Ivan", "Jonathan", "Kaito", "Leila",
];

/// Salary of employee `id` in the fixture
pub fn salary_of(id: i64) -> i64 {
    3000 + id * 100
}

/// Connection over a fresh `employees` table holding ids 1..=25
///
/// Ids 1-3 head a department and have no manager; every other employee
/// reports to the head of their department.
pub async fn employees() -> Arc<Connection> {
    let driver = Arc::new(SqliteDriver::memory().await);
    driver
        .execute(
            "CREATE TABLE employees (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                department TEXT NOT NULL,
                salary INTEGER NOT NULL,
                manager_id INTEGER NULL
            )",
            Vec::new(),
        )
        .await
        .expect("create employees");

    let conn = ConnectionManager::with_driver(PlatformKind::MySql, driver)
        .expect("mysql platform")
        .connection()
        .await
        .expect("connection");

    for (i, name) in NAMES.iter().enumerate() {
        let id = i as i64 + 1;
        let department = DEPARTMENTS[i % DEPARTMENTS.len()];
        let manager = if id <= 3 {
            SqlValue::Null
        } else {
            SqlValue::BigInt((i % DEPARTMENTS.len()) as i64 + 1)
        };

        conn.new_query()
            .table("employees")
            .insert([
                ("id", SqlValue::BigInt(id)),
                ("name", SqlValue::from(*name)),
                ("department", SqlValue::from(department)),
                ("salary", SqlValue::BigInt(salary_of(id))),
                ("manager_id", manager),
            ])
            .execute()
            .await
            .expect("insert employee");
    }

    conn
}
