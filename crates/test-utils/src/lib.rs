//! Tabula test utilities.
//!
//! Helpers for integration testing: user fixtures, table state query
//! builders, and assertion utilities for SQL and JSON output.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Schema of the `user` table the listing reads from.
pub const USER_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS "user" (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    image TEXT,
    role TEXT,
    banned BOOLEAN,
    tags TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

/// Create the `user` table if it does not exist.
pub async fn create_user_table(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(USER_TABLE_DDL).execute(pool).await?;
    sqlx::query(r#"ALTER TABLE "user" ADD COLUMN IF NOT EXISTS tags TEXT[] NOT NULL DEFAULT '{}'"#)
        .execute(pool)
        .await?;
    Ok(())
}

/// Create a test user with default values.
///
/// The email is derived from the name and a fresh id so fixtures never
/// collide on the unique index.
pub fn test_user(name: &str) -> TestUser {
    let id = Uuid::now_v7().to_string();
    let local = name.to_lowercase().replace(' ', ".");
    let created_at = Utc::now();
    TestUser {
        email: format!("{local}.{}@example.com", &id[id.len() - 8..]),
        id,
        name: name.to_string(),
        image: None,
        role: Some("user".to_string()),
        banned: Some(false),
        tags: Vec::new(),
        created_at,
        updated_at: created_at,
    }
}

/// A test user builder.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: Option<String>,
    pub banned: Option<bool>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TestUser {
    /// Set a custom email.
    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    /// Set the role.
    pub fn with_role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    /// Make the user an admin.
    pub fn admin(self) -> Self {
        self.with_role("admin")
    }

    /// Mark as banned.
    pub fn banned(mut self) -> Self {
        self.banned = Some(true);
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Set both timestamps to midnight UTC of the given day.
    pub fn created_on(mut self, year: i32, month: u32, day: u32) -> Self {
        if let Some(at) = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single() {
            self.created_at = at;
            self.updated_at = at;
        }
        self
    }

    /// The row as PostgreSQL's `row_to_json` would produce it.
    pub fn to_row_json(&self) -> JsonValue {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "email": self.email,
            "image": self.image,
            "role": self.role,
            "banned": self.banned,
            "tags": self.tags,
            "created_at": self.created_at.to_rfc3339(),
            "updated_at": self.updated_at.to_rfc3339(),
        })
    }

    /// Insert the user.
    pub async fn insert(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO "user" (id, name, email, image, role, banned, tags, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(&self.id)
        .bind(&self.name)
        .bind(&self.email)
        .bind(&self.image)
        .bind(&self.role)
        .bind(self.banned)
        .bind(&self.tags)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Builders for table state query parameters.
pub mod table_state {
    use serde_json::{Value, json};

    /// One `sort` record.
    pub fn sort(id: &str, desc: bool) -> String {
        json!({ "id": id, "desc": desc }).to_string()
    }

    /// One `filter` record.
    pub fn filter(id: &str, operator: &str, values: Value) -> String {
        json!({
            "id": id,
            "value": { "operator": operator, "values": values }
        })
        .to_string()
    }

    /// Join records the way the table UI does, escaping `;` inside each.
    pub fn list(records: &[String]) -> String {
        records
            .iter()
            .map(|r| r.replace(';', "%3B"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Percent-encode `pairs` as a query string, without the leading `?`.
    pub fn query_string(pairs: &[(&str, &str)]) -> String {
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Assertion helpers for SQL and JSON output.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that `first` appears before `second` in `haystack`.
    pub fn ordered(haystack: &str, first: &str, second: &str) {
        let a = haystack.find(first);
        let b = haystack.find(second);
        assert!(
            matches!((a, b), (Some(a), Some(b)) if a < b),
            "Expected '{first}' before '{second}'\nActual: {haystack}"
        );
    }
}
