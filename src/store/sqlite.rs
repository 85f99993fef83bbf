use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Map, Value};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_attributes(s: &str) -> Map<String, Value> {
    serde_json::from_str(s).unwrap_or_else(|e| {
        tracing::error!("Invalid attributes JSON in database: {}", e);
        Map::new()
    })
}

fn format_attributes(attributes: &Map<String, Value>) -> String {
    serde_json::to_string(attributes).unwrap_or_else(|e| {
        tracing::error!("Unserializable attributes: {}", e);
        "{}".to_string()
    })
}

fn parse_status(s: Option<String>) -> Option<PurchaseStatus> {
    match s.as_deref() {
        None => None,
        Some("Shipped") => Some(PurchaseStatus::Shipped),
        Some(other) => {
            tracing::error!("Invalid purchase status in database: '{}'", other);
            None
        }
    }
}

fn constraint_violation(err: rusqlite::Error, mapped: Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            mapped
        }
        other => Error::Database(other),
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Watch operations

    fn create_watch(&self, watch: &Watch) -> Result<()> {
        self.conn().execute(
            "INSERT INTO watches (id, attributes) VALUES (?1, ?2)",
            params![watch.id, format_attributes(&watch.attributes)],
        )?;
        Ok(())
    }

    fn get_watch(&self, id: &str) -> Result<Option<Watch>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, attributes FROM watches WHERE id = ?1",
            params![id],
            |row| {
                Ok(Watch {
                    id: row.get(0)?,
                    attributes: parse_attributes(&row.get::<_, String>(1)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_watches(&self) -> Result<Vec<Watch>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, attributes FROM watches ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Watch {
                id: row.get(0)?,
                attributes: parse_attributes(&row.get::<_, String>(1)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_watch(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM watches WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Purchase operations

    fn create_purchase(&self, purchase: &Purchase) -> Result<()> {
        self.conn().execute(
            "INSERT INTO purchases (id, email, status, attributes) VALUES (?1, ?2, ?3, ?4)",
            params![
                purchase.id,
                purchase.email,
                purchase.status.map(PurchaseStatus::as_str),
                format_attributes(&purchase.attributes),
            ],
        )?;
        Ok(())
    }

    fn get_purchase(&self, id: &str) -> Result<Option<Purchase>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, status, attributes FROM purchases WHERE id = ?1",
            params![id],
            |row| {
                Ok(Purchase {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    status: parse_status(row.get(2)?),
                    attributes: parse_attributes(&row.get::<_, String>(3)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_purchases(&self) -> Result<Vec<Purchase>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, email, status, attributes FROM purchases ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Purchase {
                id: row.get(0)?,
                email: row.get(1)?,
                status: parse_status(row.get(2)?),
                attributes: parse_attributes(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_purchases_by_email(&self, email: &str) -> Result<Vec<Purchase>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, email, status, attributes FROM purchases WHERE email = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![email], |row| {
            Ok(Purchase {
                id: row.get(0)?,
                email: row.get(1)?,
                status: parse_status(row.get(2)?),
                attributes: parse_attributes(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn mark_purchase_shipped(&self, id: &str) -> Result<usize> {
        let rows = self.conn().execute(
            "UPDATE purchases SET status = ?2 WHERE id = ?1",
            params![id, PurchaseStatus::Shipped.as_str()],
        )?;
        Ok(rows)
    }

    fn delete_purchase(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM purchases WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Review operations

    fn create_review(&self, review: &Review) -> Result<()> {
        self.conn().execute(
            "INSERT INTO reviews (id, attributes) VALUES (?1, ?2)",
            params![review.id, format_attributes(&review.attributes)],
        )?;
        Ok(())
    }

    fn list_reviews(&self) -> Result<Vec<Review>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, attributes FROM reviews ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Review {
                id: row.get(0)?,
                attributes: parse_attributes(&row.get::<_, String>(1)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO users (email, role, attributes) VALUES (?1, ?2, ?3)",
            params![user.email, user.role, format_attributes(&user.attributes)],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(constraint_violation(e, Error::AlreadyExists)),
        }
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT email, role, attributes FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(User {
                    email: row.get(0)?,
                    role: row.get(1)?,
                    attributes: parse_attributes(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn upsert_user(&self, user: &User) -> Result<bool> {
        // The pre-read only decides how to report the outcome; the write
        // itself is a single statement and leaves any existing role alone.
        let existing = self.get_user_by_email(&user.email)?;

        self.conn().execute(
            "INSERT INTO users (email, role, attributes) VALUES (?1, NULL, ?2)
             ON CONFLICT(email) DO UPDATE SET attributes = excluded.attributes",
            params![user.email, format_attributes(&user.attributes)],
        )?;

        Ok(existing.is_none())
    }

    fn grant_admin(&self, requester_email: &str, target_email: &str) -> Result<usize> {
        // Privilege check and escalation in one statement, so a concurrent
        // role change cannot slip between them.
        let rows = self.conn().execute(
            "UPDATE users SET role = ?3
             WHERE email = ?1
               AND EXISTS (SELECT 1 FROM users WHERE email = ?2 AND role = ?3)",
            params![target_email, requester_email, ADMIN_ROLE],
        )?;
        Ok(rows)
    }

    fn has_admin_user(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![ADMIN_ROLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Identity token operations

    fn create_identity_token(&self, token: &IdentityToken) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO identity_tokens (id, email, token_hash, token_lookup, created_at, expires_at, last_used_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.email,
                token.token_hash,
                token.token_lookup,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
                token.last_used_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(constraint_violation(e, Error::TokenLookupCollision)),
        }
    }

    fn get_identity_token_by_lookup(&self, lookup: &str) -> Result<Option<IdentityToken>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, email, token_hash, token_lookup, created_at, expires_at, last_used_at
             FROM identity_tokens WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(IdentityToken {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    token_hash: row.get(2)?,
                    token_lookup: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    expires_at: row.get::<_, Option<String>>(5)?.map(|s| parse_datetime(&s)),
                    last_used_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_identity_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM identity_tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_identity_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE identity_tokens SET last_used_at = ?2 WHERE id = ?1",
            params![id, format_datetime(&Utc::now())],
        )?;
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
