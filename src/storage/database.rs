//! SQLite metadata store
//!
//! Holds the authoritative manual records and the user accounts. The blob
//! and vector stores are dependent artifacts; a manual exists if and only
//! if its row exists here.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::manual::ManualRecord;

/// A user account row
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed metadata database
pub struct MetadataDb {
    conn: Arc<Mutex<Connection>>,
}

impl MetadataDb {
    /// Create or open the database at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| Error::metadata_db(format!("Failed to open database: {e}")))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::metadata_db(format!("Failed to open in-memory database: {e}")))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        "#,
        )
        .map_err(|e| Error::metadata_db(format!("Failed to set pragmas: {e}")))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS manuals (
                id TEXT PRIMARY KEY,
                company_name TEXT NOT NULL,
                product_name TEXT NOT NULL,
                product_code TEXT,
                filename TEXT NOT NULL,
                storage_uri TEXT NOT NULL,
                storage_public_id TEXT NOT NULL,
                qr_uri TEXT,
                qr_public_id TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_manuals_company ON manuals(company_name);
            CREATE INDEX IF NOT EXISTS idx_manuals_product ON manuals(product_name);

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
        "#,
        )
        .map_err(|e| Error::metadata_db(format!("Migration failed: {e}")))?;

        Ok(())
    }

    // ---- manuals ----

    /// Insert a manual record.
    pub fn insert_manual(&self, record: &ManualRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            r#"INSERT INTO manuals
               (id, company_name, product_name, product_code, filename,
                storage_uri, storage_public_id, qr_uri, qr_public_id, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            params![
                record.id.to_string(),
                record.company_name,
                record.product_name,
                record.product_code,
                record.filename,
                record.storage_uri,
                record.storage_public_id,
                record.qr_uri,
                record.qr_public_id,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    /// Find the manual identified by product name and filename.
    pub fn find_manual(&self, product_name: &str, filename: &str) -> Result<Option<ManualRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT * FROM manuals WHERE product_name = ?1 AND filename = ?2",
            params![product_name, filename],
            manual_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Delete a manual row. Returns whether a row was removed.
    pub fn delete_manual(&self, id: &Uuid) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM manuals WHERE id = ?1", params![id.to_string()])?;
        Ok(changed > 0)
    }

    /// Distinct company names with at least one manual.
    pub fn distinct_companies(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT DISTINCT company_name FROM manuals ORDER BY company_name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// All manuals for a company.
    pub fn manuals_for_company(&self, company: &str) -> Result<Vec<ManualRecord>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT * FROM manuals WHERE company_name = ?1 ORDER BY created_at")?;
        let rows = stmt.query_map(params![company], manual_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Company of the most recently uploaded manual.
    pub fn latest_company(&self) -> Result<Option<String>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT company_name FROM manuals ORDER BY created_at DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(Into::into)
    }

    /// Backfill the QR fields of an existing record. The only in-place
    /// update manuals ever receive.
    pub fn backfill_qr(&self, id: &Uuid, qr_uri: &str, qr_public_id: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE manuals SET qr_uri = ?2, qr_public_id = ?3 WHERE id = ?1",
            params![id.to_string(), qr_uri, qr_public_id],
        )?;
        Ok(())
    }

    // ---- users ----

    /// Insert a user account.
    pub fn insert_user(&self, user: &UserRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (id, email, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.role,
                user.created_at,
            ],
        )?;
        Ok(())
    }

    /// Find a user by email.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT * FROM users WHERE email = ?1",
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Find a user by id.
    pub fn find_user_by_id(&self, id: &Uuid) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT * FROM users WHERE id = ?1",
            params![id.to_string()],
            user_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Whether the database file is usable.
    pub fn health_check(&self) -> Result<bool> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|v| v == 1)
            .map_err(Into::into)
    }
}

fn parse_uuid(text: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn manual_from_row(row: &Row<'_>) -> rusqlite::Result<ManualRecord> {
    Ok(ManualRecord {
        id: parse_uuid(row.get::<_, String>("id")?)?,
        company_name: row.get("company_name")?,
        product_name: row.get("product_name")?,
        product_code: row.get("product_code")?,
        filename: row.get("filename")?,
        storage_uri: row.get("storage_uri")?,
        storage_public_id: row.get("storage_public_id")?,
        qr_uri: row.get("qr_uri")?,
        qr_public_id: row.get("qr_public_id")?,
        created_at: row.get("created_at")?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: parse_uuid(row.get::<_, String>("id")?)?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role: row.get("role")?,
        created_at: row.get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ManualRecord {
        ManualRecord::new(
            "Acme",
            "Widget",
            Some("WX-100".to_string()),
            "widget.pdf",
            "https://blobs/pdf_manuals/widget.pdf",
            "pdf_manuals/Acme_Widget_widget.pdf",
        )
    }

    #[test]
    fn manual_round_trip() {
        let db = MetadataDb::in_memory().unwrap();
        let record = sample_record();
        db.insert_manual(&record).unwrap();

        let found = db.find_manual("Widget", "widget.pdf").unwrap().unwrap();
        assert_eq!(found.id, record.id);
        assert_eq!(found.company_name, "Acme");
        assert_eq!(found.product_code.as_deref(), Some("WX-100"));

        assert!(db.delete_manual(&record.id).unwrap());
        assert!(db.find_manual("Widget", "widget.pdf").unwrap().is_none());
        assert!(!db.delete_manual(&record.id).unwrap());
    }

    #[test]
    fn company_listing_and_latest() {
        let db = MetadataDb::in_memory().unwrap();
        assert!(db.latest_company().unwrap().is_none());

        db.insert_manual(&sample_record()).unwrap();
        let mut other = sample_record();
        other.id = Uuid::new_v4();
        other.company_name = "Globex".to_string();
        other.created_at = other.created_at + chrono::Duration::seconds(5);
        db.insert_manual(&other).unwrap();

        assert_eq!(db.distinct_companies().unwrap(), vec!["Acme", "Globex"]);
        assert_eq!(db.latest_company().unwrap().as_deref(), Some("Globex"));
        assert_eq!(db.manuals_for_company("Acme").unwrap().len(), 1);
    }

    #[test]
    fn qr_backfill_is_the_only_update() {
        let db = MetadataDb::in_memory().unwrap();
        let record = sample_record();
        db.insert_manual(&record).unwrap();

        db.backfill_qr(&record.id, "https://blobs/qr_codes/widget.png", "qr_codes/widget")
            .unwrap();
        let found = db.find_manual("Widget", "widget.pdf").unwrap().unwrap();
        assert_eq!(found.qr_uri.as_deref(), Some("https://blobs/qr_codes/widget.png"));
    }

    #[test]
    fn user_round_trip_and_unique_email() {
        let db = MetadataDb::in_memory().unwrap();
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: "admin".to_string(),
            created_at: Utc::now(),
        };
        db.insert_user(&user).unwrap();

        let found = db.find_user_by_email("admin@example.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(db.find_user_by_id(&user.id).unwrap().is_some());

        let duplicate = UserRecord {
            id: Uuid::new_v4(),
            ..user
        };
        assert!(db.insert_user(&duplicate).is_err());
    }
}
