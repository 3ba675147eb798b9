use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use rand::Rng;
use rusqlite::params;

use crate::connection::Connection;
use crate::db::{DBBehavior, ScriptTarget};
use crate::model::{ClientType, Id};
use crate::seed::dashboard::{
    self, DashboardPlan, DashboardSummary, FixtureStore, NewPatient, NewVisit, NewVisitTest,
};
use crate::seed::value::Dialect;

/// Local stand-in for the clinic schema, with the constraints the seeders
/// rely on.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE
);

CREATE TABLE IF NOT EXISTS antibiotics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    abbreviation TEXT,
    is_active BOOLEAN NOT NULL DEFAULT TRUE
);

CREATE TABLE IF NOT EXISTS test_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    price REAL NOT NULL,
    b2b_price REAL NOT NULL,
    report_type TEXT NOT NULL DEFAULT 'standard',
    parameters TEXT NOT NULL DEFAULT '{"fields": []}',
    default_antibiotic_ids TEXT NOT NULL DEFAULT '[]',
    is_active BOOLEAN NOT NULL DEFAULT TRUE
);

CREATE TABLE IF NOT EXISTS referral_doctors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('PATIENT', 'REFERRAL_LAB')),
    balance REAL NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS signatories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    title TEXT
);

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    salutation TEXT,
    name TEXT NOT NULL,
    age_years INTEGER NOT NULL DEFAULT 0,
    age_months INTEGER NOT NULL DEFAULT 0,
    age_days INTEGER NOT NULL DEFAULT 0,
    sex TEXT,
    phone TEXT UNIQUE,
    address TEXT,
    email TEXT,
    clinical_history TEXT
);

CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    ref_customer_id INTEGER REFERENCES clients(id),
    total_cost REAL NOT NULL,
    due_amount REAL NOT NULL DEFAULT 0,
    payment_mode TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS visit_tests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visit_id INTEGER NOT NULL REFERENCES visits(id),
    test_template_id INTEGER NOT NULL REFERENCES test_templates(id),
    status TEXT NOT NULL
        CHECK (status IN ('PENDING', 'SAMPLE_COLLECTED', 'IN_PROGRESS', 'APPROVED')),
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

pub struct Sqlite {
    conn: rusqlite::Connection,
}

impl Sqlite {
    pub fn from_connection(conn: rusqlite::Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(rusqlite::Connection::open_in_memory()?)
    }

    /// Create the tables if they are missing.
    pub fn install_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn conn(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl DBBehavior for Sqlite {
    fn database_url(conn: &Connection) -> Result<String> {
        let path = resolve_path(conn)?;
        Ok(format!("sqlite://{}", path.display()))
    }

    fn open(conn: &Connection) -> Result<Self> {
        debug!("sqlite: opening file");
        let path = resolve_path(conn)?;
        let sc = rusqlite::Connection::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        debug!("sqlite: opened");
        Self::from_connection(sc)
    }

    fn seed_dashboard<R: Rng>(&mut self, plan: &DashboardPlan, rng: &mut R) -> Result<DashboardSummary> {
        let mut tx = self.conn.transaction()?;
        let summary = dashboard::seed(&mut tx, plan, rng)?;
        tx.commit()?;
        debug!("sqlite: dashboard transaction committed");
        Ok(summary)
    }
}

impl ScriptTarget for Sqlite {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn apply(&mut self, sql: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(sql).context("reference script failed")?;
        tx.commit()?;
        Ok(())
    }
}

impl FixtureStore for rusqlite::Transaction<'_> {
    fn upsert_patient(&mut self, p: &NewPatient) -> Result<Id> {
        let id = self.query_row(
            "INSERT INTO patients (salutation, name, age_years, age_months, age_days, sex, phone, address, email)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (phone) DO UPDATE SET name = excluded.name
             RETURNING id",
            params![
                p.salutation.as_str(),
                p.name,
                p.age_years,
                p.age_months,
                p.age_days,
                p.sex.as_str(),
                p.phone,
                p.address,
                p.email,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn client_ids(&mut self, kind: ClientType, limit: usize) -> Result<Vec<Id>> {
        let mut stmt = self.prepare("SELECT id FROM clients WHERE type = ?1 ORDER BY id LIMIT ?2")?;
        let ids = stmt
            .query_map(params![kind.as_str(), limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<Id>>>()?;
        Ok(ids)
    }

    fn template_ids(&mut self, limit: usize) -> Result<Vec<Id>> {
        let mut stmt = self.prepare("SELECT id FROM test_templates ORDER BY id LIMIT ?1")?;
        let ids = stmt
            .query_map(params![limit as i64], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<Id>>>()?;
        Ok(ids)
    }

    fn insert_visit(&mut self, v: &NewVisit) -> Result<Id> {
        let id = self.query_row(
            "INSERT INTO visits (patient_id, ref_customer_id, total_cost, due_amount, payment_mode, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, datetime('now', printf('-%d days', ?6)))
             RETURNING id",
            params![
                v.patient_id,
                v.client_id,
                v.total_cost,
                v.due_amount,
                v.payment_mode.as_str(),
                v.days_ago,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn insert_visit_test(&mut self, t: &NewVisitTest) -> Result<()> {
        self.execute(
            "INSERT INTO visit_tests (visit_id, test_template_id, status, created_at)
             VALUES (?1, ?2, ?3, datetime('now', printf('-%d days', ?4)))",
            params![t.visit_id, t.template_id, t.status.as_str(), t.days_ago],
        )?;
        Ok(())
    }
}

fn resolve_path(conn: &Connection) -> Result<PathBuf> {
    let path = conn.require(&conn.path, "path")?;
    expand_path(path).ok_or_else(|| anyhow::anyhow!("cannot expand file path {}", path.display()))
}

fn expand_path(path: &Path) -> Option<PathBuf> {
    let mut expanded_path = PathBuf::new();
    let mut path_iter = path.iter();
    if path.starts_with("~") {
        path_iter.next()?;
        expanded_path = expanded_path.join(dirs_next::home_dir()?);
    }
    for path in path_iter {
        let path = path.to_str()?;
        expanded_path = if cfg!(unix) && path.starts_with('$') {
            expanded_path.join(std::env::var(path.strip_prefix('$')?).unwrap_or_default())
        } else if cfg!(windows) && path.starts_with('%') && path.ends_with('%') {
            expanded_path
                .join(std::env::var(path.strip_prefix('%')?.strip_suffix('%')?).unwrap_or_default())
        } else {
            expanded_path.join(path)
        }
    }
    Some(expanded_path)
}
