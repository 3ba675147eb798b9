//! Reference data loader: users, antibiotics, test templates, referral
//! doctors, clients, signatories and a couple of illustrative patients.

use std::fmt::Write;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::batch::{Conflict, Record, UpsertBatch};
use super::value::{ident, quote, Dialect, Value};
use crate::db::ScriptTarget;
use crate::model::{ClientType, ReportType, Role, Salutation, Sex};

const DEFAULT_CATALOG: &str = include_str!("../../assets/reference.yaml");

fn active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default = "active")]
    pub is_active: bool,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["username", "password_hash", "role", "is_active"];
    const CONFLICT: Conflict = Conflict::Key(&["username"]);

    fn values(&self) -> Vec<Value> {
        vec![
            self.username.as_str().into(),
            self.password_hash.as_str().into(),
            self.role.as_str().into(),
            self.is_active.into(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Antibiotic {
    pub name: String,
    pub abbreviation: String,
    #[serde(default = "active")]
    pub is_active: bool,
}

impl Record for Antibiotic {
    const TABLE: &'static str = "antibiotics";
    const COLUMNS: &'static [&'static str] = &["name", "abbreviation", "is_active"];
    const CONFLICT: Conflict = Conflict::Absent(&["name"]);

    fn values(&self) -> Vec<Value> {
        vec![
            self.name.as_str().into(),
            self.abbreviation.as_str().into(),
            self.is_active.into(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Number,
    Text,
}

/// One result field a technician fills in for a test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_range: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameters {
    #[serde(default)]
    pub fields: Vec<TemplateField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestTemplate {
    pub code: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub b2b_price: f64,
    pub report_type: ReportType,
    #[serde(default)]
    pub parameters: TemplateParameters,
    /// Antibiotic ids preselected on culture reports.
    #[serde(default)]
    pub default_antibiotic_ids: Vec<i64>,
    #[serde(default = "active")]
    pub is_active: bool,
}

impl Record for TestTemplate {
    const TABLE: &'static str = "test_templates";
    const COLUMNS: &'static [&'static str] = &[
        "code",
        "name",
        "category",
        "price",
        "b2b_price",
        "report_type",
        "parameters",
        "default_antibiotic_ids",
        "is_active",
    ];
    const CONFLICT: Conflict = Conflict::Key(&["code"]);

    fn values(&self) -> Vec<Value> {
        // TemplateParameters is plain data; serialising it cannot fail
        let parameters = serde_json::to_value(&self.parameters).unwrap_or_default();
        vec![
            self.code.as_str().into(),
            self.name.as_str().into(),
            self.category.as_str().into(),
            self.price.into(),
            self.b2b_price.into(),
            self.report_type.as_str().into(),
            Value::Json(parameters),
            Value::IntArray(self.default_antibiotic_ids.clone()),
            self.is_active.into(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralDoctor {
    pub name: String,
}

impl Record for ReferralDoctor {
    const TABLE: &'static str = "referral_doctors";
    const COLUMNS: &'static [&'static str] = &["name"];
    const CONFLICT: Conflict = Conflict::Absent(&["name"]);

    fn values(&self) -> Vec<Value> {
        vec![self.name.as_str().into()]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ClientType,
    #[serde(default)]
    pub balance: f64,
}

impl Record for Client {
    const TABLE: &'static str = "clients";
    const COLUMNS: &'static [&'static str] = &["name", "type", "balance"];
    const CONFLICT: Conflict = Conflict::Absent(&["name"]);

    fn values(&self) -> Vec<Value> {
        vec![
            self.name.as_str().into(),
            self.kind.as_str().into(),
            self.balance.into(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signatory {
    pub name: String,
    pub title: String,
}

impl Record for Signatory {
    const TABLE: &'static str = "signatories";
    const COLUMNS: &'static [&'static str] = &["name", "title"];
    const CONFLICT: Conflict = Conflict::Absent(&["name"]);

    fn values(&self) -> Vec<Value> {
        vec![self.name.as_str().into(), self.title.as_str().into()]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub salutation: Salutation,
    pub name: String,
    pub age_years: i64,
    #[serde(default)]
    pub age_months: i64,
    #[serde(default)]
    pub age_days: i64,
    pub sex: Sex,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub clinical_history: Option<String>,
}

impl Record for Patient {
    const TABLE: &'static str = "patients";
    const COLUMNS: &'static [&'static str] = &[
        "salutation",
        "name",
        "age_years",
        "age_months",
        "age_days",
        "sex",
        "phone",
        "address",
        "email",
        "clinical_history",
    ];
    const CONFLICT: Conflict = Conflict::Key(&["phone"]);

    fn values(&self) -> Vec<Value> {
        vec![
            self.salutation.as_str().into(),
            self.name.as_str().into(),
            self.age_years.into(),
            self.age_months.into(),
            self.age_days.into(),
            self.sex.as_str().into(),
            self.phone.as_str().into(),
            self.address.as_str().into(),
            self.email.clone().into(),
            self.clinical_history.clone().into(),
        ]
    }
}

/// Every reference table's rows, as read from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceCatalog {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub antibiotics: Vec<Antibiotic>,
    #[serde(default)]
    pub test_templates: Vec<TestTemplate>,
    #[serde(default)]
    pub referral_doctors: Vec<ReferralDoctor>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub signatories: Vec<Signatory>,
    #[serde(default)]
    pub patients: Vec<Patient>,
}

impl ReferenceCatalog {
    /// The catalog bundled with the binary.
    pub fn embedded() -> Result<Self> {
        serde_yaml::from_str(DEFAULT_CATALOG).context("failed to parse embedded reference catalog")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        serde_yaml::from_slice(&data)
            .with_context(|| format!("failed to parse YAML at {}", path.display()))
    }

    /// Load `path` when given, the embedded catalog otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::embedded(),
        }
    }

    /// Batches in foreign-key order.
    pub fn batches(&self) -> Vec<UpsertBatch> {
        vec![
            UpsertBatch::of(&self.users),
            UpsertBatch::of(&self.antibiotics),
            UpsertBatch::of(&self.test_templates),
            UpsertBatch::of(&self.referral_doctors),
            UpsertBatch::of(&self.clients),
            UpsertBatch::of(&self.signatories),
            UpsertBatch::of(&self.patients),
        ]
    }
}

/// Application role and database created before any rows go in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    pub role: String,
    pub password: String,
    pub database: String,
}

impl Bootstrap {
    fn render(&self) -> String {
        let role = ident(&self.role);
        let database = ident(&self.database);
        let mut out = String::new();
        let _ = writeln!(out, "-- role and database");
        let _ = writeln!(out, "DO $$");
        let _ = writeln!(out, "BEGIN");
        let _ = writeln!(
            out,
            "  IF NOT EXISTS (SELECT FROM pg_roles WHERE rolname = {}) THEN",
            quote(&self.role)
        );
        let _ = writeln!(
            out,
            "    CREATE ROLE {} LOGIN ENCRYPTED PASSWORD {};",
            role,
            quote(&self.password)
        );
        let _ = writeln!(out, "  END IF;");
        let _ = writeln!(out, "END");
        let _ = writeln!(out, "$$;");
        let _ = writeln!(out, "ALTER ROLE {} CREATEDB;", role);
        let _ = writeln!(
            out,
            "SELECT {} WHERE NOT EXISTS (SELECT FROM pg_database WHERE datname = {})\\gexec",
            quote(&format!("CREATE DATABASE {} OWNER {}", database, role)),
            quote(&self.database)
        );
        let _ = writeln!(out, "GRANT ALL PRIVILEGES ON DATABASE {} TO {};", database, role);
        let _ = writeln!(out);
        let _ = writeln!(out, "\\c {} {}", database, role);
        out
    }
}

/// The whole reference load, ready to render for a target.
#[derive(Debug, Clone)]
pub struct SeedScript {
    pub bootstrap: Option<Bootstrap>,
    pub batches: Vec<UpsertBatch>,
}

impl SeedScript {
    pub fn new(catalog: &ReferenceCatalog, bootstrap: Option<Bootstrap>) -> Self {
        Self {
            bootstrap,
            batches: catalog.batches(),
        }
    }

    pub fn render(&self, dialect: Dialect) -> String {
        let mut out = String::new();
        match (&self.bootstrap, dialect) {
            (Some(b), Dialect::Psql) => {
                out.push_str(&b.render());
                out.push('\n');
            }
            (Some(_), _) => debug!("bootstrap needs psql meta-commands; skipped for {:?}", dialect),
            (None, _) => {}
        }
        for batch in self.batches.iter().filter(|b| !b.is_empty()) {
            out.push_str(&batch.render(dialect));
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub tables: usize,
    pub rows: usize,
}

/// Render `script` for the target's dialect and apply it.
pub fn load_reference_data(target: &mut dyn ScriptTarget, script: &SeedScript) -> Result<LoadReport> {
    let dialect = target.dialect();
    let sql = script.render(dialect);
    let mut report = LoadReport::default();
    for batch in script.batches.iter().filter(|b| !b.is_empty()) {
        debug!("{}: {} rows", batch.table, batch.len());
        report.tables += 1;
        report.rows += batch.len();
    }
    info!(
        "applying reference script ({} tables, {} rows) via {:?}",
        report.tables, report.rows, dialect
    );
    target.apply(&sql)?;
    info!("reference script applied");
    Ok(report)
}
