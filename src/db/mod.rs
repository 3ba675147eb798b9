mod postgres;
mod psql;
mod sqlite;

use anyhow::Result;
use rand::Rng;
use serde::Deserialize;

use crate::connection::Connection;
use crate::seed::dashboard::{DashboardPlan, DashboardSummary};
use crate::seed::value::Dialect;

pub use self::postgres::Postgres;
pub use psql::Psql;
pub use sqlite::{Sqlite, SCHEMA};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    #[serde(rename = "postgres")]
    Postgres,
    #[serde(rename = "sqlite")]
    Sqlite,
}

impl DatabaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            DatabaseType::Postgres => "postgres",
            DatabaseType::Sqlite => "sqlite",
        }
    }
}

/// Anything a rendered seed script can be applied to.
pub trait ScriptTarget {
    fn dialect(&self) -> Dialect;
    fn apply(&mut self, sql: &str) -> Result<()>;
}

pub trait DBBehavior {
    fn database_url(conn: &Connection) -> Result<String>;
    fn open(conn: &Connection) -> Result<Self>
    where
        Self: Sized;
    /// Run the dashboard generator in one transaction, committing on success.
    fn seed_dashboard<R: Rng>(&mut self, plan: &DashboardPlan, rng: &mut R) -> Result<DashboardSummary>;
}

pub struct DB;

impl DB {
    pub fn database_url(conn: &Connection) -> Result<String> {
        match conn.r#type {
            DatabaseType::Postgres => Postgres::database_url(conn),
            DatabaseType::Sqlite => Sqlite::database_url(conn),
        }
    }

    pub fn seed_dashboard<R: Rng>(
        conn: &Connection,
        plan: &DashboardPlan,
        rng: &mut R,
    ) -> Result<DashboardSummary> {
        match conn.r#type {
            DatabaseType::Postgres => Postgres::open(conn)?.seed_dashboard(plan, rng),
            DatabaseType::Sqlite => Sqlite::open(conn)?.seed_dashboard(plan, rng),
        }
    }

    /// A script target over a direct connection.
    pub fn target(conn: &Connection) -> Result<Box<dyn ScriptTarget>> {
        Ok(match conn.r#type {
            DatabaseType::Postgres => Box::new(Postgres::open(conn)?),
            DatabaseType::Sqlite => Box::new(Sqlite::open(conn)?),
        })
    }
}
