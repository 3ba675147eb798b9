use serde::Deserialize;

use crate::db::DatabaseType;
use crate::error::SeedError;

/// Where the dashboard generator (and a `direct` reference load) connects.
/// Fields left out of the YAML fall back to the local development defaults.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Connection {
    pub r#type: DatabaseType,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u64>,
    pub path: Option<std::path::PathBuf>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            r#type: DatabaseType::Postgres,
            user: Some("lms_user".to_string()),
            host: Some("localhost".to_string()),
            port: Some(5432),
            path: None,
            password: Some("lms_password".to_string()),
            database: Some("lms_slncity".to_string()),
        }
    }
}

impl Connection {
    pub fn sqlite(path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            r#type: DatabaseType::Sqlite,
            user: None,
            host: None,
            port: None,
            path: Some(path.into()),
            password: None,
            database: None,
        }
    }

    /// Fetch a field that the connection's backend cannot do without.
    pub fn require<'a, T>(
        &self,
        value: &'a Option<T>,
        field: &'static str,
    ) -> Result<&'a T, SeedError> {
        value.as_ref().ok_or(SeedError::MissingField {
            kind: self.r#type.as_str(),
            field,
        })
    }
}
