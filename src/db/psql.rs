use std::fs::{self, File};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::config::{ContainerConfig, ReferenceConfig};
use crate::db::ScriptTarget;
use crate::error::SeedError;
use crate::seed::value::Dialect;

/// `psql` running inside the database container, driven through the
/// container runtime's `exec`.
pub struct Psql {
    container: ContainerConfig,
    staging_path: PathBuf,
    startup_delay: Duration,
}

impl Psql {
    pub fn new(container: &ContainerConfig, reference: &ReferenceConfig) -> Self {
        Self {
            container: container.clone(),
            staging_path: reference.staging_path.clone(),
            startup_delay: Duration::from_secs(reference.startup_delay_secs),
        }
    }

    pub fn cli_tool_name(&self) -> &str {
        &self.container.program
    }

    pub fn is_cli_tool_available(&self) -> bool {
        Command::new(&self.container.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Give a freshly started database a moment before the first statement.
    pub fn wait_until_ready(&self) {
        if self.startup_delay.is_zero() {
            return;
        }
        println!("Waiting for PostgreSQL to be ready...");
        info!("psql: waiting {:?} for the database to start", self.startup_delay);
        thread::sleep(self.startup_delay);
    }

    fn args(&self) -> Vec<String> {
        vec![
            "exec".into(),
            "-i".into(),
            self.container.name.clone(),
            "psql".into(),
            "-v".into(),
            "ON_ERROR_STOP=1".into(),
            "-U".into(),
            self.container.superuser.clone(),
            "-d".into(),
            self.container.maintenance_database.clone(),
            "-f".into(),
            "-".into(),
        ]
    }
}

impl ScriptTarget for Psql {
    fn dialect(&self) -> Dialect {
        Dialect::Psql
    }

    fn apply(&mut self, sql: &str) -> Result<()> {
        if let Some(parent) = self.staging_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.staging_path, sql)
            .with_context(|| format!("failed to stage {}", self.staging_path.display()))?;
        debug!("psql: staged script at {}", self.staging_path.display());

        // the staged file lives on the host, so feed it through stdin
        let staged = File::open(&self.staging_path)?;
        let output = Command::new(&self.container.program)
            .args(self.args())
            .stdin(Stdio::from(staged))
            .output()
            .with_context(|| format!("failed to run {}", self.container.program))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            debug!("psql: {line}");
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!("psql: exited with {:?}", output.status.code());
            return Err(SeedError::ScriptFailed {
                program: self.container.program.clone(),
                code: output.status.code(),
                stderr,
            }
            .into());
        }
        Ok(())
    }
}
