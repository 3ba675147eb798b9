use thiserror::Error;

/// Failures a seeding run can end with, beyond plain I/O and driver errors.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("lookup on {table} ({filter}) returned no rows; load reference data first")]
    EmptyLookup {
        table: &'static str,
        filter: String,
    },

    #[error("{program} exited with {}: {stderr}", exit_label(.code))]
    ScriptFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("type {kind} needs the {field} field")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}
