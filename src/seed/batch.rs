use std::fmt::Write;

use super::value::{Dialect, Value};

/// How a batch avoids duplicating rows that an earlier run already inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    /// A unique constraint covers these columns: `ON CONFLICT (..) DO NOTHING`.
    Key(&'static [&'static str]),
    /// No constraint to lean on; each row is inserted only when no existing
    /// row matches these columns.
    Absent(&'static [&'static str]),
}

impl Conflict {
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Conflict::Key(cols) | Conflict::Absent(cols) => cols,
        }
    }
}

/// A typed reference row that knows where it lives.
pub trait Record {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const CONFLICT: Conflict;

    fn values(&self) -> Vec<Value>;
}

/// Rows for one table plus the rule that keeps re-runs idempotent.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertBatch {
    pub table: &'static str,
    pub columns: &'static [&'static str],
    pub conflict: Conflict,
    pub rows: Vec<Vec<Value>>,
}

impl UpsertBatch {
    pub fn of<R: Record>(records: &[R]) -> Self {
        Self {
            table: R::TABLE,
            columns: R::COLUMNS,
            conflict: R::CONFLICT,
            rows: records.iter().map(Record::values).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self, dialect: Dialect) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        let cols = self.columns.join(", ");
        let mut out = String::new();
        let _ = writeln!(out, "-- {}", self.table);

        match self.conflict {
            Conflict::Key(key) => {
                let _ = writeln!(out, "INSERT INTO {} ({}) VALUES", self.table, cols);
                let rows: Vec<String> = self
                    .rows
                    .iter()
                    .map(|row| format!("({})", render_row(row, dialect)))
                    .collect();
                let _ = writeln!(out, "{}", rows.join(",\n"));
                let _ = writeln!(out, "ON CONFLICT ({}) DO NOTHING;", key.join(", "));
            }
            Conflict::Absent(key) => {
                let key_idx: Vec<usize> = key
                    .iter()
                    .filter_map(|k| self.columns.iter().position(|c| c == k))
                    .collect();
                for row in &self.rows {
                    let guard = key_idx
                        .iter()
                        .map(|&i| format!("{} = {}", self.columns[i], row[i].render(dialect)))
                        .collect::<Vec<_>>()
                        .join(" AND ");
                    let _ = writeln!(
                        out,
                        "INSERT INTO {table} ({cols}) SELECT {vals} WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE {guard}) ON CONFLICT DO NOTHING;",
                        table = self.table,
                        cols = cols,
                        vals = render_row(row, dialect),
                        guard = guard,
                    );
                }
            }
        }
        out
    }
}

fn render_row(row: &[Value], dialect: Dialect) -> String {
    row.iter()
        .map(|v| v.render(dialect))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doctor(&'static str);

    impl Record for Doctor {
        const TABLE: &'static str = "referral_doctors";
        const COLUMNS: &'static [&'static str] = &["name"];
        const CONFLICT: Conflict = Conflict::Absent(&["name"]);

        fn values(&self) -> Vec<Value> {
            vec![self.0.into()]
        }
    }

    struct Login(&'static str, bool);

    impl Record for Login {
        const TABLE: &'static str = "users";
        const COLUMNS: &'static [&'static str] = &["username", "is_active"];
        const CONFLICT: Conflict = Conflict::Key(&["username"]);

        fn values(&self) -> Vec<Value> {
            vec![self.0.into(), self.1.into()]
        }
    }

    #[test]
    fn keyed_batch_is_one_statement() {
        let sql = UpsertBatch::of(&[Login("sudo", true), Login("admin", false)]).render(Dialect::Psql);
        assert_eq!(
            sql,
            "-- users\n\
             INSERT INTO users (username, is_active) VALUES\n\
             ('sudo', TRUE),\n\
             ('admin', FALSE)\n\
             ON CONFLICT (username) DO NOTHING;\n"
        );
    }

    #[test]
    fn absent_batch_guards_each_row() {
        let sql = UpsertBatch::of(&[Doctor("Dr. John Doe"), Doctor("Dr. O'Neil")]).render(Dialect::Sqlite);
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[2],
            "INSERT INTO referral_doctors (name) SELECT 'Dr. O''Neil' WHERE NOT EXISTS \
             (SELECT 1 FROM referral_doctors WHERE name = 'Dr. O''Neil') ON CONFLICT DO NOTHING;"
        );
    }

    #[test]
    fn empty_batch_renders_nothing() {
        let batch = UpsertBatch::of::<Doctor>(&[]);
        assert!(batch.is_empty());
        assert_eq!(batch.render(Dialect::Postgres), "");
    }
}
