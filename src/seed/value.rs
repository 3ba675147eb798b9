use std::fmt::Write;

/// SQL flavour a script is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Postgres reached through the `psql` client; meta-commands allowed.
    Psql,
    /// Postgres over a direct client connection.
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn is_postgres(self) -> bool {
        matches!(self, Dialect::Psql | Dialect::Postgres)
    }
}

/// One column value of a reference row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
    IntArray(Vec<i64>),
}

impl Value {
    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => quote(s),
            Value::Json(j) => quote(&j.to_string()),
            Value::IntArray(ids) if dialect.is_postgres() => {
                let mut out = String::from("ARRAY[");
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{id}");
                }
                out.push_str("]::INTEGER[]");
                out
            }
            // sqlite has no array type; keep the ids as a JSON array
            Value::IntArray(ids) => quote(&serde_json::Value::from(ids.clone()).to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        s.map_or(Value::Null, Value::Text)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Single-quoted SQL string literal.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Double-quoted SQL identifier.
pub fn ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_escaped() {
        assert_eq!(Value::from("O'Brien").render(Dialect::Postgres), "'O''Brien'");
        assert_eq!(ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn arrays_follow_dialect() {
        let empty = Value::IntArray(vec![]);
        assert_eq!(empty.render(Dialect::Psql), "ARRAY[]::INTEGER[]");
        assert_eq!(empty.render(Dialect::Sqlite), "'[]'");

        let ids = Value::IntArray(vec![1, 6, 11, 14]);
        assert_eq!(ids.render(Dialect::Postgres), "ARRAY[1, 6, 11, 14]::INTEGER[]");
        assert_eq!(ids.render(Dialect::Sqlite), "'[1,6,11,14]'");
    }

    #[test]
    fn scalars() {
        assert_eq!(Value::Float(350.0).render(Dialect::Sqlite), "350");
        assert_eq!(Value::Float(12.5).render(Dialect::Sqlite), "12.5");
        assert_eq!(Value::Bool(true).render(Dialect::Sqlite), "TRUE");
        assert_eq!(Value::from(None::<String>).render(Dialect::Psql), "NULL");
        let json = serde_json::json!({ "fields": [] });
        assert_eq!(Value::Json(json).render(Dialect::Psql), r#"'{"fields":[]}'"#);
    }
}
