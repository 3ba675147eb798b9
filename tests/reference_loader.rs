use lms_seed::db::{ScriptTarget, Sqlite};
use lms_seed::seed::{load_reference_data, Bootstrap, Dialect, ReferenceCatalog, SeedScript};

fn fresh_db() -> Sqlite {
    let db = Sqlite::open_in_memory().unwrap();
    db.install_schema().unwrap();
    db
}

fn count(db: &Sqlite, sql: &str) -> i64 {
    db.conn().query_row(sql, [], |r| r.get(0)).unwrap()
}

fn script() -> SeedScript {
    SeedScript::new(
        &ReferenceCatalog::embedded().unwrap(),
        Some(Bootstrap {
            role: "lms_user".into(),
            password: "lms_password".into(),
            database: "lms_slncity".into(),
        }),
    )
}

#[test]
fn loads_every_reference_table() {
    let mut db = fresh_db();
    let report = load_reference_data(&mut db, &script()).unwrap();
    assert_eq!(report.tables, 7);
    assert_eq!(report.rows, 6 + 18 + 10 + 4 + 4 + 4 + 2);

    assert_eq!(count(&db, "SELECT COUNT(*) FROM users"), 6);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM antibiotics"), 18);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM test_templates"), 10);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM referral_doctors"), 4);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM clients"), 4);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM signatories"), 4);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM patients"), 2);
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM clients WHERE type = 'REFERRAL_LAB'"),
        3
    );
}

#[test]
fn second_run_adds_nothing() {
    let mut db = fresh_db();
    let script = script();
    load_reference_data(&mut db, &script).unwrap();
    load_reference_data(&mut db, &script).unwrap();

    assert_eq!(count(&db, "SELECT COUNT(*) FROM test_templates WHERE code = 'CBC'"), 1);
    for (table, key) in [
        ("users", "username"),
        ("antibiotics", "name"),
        ("test_templates", "code"),
        ("referral_doctors", "name"),
        ("clients", "name"),
        ("signatories", "name"),
        ("patients", "phone"),
    ] {
        let dupes = count(
            &db,
            &format!("SELECT COUNT(*) FROM (SELECT {key} FROM {table} GROUP BY {key} HAVING COUNT(*) > 1)"),
        );
        assert_eq!(dupes, 0, "{table} has duplicate {key}");
    }
    assert_eq!(count(&db, "SELECT COUNT(*) FROM antibiotics"), 18);
}

#[test]
fn stored_template_payloads() {
    let mut db = fresh_db();
    load_reference_data(&mut db, &script()).unwrap();

    let (parameters, antibiotics, report_type): (String, String, String) = db
        .conn()
        .query_row(
            "SELECT parameters, default_antibiotic_ids, report_type FROM test_templates WHERE code = 'CULTURE-U'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(parameters, r#"{"fields":[]}"#);
    assert_eq!(antibiotics, "[1,6,11,14]");
    assert_eq!(report_type, "culture");

    let thyroid: String = db
        .conn()
        .query_row(
            "SELECT parameters FROM test_templates WHERE code = 'THYROID'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&thyroid).unwrap();
    assert_eq!(json["fields"].as_array().unwrap().len(), 3);
    assert_eq!(json["fields"][2]["name"], "TSH");

    let price: f64 = db
        .conn()
        .query_row("SELECT b2b_price FROM test_templates WHERE code = 'VITD'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(price, 1100.0);
}

#[test]
fn existing_rows_are_left_alone() {
    let mut db = fresh_db();
    db.conn()
        .execute(
            "INSERT INTO users (username, password_hash, role, is_active) VALUES ('admin', 'real-hash', 'ADMIN', FALSE)",
            [],
        )
        .unwrap();
    load_reference_data(&mut db, &script()).unwrap();

    let (hash, active): (String, bool) = db
        .conn()
        .query_row(
            "SELECT password_hash, is_active FROM users WHERE username = 'admin'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(hash, "real-hash");
    assert!(!active);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM users"), 6);
}

#[test]
fn failing_script_rolls_back() {
    let mut db = Sqlite::open_in_memory().unwrap();
    // only some of the tables exist, so the load stops partway
    db.conn()
        .execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT UNIQUE, password_hash TEXT, role TEXT, is_active BOOLEAN);",
        )
        .unwrap();
    assert_eq!(db.dialect(), Dialect::Sqlite);
    assert!(load_reference_data(&mut db, &script()).is_err());
    assert_eq!(count(&db, "SELECT COUNT(*) FROM users"), 0);
}
