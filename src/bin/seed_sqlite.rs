use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

use lms_seed::connection::Connection;
use lms_seed::db::{DBBehavior, Sqlite, DB};
use lms_seed::seed::{load_reference_data, DashboardPlan, ReferenceCatalog, SeedScript};

fn main() -> Result<()> {
    let path = std::path::Path::new("dev/sqlite");
    std::fs::create_dir_all(path)?;
    let conn = Connection::sqlite(path.join("lms.db"));

    let mut db = Sqlite::open(&conn)?;
    db.install_schema()?;

    let script = SeedScript::new(&ReferenceCatalog::embedded()?, None);
    let report = load_reference_data(&mut db, &script)?;
    println!("Loaded {} reference rows into {} tables", report.rows, report.tables);

    let mut rng = StdRng::seed_from_u64(7);
    let summary = db.seed_dashboard(&DashboardPlan::default(), &mut rng)?;
    println!("{summary}");

    println!("Seeded SQLite at {}", DB::database_url(&conn)?);
    Ok(())
}
