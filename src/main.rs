use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use lms_seed::config::{get_app_config_path, Config};
use lms_seed::db::{Psql, ScriptTarget, DB};
use lms_seed::logger;
use lms_seed::seed::{
    load_reference_data, Bootstrap, DashboardPlan, Dialect, ReferenceCatalog, SeedScript,
};

#[derive(Parser)]
#[command(name = "lms-seed", version, about = "Seed the LMS laboratory database")]
struct Cli {
    /// YAML config file; defaults to <config dir>/lms-seed/config.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Insert sample patients, visits and tests for the dashboard
    Dashboard(DashboardArgs),
    /// Load users, antibiotics, test templates and other reference catalogs
    Reference(ReferenceArgs),
}

#[derive(Args)]
struct DashboardArgs {
    /// Seed for the random source; omit for a different run every time
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Via {
    /// psql inside the database container
    Psql,
    /// the configured connection
    Direct,
}

#[derive(Args)]
struct ReferenceArgs {
    #[arg(long, value_enum, default_value_t = Via::Psql)]
    via: Via,

    /// Reference catalog YAML replacing the built-in one
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Print the rendered script instead of applying it
    #[arg(long)]
    print: bool,
}

fn main() {
    if let Ok(dir) = get_app_config_path() {
        let _ = logger::init(dir.join("lms-seed.log"));
    }

    let cli = Cli::parse();
    match cli.command {
        Cmd::Dashboard(args) => {
            // failures are reported, not signalled through the exit code
            if let Err(err) = run_dashboard(cli.config, args) {
                println!("Error: {:#}", err);
                eprintln!("{:?}", err);
                log::error!("dashboard seed failed: {:#}", err);
            }
        }
        Cmd::Reference(args) => {
            if let Err(err) = run_reference(cli.config, args) {
                println!("Error seeding database: {:#}", err);
                log::error!("reference load failed: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}

fn run_dashboard(config: Option<PathBuf>, args: DashboardArgs) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    println!("Seeding dashboard test data...");
    let summary = DB::seed_dashboard(&config.connection, &DashboardPlan::default(), &mut rng)?;
    println!("{summary}");
    Ok(())
}

fn run_reference(config: Option<PathBuf>, args: ReferenceArgs) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let fixtures = args.fixtures.or(config.reference.fixtures.clone());
    let catalog = ReferenceCatalog::load(fixtures.as_deref())?;

    let conn = &config.connection;
    let bootstrap = match (conn.user.clone(), conn.database.clone()) {
        (Some(role), Some(database)) => Some(Bootstrap {
            role,
            password: conn.password.clone().unwrap_or_default(),
            database,
        }),
        _ => None,
    };
    let script = SeedScript::new(&catalog, bootstrap);

    if args.print {
        let dialect = match args.via {
            Via::Psql => Dialect::Psql,
            Via::Direct if conn.r#type == lms_seed::db::DatabaseType::Sqlite => Dialect::Sqlite,
            Via::Direct => Dialect::Postgres,
        };
        print!("{}", script.render(dialect));
        return Ok(());
    }

    let mut target: Box<dyn ScriptTarget> = match args.via {
        Via::Psql => {
            let psql = Psql::new(&config.container, &config.reference);
            if !psql.is_cli_tool_available() {
                log::warn!("{} does not answer --version", psql.cli_tool_name());
            }
            psql.wait_until_ready();
            Box::new(psql)
        }
        Via::Direct => DB::target(conn)?,
    };

    let report = load_reference_data(target.as_mut(), &script)?;
    println!(
        "Database seeded successfully! ({} tables, {} rows)",
        report.tables, report.rows
    );
    Ok(())
}
