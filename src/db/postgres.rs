use anyhow::{Context, Result};
use log::debug;
use rand::Rng;

use crate::connection::Connection;
use crate::db::{DBBehavior, ScriptTarget};
use crate::model::{ClientType, Id};
use crate::seed::dashboard::{
    self, DashboardPlan, DashboardSummary, FixtureStore, NewPatient, NewVisit, NewVisitTest,
};
use crate::seed::value::Dialect;

pub struct Postgres {
    client: postgres::Client,
}

impl DBBehavior for Postgres {
    fn database_url(conn: &Connection) -> Result<String> {
        let user = conn.require(&conn.user, "user")?;
        let host = conn.require(&conn.host, "host")?;
        let port = conn.require(&conn.port, "port")?;
        let password = conn
            .password
            .as_ref()
            .map_or(String::new(), |p| p.to_string());

        match conn.database.as_ref() {
            Some(database) => Ok(format!(
                "postgres://{user}:{password}@{host}:{port}/{database}",
                user = user,
                password = password,
                host = host,
                port = port,
                database = database
            )),
            None => Ok(format!(
                "postgres://{user}:{password}@{host}:{port}",
                user = user,
                password = password,
                host = host,
                port = port,
            )),
        }
    }

    fn open(conn: &Connection) -> Result<Self> {
        debug!("postgres: connecting");
        let url = Postgres::database_url(conn)?;
        let client = postgres::Client::connect(&url, postgres::NoTls).with_context(|| {
            format!(
                "failed to connect to postgres at {}:{}",
                conn.host.as_deref().unwrap_or_default(),
                conn.port.unwrap_or_default()
            )
        })?;
        debug!("postgres: connected");
        Ok(Self { client })
    }

    fn seed_dashboard<R: Rng>(&mut self, plan: &DashboardPlan, rng: &mut R) -> Result<DashboardSummary> {
        let mut tx = self.client.transaction()?;
        let summary = dashboard::seed(&mut tx, plan, rng)?;
        tx.commit()?;
        debug!("postgres: dashboard transaction committed");
        Ok(summary)
    }
}

impl ScriptTarget for Postgres {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn apply(&mut self, sql: &str) -> Result<()> {
        let mut tx = self.client.transaction()?;
        tx.batch_execute(sql).context("reference script failed")?;
        tx.commit()?;
        Ok(())
    }
}

// Ids come back as bigint whatever the serial width, and integer parameters
// are cast so the driver never has to guess the column type.
impl FixtureStore for postgres::Transaction<'_> {
    fn upsert_patient(&mut self, p: &NewPatient) -> Result<Id> {
        let row = self.query_one(
            "INSERT INTO patients (salutation, name, age_years, age_months, age_days, sex, phone, address, email)
             VALUES ($1, $2, $3::int, $4::int, $5::int, $6, $7, $8, $9)
             ON CONFLICT (phone) DO UPDATE SET name = EXCLUDED.name
             RETURNING id::bigint",
            &[
                &p.salutation.as_str(),
                &p.name,
                &p.age_years,
                &p.age_months,
                &p.age_days,
                &p.sex.as_str(),
                &p.phone,
                &p.address,
                &p.email,
            ],
        )?;
        Ok(row.get(0))
    }

    fn client_ids(&mut self, kind: ClientType, limit: usize) -> Result<Vec<Id>> {
        let rows = self.query(
            "SELECT id::bigint FROM clients WHERE type::text = $1 ORDER BY id LIMIT $2",
            &[&kind.as_str(), &(limit as i64)],
        )?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    fn template_ids(&mut self, limit: usize) -> Result<Vec<Id>> {
        let rows = self.query(
            "SELECT id::bigint FROM test_templates ORDER BY id LIMIT $1",
            &[&(limit as i64)],
        )?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    fn insert_visit(&mut self, v: &NewVisit) -> Result<Id> {
        let row = self.query_one(
            "INSERT INTO visits (patient_id, ref_customer_id, total_cost, due_amount, payment_mode, created_at)
             VALUES ($1::bigint, $2::bigint, $3::float8, $4::float8, $5, NOW() - make_interval(days => $6::int))
             RETURNING id::bigint",
            &[
                &v.patient_id,
                &v.client_id,
                &v.total_cost,
                &v.due_amount,
                &v.payment_mode.as_str(),
                &v.days_ago,
            ],
        )?;
        Ok(row.get(0))
    }

    fn insert_visit_test(&mut self, t: &NewVisitTest) -> Result<()> {
        self.execute(
            "INSERT INTO visit_tests (visit_id, test_template_id, status, created_at)
             VALUES ($1::bigint, $2::bigint, $3, NOW() - make_interval(days => $4::int))",
            &[&t.visit_id, &t.template_id, &t.status.as_str(), &t.days_ago],
        )?;
        Ok(())
    }
}
