//! Dashboard fixtures: a handful of patients with backdated visits and
//! ordered tests, hung off reference rows that must already exist.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use anyhow::Result;
use log::{debug, info};
use rand::Rng;

use crate::error::SeedError;
use crate::model::{ClientType, Id, PaymentMode, Salutation, Sex, VisitTestStatus};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardPlan {
    pub patients: u32,
    pub visits: usize,
    pub tests_per_visit: RangeInclusive<usize>,
    pub max_days_back: u32,
    pub referral_clients: usize,
    pub templates: usize,
    /// Chance that a visit still has money owing. Must lie in `0.0..=1.0`.
    pub due_probability: f64,
}

impl Default for DashboardPlan {
    fn default() -> Self {
        Self {
            patients: 5,
            visits: 10,
            tests_per_visit: 2..=4,
            max_days_back: 29,
            referral_clients: 2,
            templates: 5,
            due_probability: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatient {
    pub salutation: Salutation,
    pub name: String,
    pub age_years: i32,
    pub age_months: i32,
    pub age_days: i32,
    pub sex: Sex,
    pub phone: String,
    pub address: String,
    pub email: String,
}

impl NewPatient {
    /// The `n`th synthetic patient, counting from 1.
    pub fn synthetic(n: u32) -> Self {
        let even = n % 2 == 0;
        Self {
            salutation: if even { Salutation::Mr } else { Salutation::Ms },
            name: format!("Patient {n}"),
            age_years: 25 + 5 * n as i32,
            age_months: 0,
            age_days: 0,
            sex: if even { Sex::Male } else { Sex::Female },
            phone: format!("999999999{n}"),
            address: format!("Address {n}"),
            email: format!("patient{n}@test.com"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    pub patient_id: Id,
    pub client_id: Id,
    pub total_cost: f64,
    pub due_amount: f64,
    pub payment_mode: PaymentMode,
    pub days_ago: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisitTest {
    pub visit_id: Id,
    pub template_id: Id,
    pub status: VisitTestStatus,
    pub days_ago: i32,
}

/// The statements the generator needs. Implementations run inside one
/// transaction that the caller commits once `seed` succeeds.
pub trait FixtureStore {
    /// Insert or, when the phone is already known, rename; returns the row id.
    fn upsert_patient(&mut self, patient: &NewPatient) -> Result<Id>;
    fn client_ids(&mut self, kind: ClientType, limit: usize) -> Result<Vec<Id>>;
    fn template_ids(&mut self, limit: usize) -> Result<Vec<Id>>;
    fn insert_visit(&mut self, visit: &NewVisit) -> Result<Id>;
    fn insert_visit_test(&mut self, test: &NewVisitTest) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    pub patients: usize,
    pub visits: usize,
    pub tests: usize,
    pub clients: usize,
    pub templates: usize,
}

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dashboard data seeded successfully!")?;
        writeln!(f, "   - Created {} patients", self.patients)?;
        writeln!(f, "   - Created {} visits", self.visits)?;
        write!(
            f,
            "   - Created {} tests across {} templates and {} referral clients",
            self.tests, self.templates, self.clients
        )
    }
}

/// Amounts are whole cents so they survive a NUMERIC(10,2) column.
fn cents(c: u32) -> f64 {
    f64::from(c) / 100.0
}

pub fn draw_visit<R: Rng>(
    rng: &mut R,
    plan: &DashboardPlan,
    patient_id: Id,
    client_id: Id,
) -> NewVisit {
    let total_cost = cents(rng.random_range(50_000..=250_000u32));
    let due_amount = if rng.random_bool(plan.due_probability) {
        cents(rng.random_range(1..50_000u32))
    } else {
        0.0
    };
    let days_ago = rng.random_range(0..=plan.max_days_back) as i32;
    NewVisit {
        patient_id,
        client_id,
        total_cost,
        due_amount,
        payment_mode: PaymentMode::Cash,
        days_ago,
    }
}

pub fn draw_status<R: Rng>(rng: &mut R) -> VisitTestStatus {
    VisitTestStatus::ALL[rng.random_range(0..VisitTestStatus::ALL.len())]
}

fn require(ids: Vec<Id>, table: &'static str, filter: &str) -> Result<Vec<Id>> {
    if ids.is_empty() {
        return Err(SeedError::EmptyLookup {
            table,
            filter: filter.to_string(),
        }
        .into());
    }
    Ok(ids)
}

/// Insert the plan's patients, visits and visit tests through `store`.
pub fn seed<S, R>(store: &mut S, plan: &DashboardPlan, rng: &mut R) -> Result<DashboardSummary>
where
    S: FixtureStore + ?Sized,
    R: Rng,
{
    info!("seeding dashboard data");

    let mut patient_ids = Vec::with_capacity(plan.patients as usize);
    for n in 1..=plan.patients {
        let id = store.upsert_patient(&NewPatient::synthetic(n))?;
        debug!("patient {n} -> id {id}");
        patient_ids.push(id);
    }
    let patient_ids = require(patient_ids, "patients", "synthetic")?;

    let client_ids = require(
        store.client_ids(ClientType::ReferralLab, plan.referral_clients)?,
        "clients",
        &format!("type = {}", ClientType::ReferralLab.as_str()),
    )?;
    let template_ids = require(store.template_ids(plan.templates)?, "test_templates", "any")?;

    let mut summary = DashboardSummary {
        patients: patient_ids.len(),
        ..Default::default()
    };
    let mut used_clients = BTreeSet::new();
    let mut used_templates = BTreeSet::new();
    let mut test_index = 0usize;

    for i in 0..plan.visits {
        let patient_id = patient_ids[i % patient_ids.len()];
        let client_id = client_ids[i % client_ids.len()];
        let visit = draw_visit(rng, plan, patient_id, client_id);
        let visit_id = store.insert_visit(&visit)?;
        used_clients.insert(client_id);
        summary.visits += 1;

        let count = rng.random_range(plan.tests_per_visit.clone());
        debug!("visit {visit_id}: {count} tests, {} days ago", visit.days_ago);
        for _ in 0..count {
            let template_id = template_ids[test_index % template_ids.len()];
            test_index += 1;
            store.insert_visit_test(&NewVisitTest {
                visit_id,
                template_id,
                status: draw_status(rng),
                days_ago: visit.days_ago,
            })?;
            used_templates.insert(template_id);
            summary.tests += 1;
        }
    }

    summary.clients = used_clients.len();
    summary.templates = used_templates.len();
    info!(
        "dashboard seed staged: {} patients, {} visits, {} tests",
        summary.patients, summary.visits, summary.tests
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    /// In-memory stand-in that records every statement.
    #[derive(Default)]
    struct RecordingStore {
        patients: HashMap<String, (Id, String)>,
        clients: Vec<Id>,
        templates: Vec<Id>,
        visits: Vec<(Id, NewVisit)>,
        tests: Vec<NewVisitTest>,
        next_id: Id,
    }

    impl RecordingStore {
        fn with_reference() -> Self {
            Self {
                clients: vec![11, 12, 13],
                templates: vec![21, 22, 23, 24, 25, 26],
                next_id: 100,
                ..Default::default()
            }
        }

        fn id(&mut self) -> Id {
            self.next_id += 1;
            self.next_id
        }
    }

    impl FixtureStore for RecordingStore {
        fn upsert_patient(&mut self, p: &NewPatient) -> Result<Id> {
            if let Some((id, name)) = self.patients.get_mut(&p.phone) {
                *name = p.name.clone();
                return Ok(*id);
            }
            let id = self.id();
            self.patients.insert(p.phone.clone(), (id, p.name.clone()));
            Ok(id)
        }

        fn client_ids(&mut self, kind: ClientType, limit: usize) -> Result<Vec<Id>> {
            assert_eq!(kind, ClientType::ReferralLab);
            Ok(self.clients.iter().copied().take(limit).collect())
        }

        fn template_ids(&mut self, limit: usize) -> Result<Vec<Id>> {
            Ok(self.templates.iter().copied().take(limit).collect())
        }

        fn insert_visit(&mut self, v: &NewVisit) -> Result<Id> {
            let id = self.id();
            self.visits.push((id, v.clone()));
            Ok(id)
        }

        fn insert_visit_test(&mut self, t: &NewVisitTest) -> Result<()> {
            self.tests.push(t.clone());
            Ok(())
        }
    }

    #[test]
    fn synthetic_patients_alternate() {
        let p1 = NewPatient::synthetic(1);
        assert_eq!(p1.salutation, Salutation::Ms);
        assert_eq!(p1.sex, Sex::Female);
        assert_eq!(p1.age_years, 30);
        assert_eq!(p1.phone, "9999999991");
        assert_eq!(p1.email, "patient1@test.com");

        let p4 = NewPatient::synthetic(4);
        assert_eq!(p4.salutation, Salutation::Mr);
        assert_eq!(p4.sex, Sex::Male);
        assert_eq!(p4.age_years, 45);
        assert_eq!(p4.address, "Address 4");
    }

    #[test]
    fn seed_respects_plan_bounds() {
        let plan = DashboardPlan::default();
        for seed_value in 0..50u64 {
            let mut store = RecordingStore::with_reference();
            let mut rng = StdRng::seed_from_u64(seed_value);
            let summary = seed(&mut store, &plan, &mut rng).unwrap();

            assert_eq!(summary.patients, 5);
            assert_eq!(summary.visits, 10);
            assert_eq!(store.visits.len(), 10);
            assert!((20..=40).contains(&summary.tests));
            assert_eq!(summary.tests, store.tests.len());

            for (id, visit) in &store.visits {
                let n = store.tests.iter().filter(|t| t.visit_id == *id).count();
                assert!((2..=4).contains(&n), "visit {id} has {n} tests");
                assert!(visit.due_amount == 0.0 || (visit.due_amount > 0.0 && visit.due_amount < 500.0));
                assert!((500.0..=2500.0).contains(&visit.total_cost));
                assert!((0..=29).contains(&visit.days_ago));
                assert!([11, 12].contains(&visit.client_id));
                assert_eq!(visit.payment_mode, PaymentMode::Cash);
            }
            for t in &store.tests {
                assert!(VisitTestStatus::ALL.contains(&t.status));
                let (_, visit) = store.visits.iter().find(|(id, _)| *id == t.visit_id).unwrap();
                assert_eq!(t.days_ago, visit.days_ago);
            }

            // round robin over the first five templates reaches all of them
            assert_eq!(summary.templates, 5);
            assert!(store.tests.iter().all(|t| t.template_id != 26));
            assert_eq!(summary.clients, 2);
        }
    }

    #[test]
    fn visits_cycle_through_patients() {
        let mut store = RecordingStore::with_reference();
        let mut rng = StdRng::seed_from_u64(1);
        seed(&mut store, &DashboardPlan::default(), &mut rng).unwrap();
        let patient_of = |i: usize| store.visits[i].1.patient_id;
        assert_eq!(patient_of(0), patient_of(5));
        assert_ne!(patient_of(0), patient_of(1));
        assert_eq!(store.visits[0].1.client_id, 11);
        assert_eq!(store.visits[1].1.client_id, 12);
        assert_eq!(store.visits[2].1.client_id, 11);
    }

    #[test]
    fn same_seed_same_fixtures() {
        let run = |s: u64| {
            let mut store = RecordingStore::with_reference();
            let mut rng = StdRng::seed_from_u64(s);
            seed(&mut store, &DashboardPlan::default(), &mut rng).unwrap();
            (store.visits, store.tests)
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42).0, run(43).0);
    }

    #[test]
    fn rerun_renames_instead_of_duplicating() {
        let mut store = RecordingStore::with_reference();
        let mut rng = StdRng::seed_from_u64(9);
        seed(&mut store, &DashboardPlan::default(), &mut rng).unwrap();
        let first: Vec<Id> = store.visits.iter().map(|(_, v)| v.patient_id).collect();
        store.visits.clear();
        seed(&mut store, &DashboardPlan::default(), &mut rng).unwrap();
        let second: Vec<Id> = store.visits.iter().map(|(_, v)| v.patient_id).collect();
        assert_eq!(store.patients.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_referral_labs_fail() {
        let mut store = RecordingStore::with_reference();
        store.clients.clear();
        let mut rng = StdRng::seed_from_u64(3);
        let err = seed(&mut store, &DashboardPlan::default(), &mut rng).unwrap_err();
        match err.downcast_ref::<SeedError>() {
            Some(SeedError::EmptyLookup { table, .. }) => assert_eq!(*table, "clients"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(store.visits.is_empty());
    }

    #[test]
    fn due_amounts_split_roughly_seventy_thirty() {
        let plan = DashboardPlan::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let owing = (0..10_000)
            .map(|_| draw_visit(&mut rng, &plan, 1, 1))
            .filter(|v| v.due_amount > 0.0)
            .count();
        assert!((2_700..3_300).contains(&owing), "owing = {owing}");
    }

    #[test]
    fn every_status_is_drawn() {
        let mut rng = StdRng::seed_from_u64(5);
        let seen: BTreeSet<&str> = (0..200).map(|_| draw_status(&mut rng).as_str()).collect();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn summary_prints_counts() {
        let s = DashboardSummary {
            patients: 5,
            visits: 10,
            tests: 31,
            clients: 2,
            templates: 5,
        };
        let text = s.to_string();
        assert!(text.contains("Created 5 patients"));
        assert!(text.contains("Created 10 visits"));
        assert!(text.contains("Created 31 tests"));
    }
}
