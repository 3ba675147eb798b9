pub mod batch;
pub mod dashboard;
pub mod reference;
pub mod value;

pub use batch::{Conflict, Record, UpsertBatch};
pub use dashboard::{DashboardPlan, DashboardSummary, FixtureStore};
pub use reference::{load_reference_data, Bootstrap, LoadReport, ReferenceCatalog, SeedScript};
pub use value::{Dialect, Value};
