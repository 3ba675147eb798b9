//! Seeding tools for the LMS laboratory database.
//!
//! Two independent jobs live here: the reference loader, which makes sure
//! the static catalogs exist, and the dashboard generator, which adds a few
//! patients with backdated visits so the dashboard has something to show.

pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod logger;
pub mod model;
pub mod seed;

pub use error::SeedError;
