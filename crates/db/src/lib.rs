pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;
pub mod workflow;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{seed_demo_routes, SeedSummary};
pub use workflow::{SubmitApplication, WorkflowEngine};
