//! HTTP API handlers for mdt-debtors

pub mod debtors;
pub mod health;

pub use debtors::debtor_routes;
pub use health::health_routes;
