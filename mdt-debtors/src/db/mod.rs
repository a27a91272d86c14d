//! Database access for mdt-debtors
//!
//! Table creation lives in `mdt_common::db`; this module holds the queries.

pub mod debtors;
pub mod phone_records;
