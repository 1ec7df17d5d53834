//! Query execution for askdb.
//!
//! Isolates statement validation and execution from resolution and
//! presentation.

pub mod executor;

pub use executor::QueryExecutor;
