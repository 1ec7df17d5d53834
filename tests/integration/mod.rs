//! Integration tests for askdb.

pub mod browse_test;
pub mod common;
pub mod engine_test;
pub mod safety_test;
pub mod storage_test;
