//! askdb - answer free-text questions about a companies table.
//!
//! A question is resolved to one bounded, read-only query (by a language
//! model when one is configured, by deterministic rules otherwise), executed
//! against SQLite, and rendered for a text, JSON, or HTML consumer.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod llm;
pub mod logging;
pub mod present;
pub mod query;
pub mod resolve;
pub mod safety;
