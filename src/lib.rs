//! SLABWATCH: ACE 10 to PSA 10 grading arbitrage price tracker
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod cli;
pub mod config;
pub mod types;
pub mod filter;
pub mod pricing;
pub mod marketplace;
pub mod engine;
pub mod watchlist;
pub mod report;
pub mod storage;
pub mod dashboard;
