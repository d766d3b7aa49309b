//! Gig worker audit engine.
//!
//! This crate stores platform records about gig workers (orders, payouts,
//! termination decisions and logs, review counts), evaluates them into
//! explainable audit reports, and checks worker grievances against the
//! stored record.

#![warn(missing_docs)]

pub mod api;
pub mod audit;
pub mod config;
pub mod error;
pub mod grievance;
pub mod models;
pub mod report;
pub mod simulator;
pub mod store;
