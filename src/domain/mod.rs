//! Core domain types and logic.

pub mod backtest;
pub mod bar;
pub mod config;
pub mod detector;
pub mod error;
pub mod execution;
pub mod features;
pub mod metrics;
pub mod portfolio;
pub mod trade;
pub mod universe;
pub mod walk_forward;
