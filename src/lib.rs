//! pairs-screener: distance-method pairs trading research
//!
//! This library provides the core components for:
//! - Daily price ingestion and universe loading
//! - Price normalization and spread statistics
//! - Liquidity and benchmark-coverage screening
//! - Greedy pair selection with unit-root diagnostics
//! - Mean-reversion backtesting and performance metrics
//! - Result files, logging and metrics

pub mod analysis;
pub mod backtest;
pub mod cli;
pub mod config;
pub mod data;
pub mod model;
pub mod pipeline;
pub mod selection;
pub mod telemetry;
