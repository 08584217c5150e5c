//! CrossLab core: EMA crossover detection and single-contract trade simulation.
//!
//! This crate contains:
//! - Domain types (bars, cross events, positions, trades, instruments)
//! - Indicator engine (EMA, lagged slopes, crossing angle)
//! - Cross detection, session split, trend classification, potential-cross prediction
//! - Event-driven trade simulator with take-profit exits
//! - Report builder
//! - Order-intent planner
//! - CSV persistence and the bar provider seam

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod orders;
pub mod report;
pub mod signals;

pub use engine::{simulate, Ledger, SimError};
pub use report::{summarize, Report, ReportError};
pub use signals::{classify_trend, detect_crosses};
