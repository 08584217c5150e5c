//! Trade simulation engine.
//!
//! One instrument at a time, strictly sequential: events in, ledger out.
//! Instruments share nothing, so callers may simulate them in parallel.

pub mod accounting;
pub mod exit_search;
pub mod simulator;

pub use accounting::{CapitalPoint, CapitalTracker};
pub use exit_search::{find_exit, next_bar_index, ExitFill};
pub use simulator::{simulate, Ledger, SimError, SimulationContext, SkipReason, SkippedSignal};
