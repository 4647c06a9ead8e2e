//! Pair selection
//!
//! Screens the universe for liquidity and benchmark date coverage, then
//! greedily matches symbols whose normalized prices move together.

mod filter;
mod selector;
mod types;

pub use filter::{FilterResult, RejectReason, UniverseFilter};
pub use selector::{
    MatchSummary, PairSelector, PoolEntry, SelectionConfig, SelectionOutcome, SelectionReport,
};
pub use types::{PairId, PairStatistics, UnitRootConfig, UnitRootPValues};
