//! Normalization and descriptive statistics
//!
//! Converts raw price series into comparable ratio series and summarizes
//! spreads between them.

mod cache;
mod error;
mod normalize;
mod screening;
mod stats;

pub use cache::{CacheKey, StatisticsCache};
pub use error::AnalysisError;
pub use normalize::{difference, reference_normalize, self_normalize, NormalizedSeries};
pub use screening::{average_price_volume, check_coverage, price_volume, Coverage};
pub use stats::{mean_and_std_dev, unit_root_p_value, Moments};
