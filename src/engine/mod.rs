//! Pure computations over the in-memory trade list. Nothing here touches
//! storage or the network.

pub mod curve;
pub mod filter;
pub mod risk;
pub mod stats;

pub use curve::{equity_curve, strategy_breakdown, EquityCurvePoint, StrategyBreakdown};
pub use filter::filter_trades;
pub use risk::{position_size, PositionSize};
pub use stats::{compute_stats, Stats};
