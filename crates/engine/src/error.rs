//! Error taxonomy for the backtest core

use thiserror::Error;

/// Everything a backtest run can reject before or instead of producing a
/// result. Degenerate numeric cases (zero trades, zero average loss, a
/// computed entry quantity of 0) are not errors and never appear here.
#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Unknown strategy type: {0}")]
    UnknownStrategy(String),

    #[error("No historical data available")]
    NoData,

    #[error("Invalid strategy configuration: {0}")]
    InvalidConfig(String),
}
