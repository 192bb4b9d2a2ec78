//! Bar-by-bar backtesting engine

use tracing::info;

use crate::error::BacktestError;
use crate::indicators::{self, EnrichedBar};
use crate::metrics;
use crate::position::PositionTracker;
use crate::strategy::{Evaluator, Signal};
use crate::types::{BacktestResult, Bar, StrategyConfig, Trade};

/// Backtesting engine that simulates bar-by-bar execution.
///
/// Every run builds its own capital accumulator, position tracker, and trade
/// ledger, so repeated runs with the same inputs are independent and
/// reproducible.
pub struct BacktestEngine;

impl BacktestEngine {
    /// Run a backtest over an indicator-enriched series.
    ///
    /// The series must already have warm-up bars excluded; evaluation starts
    /// at its second bar, each bar being judged against its predecessor. A
    /// position still open after the last bar is force-closed at that bar's
    /// close price. Capital changes exactly once per completed trade.
    pub fn run(
        config: &StrategyConfig,
        series: &[EnrichedBar],
    ) -> Result<BacktestResult, BacktestError> {
        config.validate()?;
        if series.is_empty() {
            return Err(BacktestError::NoData);
        }

        let evaluator = Evaluator::new(&config.kind);
        let fraction = config.position_fraction();

        let mut capital = config.initial_capital;
        let mut tracker = PositionTracker::new();
        let mut trades: Vec<Trade> = Vec::new();

        info!(
            symbol = %config.symbol,
            bars = series.len(),
            capital = %config.initial_capital,
            "Starting backtest"
        );

        for pair in series.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);

            match evaluator.evaluate(prev, curr, tracker.is_open()) {
                Signal::Enter => {
                    tracker.open(&curr.bar, capital, fraction);
                }
                Signal::Exit => {
                    if let Some(trade) = tracker.close(&curr.bar) {
                        capital += trade.pnl;
                        trades.push(trade);
                    }
                }
                Signal::Hold => {}
            }
        }

        // Force-close anything still open at the end of the series
        if let Some(last) = series.last() {
            if let Some(trade) = tracker.close(&last.bar) {
                capital += trade.pnl;
                trades.push(trade);
            }
        }

        info!(
            total_trades = trades.len(),
            final_capital = %capital,
            "Backtest complete"
        );

        Ok(metrics::summarize(config.initial_capital, capital, trades))
    }

    /// Enrich a raw bar series with the configured strategy's indicators and
    /// run the backtest on it. An empty input, or one that is entirely
    /// warm-up, is surfaced as [`BacktestError::NoData`].
    pub fn run_on_bars(
        config: &StrategyConfig,
        bars: &[Bar],
    ) -> Result<BacktestResult, BacktestError> {
        let series = indicators::enrich(bars, &config.kind)?;
        Self::run(config, &series)
    }
}
