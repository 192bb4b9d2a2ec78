//! Indicator enrichment for strategy evaluation
//!
//! Attaches the indicator values a strategy needs to each bar, keyed by
//! semantic role rather than by column name. Bars inside an indicator's
//! warm-up window are excluded from the output entirely, so the engine only
//! ever sees fully-defined values.

use ta::indicators::{
    MovingAverageConvergenceDivergence, RelativeStrengthIndex, SimpleMovingAverage,
};
use ta::Next;

use crate::error::BacktestError;
use crate::types::{Bar, StrategyKind};

/// Standard MACD parameters (fast EMA, slow EMA, signal EMA)
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

/// Indicator values attached to one bar, shaped by the selected strategy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorSnapshot {
    MovingAverages { short: f64, long: f64 },
    Rsi { value: f64 },
    Macd { line: f64, signal: f64 },
}

/// A bar whose required indicator values are all defined
#[derive(Debug, Clone)]
pub struct EnrichedBar {
    pub bar: Bar,
    pub values: IndicatorSnapshot,
}

/// Convert a Decimal close price to f64 for the indicator pipeline
fn close_f64(bar: &Bar) -> f64 {
    bar.close.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Compute the selected strategy's indicator columns over the series.
///
/// Returns only the bars where every required value is defined; leading
/// warm-up bars are dropped. The output preserves input order.
pub fn enrich(bars: &[Bar], kind: &StrategyKind) -> Result<Vec<EnrichedBar>, BacktestError> {
    match kind {
        StrategyKind::SmaCrossover {
            short_period,
            long_period,
        } => enrich_sma(bars, *short_period, *long_period),
        StrategyKind::Rsi { rsi_period, .. } => enrich_rsi(bars, *rsi_period),
        StrategyKind::Macd => Ok(enrich_macd(bars)),
    }
}

fn enrich_sma(
    bars: &[Bar],
    short_period: usize,
    long_period: usize,
) -> Result<Vec<EnrichedBar>, BacktestError> {
    let mut short_sma = SimpleMovingAverage::new(short_period)
        .map_err(|_| BacktestError::InvalidConfig(format!("invalid shortPeriod {short_period}")))?;
    let mut long_sma = SimpleMovingAverage::new(long_period)
        .map_err(|_| BacktestError::InvalidConfig(format!("invalid longPeriod {long_period}")))?;

    let warmup = short_period.max(long_period);
    let mut enriched = Vec::with_capacity(bars.len().saturating_sub(warmup.saturating_sub(1)));

    for (i, bar) in bars.iter().enumerate() {
        let close = close_f64(bar);
        let short = short_sma.next(close);
        let long = long_sma.next(close);

        // Both windows full once `warmup` bars have been seen
        if i + 1 >= warmup {
            enriched.push(EnrichedBar {
                bar: bar.clone(),
                values: IndicatorSnapshot::MovingAverages { short, long },
            });
        }
    }

    Ok(enriched)
}

fn enrich_rsi(bars: &[Bar], period: usize) -> Result<Vec<EnrichedBar>, BacktestError> {
    let mut rsi = RelativeStrengthIndex::new(period)
        .map_err(|_| BacktestError::InvalidConfig(format!("invalid rsiPeriod {period}")))?;

    // RSI averages `period` price changes, so it needs period + 1 closes
    let warmup = period + 1;
    let mut enriched = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        let value = rsi.next(close_f64(bar));
        if i + 1 >= warmup {
            enriched.push(EnrichedBar {
                bar: bar.clone(),
                values: IndicatorSnapshot::Rsi { value },
            });
        }
    }

    Ok(enriched)
}

fn enrich_macd(bars: &[Bar]) -> Vec<EnrichedBar> {
    let mut macd = MovingAverageConvergenceDivergence::new(MACD_FAST, MACD_SLOW, MACD_SIGNAL)
        .expect("static MACD parameters are valid");

    // The signal line is an EMA(9) of a line that itself needs the slow
    // window, so both are defined after slow + signal - 1 bars
    let warmup = MACD_SLOW + MACD_SIGNAL - 1;
    let mut enriched = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        let out = macd.next(close_f64(bar));
        if i + 1 >= warmup {
            enriched.push(EnrichedBar {
                bar: bar.clone(),
                values: IndicatorSnapshot::Macd {
                    line: out.macd,
                    signal: out.signal,
                },
            });
        }
    }

    enriched
}
