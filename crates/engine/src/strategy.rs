//! Strategy evaluators
//!
//! One pure crossover rule per strategy kind, applied to a (previous,
//! current) pair of enriched bars. All three share the same idiom: the
//! trailing sample is compared non-strictly and the leading sample strictly,
//! so a flat tie between the two series never triggers twice.

use crate::indicators::{EnrichedBar, IndicatorSnapshot};
use crate::types::StrategyKind;

/// Trading signal for one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Enter,
    Exit,
    Hold,
}

/// Signal rule selected once at run start
pub struct Evaluator {
    kind: StrategyKind,
}

impl Evaluator {
    pub fn new(kind: &StrategyKind) -> Self {
        Self { kind: kind.clone() }
    }

    /// Evaluate the (previous, current) bar pair against the open-position
    /// state. Entries are only produced while flat and exits only while open.
    pub fn evaluate(&self, prev: &EnrichedBar, curr: &EnrichedBar, in_position: bool) -> Signal {
        match (&self.kind, prev.values, curr.values) {
            (
                StrategyKind::SmaCrossover { .. },
                IndicatorSnapshot::MovingAverages {
                    short: prev_short,
                    long: prev_long,
                },
                IndicatorSnapshot::MovingAverages {
                    short: curr_short,
                    long: curr_long,
                },
            ) => crossover_signal(
                in_position,
                prev_short <= prev_long && curr_short > curr_long,
                prev_short >= prev_long && curr_short < curr_long,
            ),
            (
                StrategyKind::Rsi {
                    oversold,
                    overbought,
                    ..
                },
                IndicatorSnapshot::Rsi { value: prev_rsi },
                IndicatorSnapshot::Rsi { value: curr_rsi },
            ) => crossover_signal(
                in_position,
                // Entries gate on the oversold level, exits on the
                // overbought one; the bands are deliberately asymmetric
                prev_rsi <= *oversold && curr_rsi > *oversold,
                prev_rsi >= *overbought && curr_rsi < *overbought,
            ),
            (
                StrategyKind::Macd,
                IndicatorSnapshot::Macd {
                    line: prev_line,
                    signal: prev_signal,
                },
                IndicatorSnapshot::Macd {
                    line: curr_line,
                    signal: curr_signal,
                },
            ) => crossover_signal(
                in_position,
                prev_line <= prev_signal && curr_line > curr_signal,
                prev_line >= prev_signal && curr_line < curr_signal,
            ),
            // Snapshot shape always matches the kind that produced it
            _ => Signal::Hold,
        }
    }
}

fn crossover_signal(in_position: bool, crossed_up: bool, crossed_down: bool) -> Signal {
    if !in_position && crossed_up {
        Signal::Enter
    } else if in_position && crossed_down {
        Signal::Exit
    } else {
        Signal::Hold
    }
}
