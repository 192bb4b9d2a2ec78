//! Types for the backtesting engine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// A single OHLCV bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Strategy selector plus its kind-specific parameters.
///
/// The wire format is internally tagged by `type`; unknown tags are mapped to
/// [`BacktestError::UnknownStrategy`] by [`StrategyConfig::from_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyKind {
    SmaCrossover {
        #[serde(rename = "shortPeriod", default = "default_short_period")]
        short_period: usize,
        #[serde(rename = "longPeriod", default = "default_long_period")]
        long_period: usize,
    },
    Rsi {
        #[serde(rename = "rsiPeriod", default = "default_rsi_period")]
        rsi_period: usize,
        #[serde(default = "default_oversold")]
        oversold: f64,
        #[serde(default = "default_overbought")]
        overbought: f64,
    },
    Macd,
}

fn default_short_period() -> usize {
    10
}

fn default_long_period() -> usize {
    50
}

fn default_rsi_period() -> usize {
    14
}

fn default_oversold() -> f64 {
    30.0
}

fn default_overbought() -> f64 {
    70.0
}

const KNOWN_STRATEGY_TYPES: &[&str] = &["sma_crossover", "rsi", "macd"];

/// Configuration for a backtest run, immutable once the run starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: StrategyKind,
    pub symbol: String,
    /// Position size as percentage of current capital (e.g., 10.0 = 10%)
    #[serde(rename = "positionSize")]
    pub position_size: Decimal,
    #[serde(rename = "initialCapital")]
    pub initial_capital: Decimal,
}

impl StrategyConfig {
    /// Parse a raw JSON strategy payload.
    ///
    /// An unrecognized `type` is a data-level error, not a transport one, so
    /// the caller can return it in an error payload.
    pub fn from_json(value: serde_json::Value) -> Result<Self, BacktestError> {
        match value.get("type").and_then(|t| t.as_str()) {
            None => {
                return Err(BacktestError::InvalidConfig(
                    "missing required field: type".to_string(),
                ))
            }
            Some(t) if !KNOWN_STRATEGY_TYPES.contains(&t) => {
                return Err(BacktestError::UnknownStrategy(t.to_string()))
            }
            Some(_) => {}
        }

        serde_json::from_value(value).map_err(|e| BacktestError::InvalidConfig(e.to_string()))
    }

    /// Check the numeric bounds shared by every strategy kind
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.position_size <= Decimal::ZERO || self.position_size > Decimal::from(100) {
            return Err(BacktestError::InvalidConfig(format!(
                "positionSize must be in (0, 100], got {}",
                self.position_size
            )));
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(BacktestError::InvalidConfig(format!(
                "initialCapital must be positive, got {}",
                self.initial_capital
            )));
        }
        Ok(())
    }

    /// Position size converted from percent to a fraction of capital
    pub fn position_fraction(&self) -> Decimal {
        self.position_size / Decimal::from(100)
    }
}

/// A completed round trip, immutable once recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub entry_timestamp: DateTime<Utc>,
    pub exit_timestamp: DateTime<Utc>,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: u64,
    pub pnl: Decimal,
    pub pnl_percent: Decimal,
}

/// Result of a backtest run, recomputed fresh each run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub final_capital: Decimal,
    #[serde(rename = "totalPnL")]
    pub total_pnl: Decimal,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub losing_trades: u32,
    pub win_rate: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub profit_factor: Decimal,
    pub trades: Vec<Trade>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn sma_config_applies_period_defaults() {
        let config = StrategyConfig::from_json(json!({
            "type": "sma_crossover",
            "symbol": "NIFTY 50",
            "positionSize": 10,
            "initialCapital": 1000000,
        }))
        .unwrap();

        match config.kind {
            StrategyKind::SmaCrossover {
                short_period,
                long_period,
            } => {
                assert_eq!(short_period, 10);
                assert_eq!(long_period, 50);
            }
            _ => panic!("wrong kind"),
        }
        assert_eq!(config.position_size, dec!(10));
        assert_eq!(config.initial_capital, dec!(1000000));
    }

    #[test]
    fn rsi_config_applies_threshold_defaults() {
        let config = StrategyConfig::from_json(json!({
            "type": "rsi",
            "symbol": "SENSEX",
            "positionSize": 25,
            "initialCapital": 50000,
            "rsiPeriod": 7,
        }))
        .unwrap();

        match config.kind {
            StrategyKind::Rsi {
                rsi_period,
                oversold,
                overbought,
            } => {
                assert_eq!(rsi_period, 7);
                assert_eq!(oversold, 30.0);
                assert_eq!(overbought, 70.0);
            }
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn unknown_type_is_a_distinct_error() {
        let err = StrategyConfig::from_json(json!({
            "type": "bollinger",
            "symbol": "NIFTY 50",
            "positionSize": 10,
            "initialCapital": 1000000,
        }))
        .unwrap_err();

        match err {
            BacktestError::UnknownStrategy(t) => assert_eq!(t, "bollinger"),
            other => panic!("expected UnknownStrategy, got {other:?}"),
        }
    }

    #[test]
    fn missing_required_field_is_invalid_config() {
        let err = StrategyConfig::from_json(json!({
            "type": "macd",
            "symbol": "NIFTY 50",
            "positionSize": 10,
        }))
        .unwrap_err();
        assert!(matches!(err, BacktestError::InvalidConfig(_)));

        let err = StrategyConfig::from_json(json!({
            "symbol": "NIFTY 50",
            "positionSize": 10,
            "initialCapital": 1000000,
        }))
        .unwrap_err();
        assert!(matches!(err, BacktestError::InvalidConfig(_)));
    }

    #[test]
    fn validate_rejects_out_of_range_sizing() {
        let mut config = StrategyConfig::from_json(json!({
            "type": "macd",
            "symbol": "NIFTY 50",
            "positionSize": 10,
            "initialCapital": 1000000,
        }))
        .unwrap();
        assert!(config.validate().is_ok());

        config.position_size = dec!(0);
        assert!(config.validate().is_err());
        config.position_size = dec!(101);
        assert!(config.validate().is_err());

        config.position_size = dec!(100);
        config.initial_capital = dec!(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn result_serializes_with_exact_wire_names() {
        let result = BacktestResult {
            final_capital: dec!(999020),
            total_pnl: dec!(-980),
            total_trades: 1,
            winning_trades: 0,
            losing_trades: 1,
            win_rate: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: dec!(-980),
            profit_factor: Decimal::ZERO,
            trades: vec![],
        };

        let value = serde_json::to_value(&result).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "finalCapital",
            "totalPnL",
            "totalTrades",
            "winningTrades",
            "losingTrades",
            "winRate",
            "avgWin",
            "avgLoss",
            "profitFactor",
            "trades",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
    }

    #[test]
    fn trade_serializes_camel_case() {
        let trade = Trade {
            entry_timestamp: Utc::now(),
            exit_timestamp: Utc::now(),
            entry_price: dec!(102),
            exit_price: dec!(101),
            quantity: 980,
            pnl: dec!(-980),
            pnl_percent: dec!(-0.98),
        };
        let value = serde_json::to_value(&trade).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "entryTimestamp",
            "exitTimestamp",
            "entryPrice",
            "exitPrice",
            "quantity",
            "pnl",
            "pnlPercent",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
    }
}
