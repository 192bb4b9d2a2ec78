//! MarketForge Engine — strategy backtesting over indicator-enriched bars
//!
//! Provides:
//! - A bar-by-bar backtest engine with a single long-only position slot
//! - Crossover strategy evaluators (SMA pair, RSI thresholds, MACD signal)
//! - Indicator enrichment that excludes warm-up bars before evaluation
//! - A Yahoo Finance client for index quotes and historical bars
//! - Instant-fill paper trade execution

pub mod api;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod metrics;
pub mod paper;
pub mod position;
pub mod strategy;
pub mod types;

// Re-exports for convenience
pub use api::{resolve_index, Exchange, IndexInfo, IndexQuote, YahooFinanceClient, INDICES};
pub use engine::BacktestEngine;
pub use error::BacktestError;
pub use indicators::{enrich, EnrichedBar, IndicatorSnapshot};
pub use paper::{execute as execute_paper_trade, OrderSide, PaperExecution, PaperOrder};
pub use position::PositionTracker;
pub use strategy::{Evaluator, Signal};
pub use types::*;
