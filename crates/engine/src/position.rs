//! Position tracking
//!
//! At most one position exists at a time: the tracker cycles Flat → Open →
//! Flat and emits exactly one [`Trade`] per close. Signals that do not match
//! the current state are ignored by construction.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::types::{Bar, Trade};

/// The open side of a not-yet-completed trade
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub entry_timestamp: DateTime<Utc>,
    pub entry_price: Decimal,
    pub quantity: u64,
}

/// Single-position state machine; absence of a position means flat
#[derive(Debug, Default)]
pub struct PositionTracker {
    position: Option<OpenPosition>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self { position: None }
    }

    pub fn is_open(&self) -> bool {
        self.position.is_some()
    }

    /// Open a position at the bar's close, sized as a whole-unit quantity:
    /// `floor(capital × fraction / price)`. Returns false without a state
    /// change when already open, when the bar has no positive price, or when
    /// the computed quantity is 0 (capital fraction too small for one unit).
    pub fn open(&mut self, bar: &Bar, capital: Decimal, fraction: Decimal) -> bool {
        if self.position.is_some() || bar.close <= Decimal::ZERO {
            return false;
        }

        let quantity = (capital * fraction / bar.close)
            .floor()
            .to_u64()
            .unwrap_or(0);
        if quantity == 0 {
            return false;
        }

        debug!(
            price = %bar.close,
            quantity,
            time = %bar.timestamp,
            "Opened long position"
        );

        self.position = Some(OpenPosition {
            entry_timestamp: bar.timestamp,
            entry_price: bar.close,
            quantity,
        });
        true
    }

    /// Close the open position at the bar's close and produce the completed
    /// trade. Returns None when flat.
    pub fn close(&mut self, bar: &Bar) -> Option<Trade> {
        let pos = self.position.take()?;

        let quantity = Decimal::from(pos.quantity);
        let pnl = (bar.close - pos.entry_price) * quantity;
        let pnl_percent = pnl / (pos.entry_price * quantity) * Decimal::from(100);

        debug!(
            entry = %pos.entry_price,
            exit = %bar.close,
            pnl = %pnl,
            "Closed position"
        );

        Some(Trade {
            entry_timestamp: pos.entry_timestamp,
            exit_timestamp: bar.timestamp,
            entry_price: pos.entry_price,
            exit_price: bar.close,
            quantity: pos.quantity,
            pnl,
            pnl_percent,
        })
    }
}
