//! Paper trade execution
//!
//! Fills an order instantly at the current quoted price. No order book, no
//! partial fills; the fill price is the quote the caller supplies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::IndexQuote;

/// Direction of a paper order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// An order to simulate against the current market price
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperOrder {
    pub symbol: String,
    pub quantity: u64,
    pub order_type: OrderSide,
}

/// The simulated fill for a paper order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperExecution {
    pub success: bool,
    pub order_type: OrderSide,
    pub symbol: String,
    pub quantity: u64,
    pub price: Decimal,
    pub total: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Fill the order at the quoted price
pub fn execute(order: &PaperOrder, quote: &IndexQuote, timestamp: DateTime<Utc>) -> PaperExecution {
    PaperExecution {
        success: true,
        order_type: order.order_type,
        symbol: order.symbol.clone(),
        quantity: order.quantity,
        price: quote.price,
        total: quote.price * Decimal::from(order.quantity),
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Exchange;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn quote_at(price: Decimal) -> IndexQuote {
        IndexQuote {
            symbol: "NIFTY 50".to_string(),
            price,
            change: dec!(10),
            change_percent: dec!(0.5),
            volume: 1_000,
            high: price + dec!(5),
            low: price - dec!(5),
            open: price - dec!(2),
            exchange: Exchange::Nse,
        }
    }

    #[test]
    fn total_is_price_times_quantity() {
        let order = PaperOrder {
            symbol: "NIFTY 50".to_string(),
            quantity: 25,
            order_type: OrderSide::Buy,
        };
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        let execution = execute(&order, &quote_at(dec!(19850.75)), now);

        assert!(execution.success);
        assert_eq!(execution.price, dec!(19850.75));
        assert_eq!(execution.total, dec!(496268.75));
        assert_eq!(execution.timestamp, now);
    }

    #[test]
    fn order_round_trips_through_its_wire_names() {
        let order: PaperOrder = serde_json::from_str(
            r#"{"symbol": "SENSEX", "quantity": 5, "orderType": "sell"}"#,
        )
        .unwrap();
        assert_eq!(order.order_type, OrderSide::Sell);

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["orderType"], "sell");
    }
}
