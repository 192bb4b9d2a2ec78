//! Trade ledger reduction

use rust_decimal::Decimal;

use crate::types::{BacktestResult, Trade};

/// Reduce a completed trade ledger to summary performance metrics.
///
/// A trade with pnl exactly 0 counts toward `totalTrades` but neither the
/// winning nor the losing bucket. The profit factor here is
/// `|avgWin / avgLoss|` — the ratio of the average winning trade to the
/// average losing trade, not the conventional gross-profit / gross-loss
/// ratio — and is 0 whenever there are no losing trades.
pub fn summarize(
    initial_capital: Decimal,
    final_capital: Decimal,
    trades: Vec<Trade>,
) -> BacktestResult {
    if trades.is_empty() {
        return BacktestResult {
            final_capital: initial_capital,
            total_pnl: Decimal::ZERO,
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: Decimal::ZERO,
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            profit_factor: Decimal::ZERO,
            trades,
        };
    }

    let hundred = Decimal::from(100);

    let total_pnl: Decimal = trades.iter().map(|t| t.pnl).sum();

    let winning: Vec<Decimal> = trades
        .iter()
        .filter(|t| t.pnl > Decimal::ZERO)
        .map(|t| t.pnl)
        .collect();
    let losing: Vec<Decimal> = trades
        .iter()
        .filter(|t| t.pnl < Decimal::ZERO)
        .map(|t| t.pnl)
        .collect();

    let win_count = winning.len() as u32;
    let loss_count = losing.len() as u32;
    let total_trades = trades.len() as u32;

    let win_rate = Decimal::from(win_count) / Decimal::from(total_trades) * hundred;

    let avg_win = if winning.is_empty() {
        Decimal::ZERO
    } else {
        winning.iter().sum::<Decimal>() / Decimal::from(win_count)
    };
    let avg_loss = if losing.is_empty() {
        Decimal::ZERO
    } else {
        losing.iter().sum::<Decimal>() / Decimal::from(loss_count)
    };

    let profit_factor = if avg_loss != Decimal::ZERO {
        (avg_win / avg_loss).abs()
    } else {
        Decimal::ZERO
    };

    BacktestResult {
        final_capital,
        total_pnl,
        total_trades,
        winning_trades: win_count,
        losing_trades: loss_count,
        win_rate,
        avg_win,
        avg_loss,
        profit_factor,
        trades,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn trade_with_pnl(day: i64, pnl: Decimal) -> Trade {
        let entry = Utc.timestamp_opt(1_700_000_000 + day * 86_400, 0).unwrap();
        Trade {
            entry_timestamp: entry,
            exit_timestamp: entry + chrono::Duration::days(1),
            entry_price: dec!(100),
            exit_price: dec!(100) + pnl / dec!(10),
            quantity: 10,
            pnl,
            pnl_percent: pnl / dec!(1000) * dec!(100),
        }
    }

    #[test]
    fn empty_ledger_zeroes_everything() {
        let result = summarize(dec!(1000000), dec!(1000000), vec![]);
        assert_eq!(result.final_capital, dec!(1000000));
        assert_eq!(result.total_pnl, Decimal::ZERO);
        assert_eq!(result.total_trades, 0);
        assert_eq!(result.winning_trades, 0);
        assert_eq!(result.losing_trades, 0);
        assert_eq!(result.win_rate, Decimal::ZERO);
        assert_eq!(result.avg_win, Decimal::ZERO);
        assert_eq!(result.avg_loss, Decimal::ZERO);
        assert_eq!(result.profit_factor, Decimal::ZERO);
        assert!(result.trades.is_empty());
    }

    #[test]
    fn mixed_ledger_buckets_and_averages() {
        let trades = vec![
            trade_with_pnl(0, dec!(10)),
            trade_with_pnl(1, dec!(30)),
            trade_with_pnl(2, dec!(-20)),
        ];
        let result = summarize(dec!(10000), dec!(10020), trades);

        assert_eq!(result.total_trades, 3);
        assert_eq!(result.winning_trades, 2);
        assert_eq!(result.losing_trades, 1);
        assert_eq!(result.total_pnl, dec!(20));
        assert_eq!(result.avg_win, dec!(20));
        assert_eq!(result.avg_loss, dec!(-20));
        // |20 / -20| = 1
        assert_eq!(result.profit_factor, dec!(1));
        assert_eq!(result.win_rate.round_dp(4), dec!(66.6667));
    }

    #[test]
    fn breakeven_trades_count_toward_neither_bucket() {
        let trades = vec![trade_with_pnl(0, dec!(0)), trade_with_pnl(1, dec!(10))];
        let result = summarize(dec!(10000), dec!(10010), trades);

        assert_eq!(result.total_trades, 2);
        assert_eq!(result.winning_trades, 1);
        assert_eq!(result.losing_trades, 0);
        assert_eq!(result.win_rate, dec!(50));
    }

    #[test]
    fn profit_factor_is_zero_without_losses() {
        let trades = vec![trade_with_pnl(0, dec!(10)), trade_with_pnl(1, dec!(20))];
        let result = summarize(dec!(10000), dec!(10030), trades);
        assert_eq!(result.avg_loss, Decimal::ZERO);
        assert_eq!(result.profit_factor, Decimal::ZERO);
    }

    #[test]
    fn avg_loss_stays_negative() {
        let trades = vec![trade_with_pnl(0, dec!(-15)), trade_with_pnl(1, dec!(-5))];
        let result = summarize(dec!(10000), dec!(9980), trades);
        assert_eq!(result.avg_loss, dec!(-10));
        assert_eq!(result.win_rate, Decimal::ZERO);
        assert_eq!(result.profit_factor, Decimal::ZERO);
    }
}
