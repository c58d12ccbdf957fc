use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{CockpitAnalytics, Position};
use crate::portfolio::round_cents;

/// Performance figures over closed positions. Positions without a realised
/// P&L count as flat trades.
pub fn cockpit_analytics(closed_positions: &[Position]) -> CockpitAnalytics {
    let total_trades = closed_positions.len();
    if total_trades == 0 {
        return CockpitAnalytics {
            total_pnl: Decimal::ZERO,
            win_rate: Decimal::ZERO,
            total_trades: 0,
            profit_factor: None,
            avg_profit: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
        };
    }

    let pnls: Vec<Decimal> = closed_positions
        .iter()
        .map(|p| p.pnl.unwrap_or_default())
        .collect();
    let wins: Vec<Decimal> = pnls.iter().copied().filter(|p| *p > Decimal::ZERO).collect();
    let losses: Vec<Decimal> = pnls.iter().copied().filter(|p| *p < Decimal::ZERO).collect();

    let total_pnl: Decimal = pnls.iter().sum();
    let total_profit: Decimal = wins.iter().sum();
    let total_loss: Decimal = losses.iter().sum::<Decimal>().abs();

    let win_rate = Decimal::from(wins.len()) / Decimal::from(total_trades) * Decimal::ONE_HUNDRED;
    let average = |sum: Decimal, count: usize| {
        if count == 0 {
            Decimal::ZERO
        } else {
            sum / Decimal::from(count)
        }
    };
    let profit_factor = if total_loss > Decimal::ZERO {
        Some(round_cents(total_profit / total_loss))
    } else {
        None
    };

    tracing::debug!("Cockpit: {} closed trades analysed", total_trades);

    CockpitAnalytics {
        total_pnl: round_cents(total_pnl),
        win_rate: win_rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
        total_trades,
        profit_factor,
        avg_profit: round_cents(average(total_profit, wins.len())),
        avg_loss: round_cents(average(total_loss, losses.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PositionStatus;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn closed(pnl: Option<Decimal>) -> Position {
        Position {
            id: Uuid::new_v4(),
            ticker: "TEST".to_string(),
            quantity: dec!(10),
            entry_price: dec!(1),
            target_price: None,
            stop_loss_price: None,
            reason: String::new(),
            open_date: Utc::now(),
            status: PositionStatus::Closed,
            close_price: None,
            close_date: None,
            pnl,
            pnl_percent: None,
        }
    }

    #[test]
    fn test_empty_history() {
        let analytics = cockpit_analytics(&[]);
        assert_eq!(analytics.total_trades, 0);
        assert_eq!(analytics.total_pnl, Decimal::ZERO);
        assert_eq!(analytics.profit_factor, None);
        assert_eq!(analytics.profit_factor_label(), "N/A");
    }

    #[test]
    fn test_mixed_history() {
        let positions = vec![
            closed(Some(dec!(100))),
            closed(Some(dec!(50))),
            closed(Some(dec!(-40))),
        ];
        let analytics = cockpit_analytics(&positions);

        assert_eq!(analytics.total_trades, 3);
        assert_eq!(analytics.total_pnl, dec!(110));
        assert_eq!(analytics.win_rate, dec!(66.7));
        assert_eq!(analytics.profit_factor, Some(dec!(3.75)));
        assert_eq!(analytics.avg_profit, dec!(75));
        assert_eq!(analytics.avg_loss, dec!(40));
        assert_eq!(analytics.profit_factor_label(), "3.75");
    }

    #[test]
    fn test_no_losses_is_infinite() {
        let positions = vec![closed(Some(dec!(12.5))), closed(None)];
        let analytics = cockpit_analytics(&positions);

        assert_eq!(analytics.total_trades, 2);
        assert_eq!(analytics.win_rate, dec!(50.0));
        assert_eq!(analytics.profit_factor, None);
        assert_eq!(analytics.profit_factor_label(), "∞");
        assert_eq!(analytics.avg_loss, Decimal::ZERO);
    }
}
