use chrono::Utc;
use market_scanner::WatchlistStore;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::error::PortfolioError;
use crate::models::*;

/// Round money to cents, half away from zero.
pub(crate) fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// In-memory positions alongside the published watch-list.
pub struct PortfolioManager {
    watchlist: WatchlistStore,
    open_positions: Vec<Position>,
    closed_positions: Vec<Position>,
}

impl PortfolioManager {
    pub fn new(watchlist: WatchlistStore) -> Self {
        Self {
            watchlist,
            open_positions: Vec::new(),
            closed_positions: Vec::new(),
        }
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    /// Open a new position
    pub fn open_position(&mut self, input: PositionInput) -> Result<Position, PortfolioError> {
        if input.quantity <= Decimal::ZERO {
            return Err(PortfolioError::InvalidQuantity(input.quantity));
        }
        if input.entry_price <= Decimal::ZERO {
            return Err(PortfolioError::InvalidPrice(input.entry_price));
        }

        let position = Position {
            id: Uuid::new_v4(),
            ticker: input.ticker.to_uppercase(),
            quantity: input.quantity,
            entry_price: input.entry_price,
            target_price: input.target_price,
            stop_loss_price: input.stop_loss_price,
            reason: input.reason,
            open_date: Utc::now(),
            status: PositionStatus::Active,
            close_price: None,
            close_date: None,
            pnl: None,
            pnl_percent: None,
        };

        tracing::info!(
            "Opened position: {} shares of {} at {}",
            position.quantity,
            position.ticker,
            position.entry_price
        );
        self.open_positions.push(position.clone());
        Ok(position)
    }

    /// Close an open position and move it to the history
    pub fn close_position(
        &mut self,
        id: Uuid,
        close_price: Decimal,
    ) -> Result<Position, PortfolioError> {
        if close_price < Decimal::ZERO {
            return Err(PortfolioError::InvalidPrice(close_price));
        }
        let index = self
            .open_positions
            .iter()
            .position(|p| p.id == id)
            .ok_or(PortfolioError::PositionNotFound(id))?;

        let mut position = self.open_positions.remove(index);
        let pnl = (close_price - position.entry_price) * position.quantity;
        let pnl_percent =
            (close_price / position.entry_price - Decimal::ONE) * Decimal::ONE_HUNDRED;

        position.close_price = Some(close_price);
        position.close_date = Some(Utc::now());
        position.status = PositionStatus::Closed;
        position.pnl = Some(round_cents(pnl));
        position.pnl_percent = Some(round_cents(pnl_percent));

        tracing::info!("Closed position for {}. P&L: {}", position.ticker, round_cents(pnl));
        self.closed_positions.push(position.clone());
        Ok(position)
    }

    pub fn open_positions(&self) -> &[Position] {
        &self.open_positions
    }

    pub fn closed_positions(&self) -> &[Position] {
        &self.closed_positions
    }

    /// Dream team plus open and closed positions
    pub async fn full_state(&self) -> PortfolioState {
        PortfolioState {
            dream_team: self.watchlist.get_candidates().await,
            open_positions: self.open_positions.clone(),
            closed_positions: self.closed_positions.clone(),
        }
    }
}
