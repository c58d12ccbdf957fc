use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortfolioError {
    #[error("Position not found: {0}")]
    PositionNotFound(Uuid),

    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    #[error("Price must be positive, got {0}")]
    InvalidPrice(Decimal),
}
