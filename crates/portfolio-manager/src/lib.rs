//! Positions, cockpit analytics and correlation risk on top of the
//! scanner's watch-list.

pub mod cockpit;
pub mod error;
pub mod models;
pub mod portfolio;
pub mod risk_metrics;
pub mod shared_math;

pub use cockpit::cockpit_analytics;
pub use error::PortfolioError;
pub use models::*;
pub use portfolio::PortfolioManager;
pub use risk_metrics::{portfolio_risk, CorrelationRisk};
