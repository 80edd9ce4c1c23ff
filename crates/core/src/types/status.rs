//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Transitions are one-way: `Open -> Completed` or `Open -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Open,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether lines may still be edited and the order fulfilled or cancelled.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// String form used in the database and API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Staff role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Manages menu, warehouse and schedule.
    Admin,
    /// Takes orders and works shifts.
    Employee,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Employee => write!(f, "employee"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "employee" => Ok(Self::Employee),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

/// Stock level classification for warehouse display.
///
/// Negative stock is a legal state (oversell is permitted); it is only
/// surfaced here, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Negative,
    Low,
    Ok,
}

impl StockLevel {
    /// Percentage of nominal stock below which an ingredient counts as low.
    pub const LOW_THRESHOLD_PERCENT: u32 = 25;

    /// Classify `stock` against the `nominal` reference level.
    #[must_use]
    pub fn of(stock: rust_decimal::Decimal, nominal: rust_decimal::Decimal) -> Self {
        if stock < rust_decimal::Decimal::ZERO {
            return Self::Negative;
        }
        let threshold = nominal * rust_decimal::Decimal::from(Self::LOW_THRESHOLD_PERCENT)
            / rust_decimal::Decimal::ONE_HUNDRED;
        if stock < threshold { Self::Low } else { Self::Ok }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_order_status_parse_and_display() {
        for status in [OrderStatus::Open, OrderStatus::Completed, OrderStatus::Cancelled] {
            assert_eq!(status.to_string().parse::<OrderStatus>(), Ok(status));
        }
        assert!("reopened".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_only_open_is_open() {
        assert!(OrderStatus::Open.is_open());
        assert!(!OrderStatus::Completed.is_open());
        assert!(!OrderStatus::Cancelled.is_open());
    }

    #[test]
    fn test_user_role_parse() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("employee".parse::<UserRole>(), Ok(UserRole::Employee));
        assert!("manager".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_stock_level() {
        let nominal = Decimal::from(1000);
        assert_eq!(StockLevel::of(Decimal::from(-5), nominal), StockLevel::Negative);
        assert_eq!(StockLevel::of(Decimal::from(100), nominal), StockLevel::Low);
        assert_eq!(StockLevel::of(Decimal::from(250), nominal), StockLevel::Ok);
        assert_eq!(StockLevel::of(Decimal::ZERO, Decimal::ZERO), StockLevel::Ok);
    }
}
