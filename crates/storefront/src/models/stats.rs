//! Per-user purchase statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use edujuegos_core::{Price, UserId};

/// Loyalty points awarded per order.
pub const LOYALTY_POINTS_PER_ORDER: i32 = 10;

/// Aggregated purchase history for one user.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: UserId,
    pub total_orders: i32,
    /// Lifetime spend; may exceed the range of a single order total.
    pub total_spent: Decimal,
    pub favorite_products: i32,
    pub last_order_date: Option<DateTime<Utc>>,
    pub average_order_value: Price,
    pub loyalty_points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Loyalty points earned for `total_orders` orders.
#[must_use]
pub const fn loyalty_points(total_orders: i32) -> i32 {
    total_orders.saturating_mul(LOYALTY_POINTS_PER_ORDER)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_lifetime_spend_beyond_single_order_range() {
        let total_spent = Decimal::from_str("150000000.00").unwrap();
        let now = Utc::now();
        let stats = UserStats {
            user_id: UserId::generate(),
            total_orders: 2,
            total_spent,
            favorite_products: 0,
            last_order_date: Some(now),
            average_order_value: Price::average_of(total_spent, 2).unwrap(),
            loyalty_points: loyalty_points(2),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalSpent"], "150000000.00");
        assert_eq!(json["averageOrderValue"], "75000000.00");
        assert_eq!(json["loyaltyPoints"], 20);
    }

    #[test]
    fn test_loyalty_points() {
        assert_eq!(loyalty_points(0), 0);
        assert_eq!(loyalty_points(3), 30);
        assert_eq!(loyalty_points(i32::MAX), i32::MAX);
    }
}
