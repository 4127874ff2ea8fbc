//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and serialize in camelCase, which is the
//! shape the browser client consumes. Request payloads live next to the
//! rows they create or update.

pub mod admin_config;
pub mod favorite;
pub mod notifications;
pub mod order;
pub mod product;
pub mod stats;
pub mod support;
pub mod user;

pub use admin_config::{
    AdminConfig, AdminConfigInput, AdminConfigValues, AdminConfigView, SmtpSettings,
};
pub use favorite::{Favorite, FavoriteWithProduct};
pub use notifications::{NotificationPreferences, NotificationPreferencesUpdate};
pub use order::{
    NewOrder, NewOrderLine, NewTracking, Order, OrderDetail, OrderItem, OrderStatusUpdate,
    OrderTracking, OrderWithItems,
};
pub use product::{NewProduct, Product, ProductUpdate};
pub use stats::UserStats;
pub use support::{
    NewReply, NewTicket, SupportTicket, TicketDetail, TicketReply, TicketStatusUpdate,
    TicketWithRequester,
};
pub use user::{PublicUser, User};

/// Trim a string and return `None` when nothing is left.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
