//! Notification preference types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edujuegos_core::UserId;

/// Which channels a user wants to hear from.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: UserId,
    pub email_notifications: bool,
    pub order_updates: bool,
    pub promotional_emails: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `PUT /api/user/notifications`. Absent fields are left unchanged.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferencesUpdate {
    pub email_notifications: Option<bool>,
    pub order_updates: Option<bool>,
    pub promotional_emails: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub push_notifications: Option<bool>,
}
