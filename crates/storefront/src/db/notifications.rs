//! Notification preferences repository.

use sqlx::PgPool;

use edujuegos_core::UserId;

use super::RepositoryError;
use crate::models::{NotificationPreferences, NotificationPreferencesUpdate};

const PREFERENCE_COLUMNS: &str = "user_id, email_notifications, order_updates, \
     promotional_emails, sms_notifications, push_notifications, created_at, updated_at";

/// Repository for notification preferences.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification preferences repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's preferences, creating the defaults on first read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_init(
        &self,
        user_id: UserId,
    ) -> Result<NotificationPreferences, RepositoryError> {
        sqlx::query(
            "INSERT INTO user_notification_preferences (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        let prefs = sqlx::query_as::<_, NotificationPreferences>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM user_notification_preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(prefs)
    }

    /// Update the given channels, leaving the rest unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update(
        &self,
        user_id: UserId,
        update: NotificationPreferencesUpdate,
    ) -> Result<NotificationPreferences, RepositoryError> {
        let prefs = sqlx::query_as::<_, NotificationPreferences>(&format!(
            "INSERT INTO user_notification_preferences (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO UPDATE SET \
               email_notifications = COALESCE($2, user_notification_preferences.email_notifications), \
               order_updates = COALESCE($3, user_notification_preferences.order_updates), \
               promotional_emails = COALESCE($4, user_notification_preferences.promotional_emails), \
               sms_notifications = COALESCE($5, user_notification_preferences.sms_notifications), \
               push_notifications = COALESCE($6, user_notification_preferences.push_notifications), \
               updated_at = now() \
             RETURNING {PREFERENCE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(update.email_notifications)
        .bind(update.order_updates)
        .bind(update.promotional_emails)
        .bind(update.sms_notifications)
        .bind(update.push_notifications)
        .fetch_one(self.pool)
        .await?;

        Ok(prefs)
    }
}
