//! Support ticket repository.

use sqlx::PgPool;

use edujuegos_core::{TicketId, TicketPriority, TicketStatus, UserId};

use super::RepositoryError;
use crate::models::{NewTicket, SupportTicket, TicketReply, TicketStatusUpdate, TicketWithRequester};

const TICKET_COLUMNS: &str = "id, user_id, ticket_number, type, subject, description, status, \
     priority, assigned_to, resolution, attachments, created_at, updated_at, resolved_at";

const TICKET_WITH_REQUESTER: &str = "SELECT t.id, t.user_id, t.ticket_number, t.type, \
     t.subject, t.description, t.status, t.priority, t.assigned_to, t.resolution, \
     t.attachments, t.created_at, t.updated_at, t.resolved_at, \
     u.name AS user_name, u.email AS user_email \
     FROM support_tickets t LEFT JOIN users u ON u.id = t.user_id";

/// Repository for support ticket database operations.
pub struct SupportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SupportRepository<'a> {
    /// Create a new support repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Tickets newest first, optionally limited to one requester.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        requester: Option<UserId>,
    ) -> Result<Vec<TicketWithRequester>, RepositoryError> {
        let tickets = sqlx::query_as::<_, TicketWithRequester>(&format!(
            "{TICKET_WITH_REQUESTER} WHERE ($1::UUID IS NULL OR t.user_id = $1) \
             ORDER BY t.created_at DESC"
        ))
        .bind(requester)
        .fetch_all(self.pool)
        .await?;

        Ok(tickets)
    }

    /// Get a ticket with its requester.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: TicketId) -> Result<Option<TicketWithRequester>, RepositoryError> {
        let ticket = sqlx::query_as::<_, TicketWithRequester>(&format!(
            "{TICKET_WITH_REQUESTER} WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(ticket)
    }

    /// Open a ticket. The ticket number is assigned by the database.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        ticket: &NewTicket,
    ) -> Result<SupportTicket, RepositoryError> {
        let created = sqlx::query_as::<_, SupportTicket>(&format!(
            "INSERT INTO support_tickets (user_id, type, subject, description, priority) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {TICKET_COLUMNS}"
        ))
        .bind(user_id)
        .bind(ticket.ticket_type)
        .bind(ticket.subject.trim())
        .bind(ticket.description.trim())
        .bind(ticket.priority.unwrap_or(TicketPriority::Medium))
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Change a ticket's status. Moving to `resolved` stamps `resolved_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket does not exist.
    pub async fn update_status(
        &self,
        id: TicketId,
        update: &TicketStatusUpdate,
    ) -> Result<SupportTicket, RepositoryError> {
        sqlx::query_as::<_, SupportTicket>(&format!(
            "UPDATE support_tickets SET status = $2, \
               resolution = COALESCE($3, resolution), \
               assigned_to = COALESCE($4, assigned_to), \
               resolved_at = CASE WHEN $2 = $5 THEN now() ELSE resolved_at END, \
               updated_at = now() \
             WHERE id = $1 RETURNING {TICKET_COLUMNS}"
        ))
        .bind(id)
        .bind(update.status)
        .bind(update.resolution.as_deref())
        .bind(update.assigned_to)
        .bind(TicketStatus::Resolved)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Replies to a ticket, oldest first, with author names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn replies(&self, ticket_id: TicketId) -> Result<Vec<TicketReply>, RepositoryError> {
        let replies = sqlx::query_as::<_, TicketReply>(
            "SELECT r.id, r.ticket_id, r.user_id, r.message, r.is_from_support, r.attachments, \
                    r.created_at, u.name AS user_name \
             FROM support_ticket_replies r LEFT JOIN users u ON u.id = r.user_id \
             WHERE r.ticket_id = $1 ORDER BY r.created_at, r.id",
        )
        .bind(ticket_id)
        .fetch_all(self.pool)
        .await?;

        Ok(replies)
    }

    /// Add a reply and touch the ticket's `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the ticket does not exist.
    pub async fn add_reply(
        &self,
        ticket_id: TicketId,
        author: UserId,
        message: &str,
        from_support: bool,
    ) -> Result<TicketReply, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE support_tickets SET updated_at = now() WHERE id = $1")
            .bind(ticket_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let reply = sqlx::query_as::<_, TicketReply>(
            "WITH inserted AS ( \
               INSERT INTO support_ticket_replies (ticket_id, user_id, message, is_from_support) \
               VALUES ($1, $2, $3, $4) \
               RETURNING id, ticket_id, user_id, message, is_from_support, attachments, created_at \
             ) \
             SELECT i.*, u.name AS user_name FROM inserted i LEFT JOIN users u ON u.id = i.user_id",
        )
        .bind(ticket_id)
        .bind(author)
        .bind(message.trim())
        .bind(from_support)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(reply)
    }
}
