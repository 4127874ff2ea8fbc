//! Support ticket types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use edujuegos_core::{TicketId, TicketPriority, TicketReplyId, TicketStatus, TicketType, UserId};

/// A support ticket.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: TicketId,
    /// Requester.
    pub user_id: UserId,
    /// Human-readable number, `TKT-YYYYMMDD-nnnnn`.
    pub ticket_number: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub ticket_type: TicketType,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub assigned_to: Option<UserId>,
    pub resolution: Option<String>,
    pub attachments: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A ticket together with the requester's name and email.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TicketWithRequester {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub ticket: SupportTicket,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// A message in a ticket thread.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TicketReply {
    pub id: TicketReplyId,
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub message: String,
    /// Written by an admin rather than the requester.
    pub is_from_support: bool,
    pub attachments: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    /// Author's display name.
    pub user_name: Option<String>,
}

/// A ticket and its replies in chronological order.
#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: TicketWithRequester,
    pub replies: Vec<TicketReply>,
}

/// Payload for `POST /api/support/tickets`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTicket {
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub subject: String,
    pub description: String,
    #[serde(default)]
    pub priority: Option<TicketPriority>,
}

impl NewTicket {
    /// Require a subject and a description.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message describing the first problem.
    pub fn validate(&self) -> Result<(), String> {
        if self.subject.trim().is_empty() {
            return Err("El asunto es requerido".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("La descripción es requerida".to_string());
        }
        Ok(())
    }
}

/// Payload for `POST /api/support/tickets/{id}/replies`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReply {
    pub message: String,
}

/// Payload for `PUT /api/support/tickets/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStatusUpdate {
    pub status: TicketStatus,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_defaults_priority_to_none() {
        let ticket: NewTicket = serde_json::from_value(serde_json::json!({
            "type": "complaint",
            "subject": "Pedido incompleto",
            "description": "Faltan tarjetas en el kit",
        }))
        .unwrap();
        assert!(ticket.priority.is_none());
        assert!(ticket.validate().is_ok());
    }

    #[test]
    fn test_new_ticket_rejects_blank_subject() {
        let ticket: NewTicket = serde_json::from_value(serde_json::json!({
            "type": "order", "subject": " ", "description": "x",
        }))
        .unwrap();
        assert!(ticket.validate().is_err());
    }

    #[test]
    fn test_status_update_accepts_in_progress() {
        let update: TicketStatusUpdate = serde_json::from_value(serde_json::json!({
            "status": "in-progress",
        }))
        .unwrap();
        assert_eq!(update.status, TicketStatus::InProgress);
    }
}
