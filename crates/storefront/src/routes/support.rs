//! Support ticket route handlers.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use edujuegos_core::TicketId;

use crate::db::{RepositoryError, SupportRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::{
    NewReply, NewTicket, SupportTicket, TicketDetail, TicketReply, TicketStatusUpdate,
    TicketWithRequester, User,
};
use crate::routes::{ApiJson, ApiPath};
use crate::state::AppState;

const TICKET_NOT_FOUND: &str = "Ticket no encontrado";

fn ticket_not_found() -> AppError {
    AppError::NotFound(TICKET_NOT_FOUND.to_string())
}

fn map_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => ticket_not_found(),
        other => AppError::Database(other),
    }
}

/// Load a ticket the user may see. Other users' tickets read as absent.
async fn visible_ticket(
    repo: &SupportRepository<'_>,
    user: &User,
    id: TicketId,
) -> Result<TicketWithRequester> {
    repo.get(id)
        .await?
        .filter(|t| user.is_admin() || t.ticket.user_id == user.id)
        .ok_or_else(ticket_not_found)
}

/// List tickets: all for admins, the caller's own otherwise.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<TicketWithRequester>>> {
    let requester = (!user.is_admin()).then_some(user.id);
    let tickets = SupportRepository::new(state.pool()).list(requester).await?;
    Ok(Json(tickets))
}

/// Open a ticket.
#[instrument(skip(state, user, ticket), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(ticket): ApiJson<NewTicket>,
) -> Result<(StatusCode, Json<SupportTicket>)> {
    ticket.validate().map_err(AppError::BadRequest)?;

    let created = SupportRepository::new(state.pool())
        .create(user.id, &ticket)
        .await?;

    tracing::info!(
        ticket_id = %created.id,
        ticket_number = %created.ticket_number,
        "Support ticket opened"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// Ticket with its reply thread.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<TicketId>,
) -> Result<Json<TicketDetail>> {
    let repo = SupportRepository::new(state.pool());
    let ticket = visible_ticket(&repo, &user, id).await?;
    let replies = repo.replies(id).await?;
    Ok(Json(TicketDetail { ticket, replies }))
}

/// Replies in posting order.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn replies(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<TicketId>,
) -> Result<Json<Vec<TicketReply>>> {
    let repo = SupportRepository::new(state.pool());
    visible_ticket(&repo, &user, id).await?;
    Ok(Json(repo.replies(id).await?))
}

/// Reply to a ticket. Admin replies are flagged as coming from support.
#[instrument(skip(state, user, reply), fields(user_id = %user.id))]
pub async fn reply(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiPath(id): ApiPath<TicketId>,
    ApiJson(reply): ApiJson<NewReply>,
) -> Result<(StatusCode, Json<TicketReply>)> {
    if reply.message.trim().is_empty() {
        return Err(AppError::BadRequest("El mensaje es requerido".to_string()));
    }

    let repo = SupportRepository::new(state.pool());
    visible_ticket(&repo, &user, id).await?;

    let created = repo
        .add_reply(id, user.id, &reply.message, user.is_admin())
        .await
        .map_err(map_not_found)?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Change a ticket's status, resolution or assignee.
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<TicketId>,
    ApiJson(update): ApiJson<TicketStatusUpdate>,
) -> Result<Json<SupportTicket>> {
    let ticket = SupportRepository::new(state.pool())
        .update_status(id, &update)
        .await
        .map_err(map_not_found)?;

    tracing::info!(ticket_id = %ticket.id, status = %ticket.status, "Ticket status updated");
    Ok(Json(ticket))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    use super::*;
    use crate::routes::tests::send;

    #[test]
    fn test_repository_not_found_maps_to_ticket_message() {
        let err = map_not_found(RepositoryError::NotFound);
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == TICKET_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_tickets_require_token() {
        let request = Request::builder()
            .uri("/api/support/tickets")
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(request).await.status(), StatusCode::UNAUTHORIZED);
    }
}
