use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::http::extract::AuthenticatedUser;
use crate::repository::TransactionRecord;

pub const LOAD_FAILED: &str = "Failed to load your transactions. Please try again.";

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub items: Vec<TransactionRecord>,
    pub total: usize,
}

// GET /api/transactions
// Newest first; the session gate has already turned anonymous callers away
pub async fn list_transactions(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let store = state
        .transactions
        .as_ref()
        .ok_or_else(ApiError::database_unavailable)?;

    let items = store.list_for_user(user.id).await.map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "Failed to load transactions");
        ApiError::ServiceUnavailable {
            details: LOAD_FAILED.to_string(),
        }
    })?;

    Ok(HttpResponse::Ok().json(HistoryResponse {
        total: items.len(),
        items,
    }))
}
