/// Dashboard summary route
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::http::extract::AuthenticatedUser;
use crate::http::routes::transactions::LOAD_FAILED;
use crate::repository::TransactionRecord;

const RECENT_LIMIT: usize = 3;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub email: Option<String>,
    pub purchases: usize,
    pub recent_transactions: Vec<TransactionRecord>,
    pub listings: usize,
}

// GET /api/dashboard
pub async fn dashboard(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let store = state
        .transactions
        .as_ref()
        .ok_or_else(ApiError::database_unavailable)?;

    let mut history = store.list_for_user(user.id).await.map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "Failed to load dashboard transactions");
        ApiError::ServiceUnavailable {
            details: LOAD_FAILED.to_string(),
        }
    })?;

    // Listing count is best effort
    let listings = match &state.listings {
        Some(listings) => match listings.list_by_provider(user.id).await {
            Ok(rows) => rows.len(),
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user.id, "Failed to count own listings");
                0
            }
        },
        None => 0,
    };

    let purchases = history.len();
    history.truncate(RECENT_LIMIT);

    Ok(HttpResponse::Ok().json(DashboardResponse {
        email: user.email,
        purchases,
        recent_transactions: history,
        listings,
    }))
}
