use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use serde::Serialize;
use sha1::{Digest, Sha1};

use crate::app_state::AppState;
use crate::catalog::{Listing, ListingQuery, SellForm};
use crate::errors::ApiError;
use crate::http::extract::AuthenticatedUser;
use crate::navigation::Page;
use crate::repository::ListingRecord;
use crate::session::SessionContext;

#[derive(Debug, Serialize)]
pub struct ListResponse<'a> {
    pub items: Vec<&'a Listing>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse<'a> {
    #[serde(flatten)]
    pub listing: &'a Listing,
    pub already_purchased: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct MineResponse {
    pub items: Vec<ListingRecord>,
    pub total: usize,
}

// Weak ETag over the serialized body
fn compute_etag(body: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(body);
    format!("W/\"{:x}\"", hasher.finalize())
}

fn if_none_match(req: &HttpRequest, etag: &str) -> bool {
    req.headers()
        .get(header::IF_NONE_MATCH)
        .and_then(|h| h.to_str().ok())
        .map(|value| value.split(',').any(|candidate| candidate.trim() == etag))
        .unwrap_or(false)
}

// GET /api/listings?q=...&category=...
pub async fn list_listings(
    req: HttpRequest,
    query: web::Query<ListingQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let items = state.catalog.filter(&query);
    let response = ListResponse {
        total: items.len(),
        items,
    };

    let body = serde_json::to_vec(&response).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize listings");
        ApiError::Internal {
            reason: "Serialization failed".to_string(),
        }
    })?;
    let etag = compute_etag(&body);

    if if_none_match(&req, &etag) {
        tracing::debug!(etag = %etag, "ETag matched, returning 304");
        return Ok(HttpResponse::NotModified()
            .insert_header((header::ETAG, etag))
            .finish());
    }

    Ok(HttpResponse::Ok()
        .insert_header((header::ETAG, etag))
        .content_type("application/json")
        .body(body))
}

// GET /api/listings/categories
pub async fn list_categories(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.catalog.categories())
}

// GET /api/listings/{id}
pub async fn get_listing(
    path: web::Path<i64>,
    session: SessionContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let id = path.into_inner();
    let listing = state.catalog.get(id).ok_or_else(|| ApiError::NotFound {
        resource: "listing".to_string(),
    })?;

    // Best effort: a failed lookup just shows the buy button
    let already_purchased = match (session.user_id(), &state.transactions) {
        (Some(user_id), Some(store)) => match store.has_purchased(user_id, id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, listing_id = id, "Purchase lookup failed");
                false
            }
        },
        _ => false,
    };

    Ok(HttpResponse::Ok().json(DetailResponse {
        listing,
        already_purchased,
    }))
}

// POST /api/listings
pub async fn create_listing(
    user: AuthenticatedUser,
    form: web::Json<SellForm>,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let provider = user.email.as_deref().unwrap_or("Unknown provider");
    let listing = form.into_inner().into_listing(user.id, provider)?;

    let store = state
        .listings
        .as_ref()
        .ok_or_else(ApiError::database_unavailable)?;

    let id = store.insert(listing).await.map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "Failed to create listing");
        ApiError::Internal {
            reason: "Failed to create listing".to_string(),
        }
    })?;

    tracing::info!(listing_id = id, user_id = %user.id, "Listing created");
    Ok(HttpResponse::Created().json(CreatedResponse {
        id,
        redirect: Page::Dashboard.path(),
    }))
}

// GET /api/listings/mine
pub async fn my_listings(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let store = state
        .listings
        .as_ref()
        .ok_or_else(ApiError::database_unavailable)?;

    let items = store.list_by_provider(user.id).await.map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "Failed to list own listings");
        ApiError::Internal {
            reason: "Database query failed".to_string(),
        }
    })?;

    Ok(HttpResponse::Ok().json(MineResponse {
        total: items.len(),
        items,
    }))
}
