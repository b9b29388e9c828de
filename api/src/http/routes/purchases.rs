/// Purchase dialog routes
///
/// Each dialog is addressed by id; every transition answers with the
/// dialog's current snapshot.
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::session::SessionContext;

#[derive(Debug, Deserialize)]
pub struct OpenPurchaseRequest {
    #[serde(alias = "dataId", alias = "data_id")]
    pub listing_id: i64,
}

// POST /api/purchases
pub async fn open_purchase(
    body: web::Json<OpenPurchaseRequest>,
    session: SessionContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let dialog = state
        .purchases
        .open(&state.catalog, body.listing_id, &session)?;
    Ok(HttpResponse::Created().json(dialog))
}

// GET /api/purchases/{id}
pub async fn get_purchase(
    path: web::Path<Uuid>,
    session: SessionContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let dialog = state.purchases.get(path.into_inner(), &session)?;
    Ok(HttpResponse::Ok().json(dialog))
}

// DELETE /api/purchases/{id}
// 409 while a wallet call is pending
pub async fn close_purchase(
    path: web::Path<Uuid>,
    session: SessionContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    state.purchases.close(path.into_inner(), &session)?;
    Ok(HttpResponse::NoContent().finish())
}

// POST /api/purchases/{id}/wallet
pub async fn connect_wallet(
    path: web::Path<Uuid>,
    session: SessionContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let dialog = state
        .purchases
        .connect_wallet(path.into_inner(), &session)
        .await?;
    Ok(HttpResponse::Ok().json(dialog))
}

// POST /api/purchases/{id}/payment
pub async fn pay(
    path: web::Path<Uuid>,
    session: SessionContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let dialog = state.purchases.pay(path.into_inner(), &session).await?;
    Ok(HttpResponse::Ok().json(dialog))
}

// POST /api/purchases/{id}/reset
pub async fn reset_purchase(
    path: web::Path<Uuid>,
    session: SessionContext,
    state: web::Data<AppState>,
) -> Result<impl Responder, ApiError> {
    let dialog = state.purchases.reset(path.into_inner(), &session)?;
    Ok(HttpResponse::Ok().json(dialog))
}
