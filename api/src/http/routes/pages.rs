use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::navigation::{navigate, NavigationView};
use crate::session::SessionContext;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    #[serde(default)]
    pub path: String,
}

// GET /api/pages/resolve?path=/dashboard
pub async fn resolve_page(
    query: web::Query<ResolveQuery>,
    session: SessionContext,
    state: web::Data<AppState>,
) -> impl Responder {
    let navigation = navigate(&query.path, &session, &state.catalog);
    HttpResponse::Ok().json(NavigationView::from(navigation))
}
