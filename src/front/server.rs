//! Handlers not linked to a specific feature

use ntex::web;

use crate::{
    api,
    front::{AppState, errors},
};

/// Return a [UrlNotFound](errors::GatewayError::UrlNotFound) error for urls not defined
pub async fn serve_not_found() -> Result<web::HttpResponse, web::Error> {
    Err(errors::GatewayError::UrlNotFound.into())
}

/// Health check, reports whether a WhatsApp session is open
#[web::get("/")]
pub async fn index(app_state: web::types::State<AppState>) -> Result<impl web::Responder, web::Error> {
    Ok(web::HttpResponse::Ok().json(&api::health::health_report(&app_state.connection)))
}
