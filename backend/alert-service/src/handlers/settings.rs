/// Display preference handlers
use super::ApiResponse;
use crate::error::Result;
use crate::models::SettingsUpdate;
use crate::services::AppContext;
use actix_web::{web, HttpResponse};

/// GET /api/v1/settings
pub async fn get_settings(ctx: web::Data<AppContext>) -> Result<HttpResponse> {
    let settings = ctx.alerts.settings().await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

/// Apply a partial update; the result is persisted before it takes effect
///
/// PUT /api/v1/settings
pub async fn update_settings(
    ctx: web::Data<AppContext>,
    req: web::Json<SettingsUpdate>,
) -> Result<HttpResponse> {
    let settings = ctx.alerts.update_settings(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/settings")
            .route("", web::get().to(get_settings))
            .route("", web::put().to(update_settings)),
    );
}
