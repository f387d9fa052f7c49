/// Alert lifecycle handlers
use super::{ApiResponse, CountResponse};
use crate::error::{AppError, Result};
use crate::models::NewAlert;
use crate::services::AppContext;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// List visible and pending alerts
///
/// GET /api/v1/alerts
pub async fn list_alerts(ctx: web::Data<AppContext>) -> Result<HttpResponse> {
    let snapshot = ctx.alerts.snapshot().await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(snapshot)))
}

/// Show a new alert, or queue it when the toast slots are full
///
/// POST /api/v1/alerts
pub async fn create_alert(
    ctx: web::Data<AppContext>,
    req: web::Json<NewAlert>,
) -> Result<HttpResponse> {
    let new_alert = req.into_inner();
    if new_alert.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    let alert = ctx.alerts.show_alert(new_alert).await;
    Ok(HttpResponse::Created().json(ApiResponse::ok(alert)))
}

/// Dismiss an alert
///
/// POST /api/v1/alerts/{id}/dismiss
pub async fn dismiss_alert(
    ctx: web::Data<AppContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match ctx.alerts.dismiss(path.into_inner()).await {
        Some(alert) => Ok(HttpResponse::Ok().json(ApiResponse::ok(alert))),
        None => Err(AppError::NotFound),
    }
}

/// Mark an alert as read
///
/// POST /api/v1/alerts/{id}/read
pub async fn mark_as_read(
    ctx: web::Data<AppContext>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    if !ctx.alerts.mark_as_read(id).await {
        return Err(AppError::NotFound);
    }

    match ctx.alerts.get(id).await {
        Some(alert) => Ok(HttpResponse::Ok().json(ApiResponse::ok(alert))),
        // Expired between the two calls
        None => Err(AppError::NotFound),
    }
}

/// POST /api/v1/alerts/read-all
pub async fn mark_all_as_read(ctx: web::Data<AppContext>) -> Result<HttpResponse> {
    let count = ctx.alerts.mark_all_as_read().await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(CountResponse { count })))
}

/// DELETE /api/v1/alerts
pub async fn clear_alerts(ctx: web::Data<AppContext>) -> Result<HttpResponse> {
    let count = ctx.alerts.clear_all().await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(CountResponse { count })))
}

/// Register routes
pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/alerts")
            .route("", web::get().to(list_alerts))
            .route("", web::post().to(create_alert))
            .route("", web::delete().to(clear_alerts))
            .route("/read-all", web::post().to(mark_all_as_read))
            .route("/{id}/dismiss", web::post().to(dismiss_alert))
            .route("/{id}/read", web::post().to(mark_as_read)),
    );
}
