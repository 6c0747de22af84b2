use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::error;

use crate::service::handler::AppState;

pub struct HealthController;

impl HealthController {
    pub async fn health(state: web::Data<AppState>) -> HttpResponse {
        match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&state.pool)
            .await
        {
            Ok(_) => HttpResponse::Ok().json(json!({
                "status": "healthy",
                "database": "connected",
            })),
            Err(err) => {
                error!(error = %err, "Health check failed");
                HttpResponse::InternalServerError().json(json!({
                    "status": "unhealthy",
                    "database": "disconnected",
                }))
            }
        }
    }
}
