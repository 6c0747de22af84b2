use actix_web::web;

use crate::controllers::auth_controller::AuthController;
use crate::controllers::health_controller::HealthController;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/send-otp", web::post().to(AuthController::send_otp))
        .route("/api/verify-otp", web::post().to(AuthController::verify_otp))
        .route("/api/register", web::post().to(AuthController::register))
        .route("/api/login", web::post().to(AuthController::login))
        .route("/api/health", web::get().to(HealthController::health));
}
