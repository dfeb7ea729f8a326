use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{get, HttpResponse, Responder};

use crate::infrastructure::config::Config;

#[get("/health/")]
pub async fn health(config: Data<Arc<Config>>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "version": config.version,
        "environment": config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
