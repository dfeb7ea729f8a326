use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{get, HttpResponse};

use crate::app::SessionLifecycleController;
use crate::domain::error::AppError;
use crate::domain::session::SessionContext;

/// JSON summary of the logged-in account; `401` for anonymous callers.
#[get("/api/me/")]
pub async fn me(
    context: SessionContext,
    controller: Data<Arc<SessionLifecycleController>>,
) -> Result<HttpResponse, AppError> {
    let summary = controller.view_home(&context).await?;
    Ok(HttpResponse::Ok().json(summary))
}
