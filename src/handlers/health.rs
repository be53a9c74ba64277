use actix_web::{web, HttpResponse};

use crate::board::OpinionBoard;

/// GET /health
pub async fn health(board: web::Data<OpinionBoard>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "backend": board.backend_kind(),
        "feed": board.status(),
        "listeners": board.hub().listener_count(),
    }))
}
