pub mod api_v1;
pub mod board_handlers;
pub mod health;
pub mod ws;

use actix_web::{web, HttpResponse};

const NOT_FOUND_HTML: &str = include_str!("../../templates/errors/404.html");

/// Register every route. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(actix_files::Files::new("/static", "./static"))
        .route("/", web::get().to(board_handlers::index))
        .route("/opinions", web::post().to(board_handlers::submit))
        .route("/opinions/{id}/delete", web::post().to(board_handlers::delete))
        .route("/reconnect", web::post().to(board_handlers::reconnect))
        .route("/ws", web::get().to(ws::ws_connect))
        .route("/health", web::get().to(health::health))
        .service(web::scope("/api/v1").configure(api_v1::configure))
        // Default 404 handler (must be registered last)
        .default_service(web::to(not_found));
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(NOT_FOUND_HTML)
}
