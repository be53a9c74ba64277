pub mod opinions;

use actix_web::web;

/// Configure API v1 routes. Read-only; mutations go through the board forms.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/opinions", web::get().to(opinions::list))
        .route("/tally", web::get().to(opinions::tally));
}
