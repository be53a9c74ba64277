use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use opinion_drop::board::{Backend, FeedHub, OpinionBoard};
use opinion_drop::config::{AppConfig, BackendKind};
use opinion_drop::store::{LocalSlot, MemoryOpinionStore, PgOpinionStore};
use opinion_drop::{db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {e}");
        std::io::Error::other(e)
    })?;

    let backend = match config.backend {
        BackendKind::Local => {
            let slot = LocalSlot::in_dir(&config.data_dir);
            log::info!("Using local opinion slot at {}", slot.path().display());
            Backend::Local(slot)
        }
        BackendKind::Memory => {
            log::info!("Using in-process live opinion store");
            Backend::Live(Arc::new(MemoryOpinionStore::new()))
        }
        BackendKind::Live => {
            // from_env guarantees DATABASE_URL for the live backend
            let url = config.database_url.as_deref().unwrap_or_default();
            let pool = db::init_pool(url).await.map_err(std::io::Error::other)?;
            db::run_migrations(&pool).await.map_err(std::io::Error::other)?;
            log::info!("Using shared PostgreSQL opinion store");
            Backend::Live(Arc::new(PgOpinionStore::new(pool)))
        }
    };

    let board = OpinionBoard::new(backend, FeedHub::new());
    if let Err(e) = board.mount().await {
        if config.backend == BackendKind::Local {
            // Refuse to start rather than overwrite an unreadable slot.
            log::error!("Could not load local opinions: {e}");
            return Err(std::io::Error::other(e));
        }
        log::warn!("Starting with live feed disconnected: {e}");
    }

    // Session key signs the CSRF/flash cookie; a generated one loses sessions on restart.
    let secret_key = match &config.session_key {
        Some(val) => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        None => {
            log::warn!("No usable SESSION_KEY set, generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    log::info!("Starting server at http://{}", config.bind_addr);

    let app_board = board.clone();
    let server = HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::from(app_board.clone()))
            .configure(handlers::configure)
    })
    .bind(&config.bind_addr)?
    .run();

    let result = server.await;
    board.unmount();
    result
}
