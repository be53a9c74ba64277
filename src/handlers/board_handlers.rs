use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use crate::auth::csrf;
use crate::auth::session::{set_flash, take_flash};
use crate::auth::validate::validate_opinion_form;
use crate::board::OpinionBoard;
use crate::errors::{AppError, render, render_with_status};
use crate::models::opinion::{CsrfOnlyForm, OpinionForm, OpinionId};
use crate::templates_structs::{BoardTemplate, FormDraft};

pub const SUBMITTED_FLASH: &str = "Opinion submitted successfully!";
pub const SUBMIT_FAILED_ALERT: &str =
    "Your opinion could not be saved. Check your connection and submit again.";

fn page(board: &OpinionBoard, session: &Session, draft: FormDraft) -> BoardTemplate {
    BoardTemplate::build(
        board.snapshot(),
        board.backend_kind(),
        csrf::get_or_create_token(session),
        draft,
    )
}

fn back_to_board() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", "/"))
        .finish()
}

/// GET /
pub async fn index(
    board: web::Data<OpinionBoard>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let mut tmpl = page(&board, &session, FormDraft::default());
    tmpl.flash = take_flash(&session);
    render(tmpl)
}

/// POST /opinions
///
/// Invalid input re-renders the form with inline errors. A store failure
/// re-renders it with a blocking alert, keeping what the student typed.
pub async fn submit(
    board: web::Data<OpinionBoard>,
    session: Session,
    form: web::Form<OpinionForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let valid = match validate_opinion_form(&form) {
        Ok(valid) => valid,
        Err(errors) => {
            let mut tmpl = page(&board, &session, FormDraft::from(&*form));
            tmpl.errors = errors;
            return render(tmpl);
        }
    };

    match board
        .submit(&valid.name, &valid.partner, valid.stance, &valid.opinion)
        .await
    {
        Ok(opinion) => {
            log::info!(
                "Opinion {} submitted ({}) via {} store",
                opinion.id,
                opinion.stance,
                board.backend_kind()
            );
            set_flash(&session, SUBMITTED_FLASH);
            Ok(back_to_board())
        }
        Err(e) => {
            log::error!("Failed to submit opinion: {e}");
            let mut tmpl = page(&board, &session, FormDraft::from(&*form));
            tmpl.alert = Some(SUBMIT_FAILED_ALERT.to_string());
            render_with_status(tmpl, StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// POST /opinions/{id}/delete
///
/// Failures are logged only; the student is sent back to the board either way.
pub async fn delete(
    board: web::Data<OpinionBoard>,
    session: Session,
    path: web::Path<String>,
    form: web::Form<CsrfOnlyForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let id = OpinionId(path.into_inner());
    match board.delete(&id).await {
        Ok(()) => log::info!("Opinion {id} deleted"),
        Err(e) => log::error!("Failed to delete opinion {id}: {e}"),
    }
    Ok(back_to_board())
}

/// POST /reconnect
pub async fn reconnect(
    board: web::Data<OpinionBoard>,
    session: Session,
    form: web::Form<CsrfOnlyForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let board = board.into_inner();
    if let Err(e) = board.remount().await {
        log::error!("Reconnect to {} store failed: {e}", board.backend_kind());
    }
    Ok(back_to_board())
}
