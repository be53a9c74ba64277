use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::board::{ConnectionStatus, OpinionBoard};
use crate::errors::AppError;
use crate::models::opinion::{Opinion, Stance, Tally};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub stance: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OpinionListResponse {
    pub items: Vec<Opinion>,
    pub total: usize,
    pub tally: Tally,
    pub status: ConnectionStatus,
}

/// GET /api/v1/opinions - Current feed, newest first.
/// Query params: stance (optional, one of the three tags)
pub async fn list(
    board: web::Data<OpinionBoard>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let stance = match query.stance.as_deref() {
        Some(s) => Some(
            s.parse::<Stance>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        ),
        None => None,
    };

    let snapshot = board.snapshot();
    let items: Vec<Opinion> = match stance {
        Some(stance) => snapshot
            .opinions
            .into_iter()
            .filter(|o| o.stance == stance)
            .collect(),
        None => snapshot.opinions,
    };

    Ok(HttpResponse::Ok().json(OpinionListResponse {
        total: items.len(),
        items,
        tally: snapshot.tally,
        status: snapshot.status,
    }))
}

/// GET /api/v1/tally
pub async fn tally(board: web::Data<OpinionBoard>) -> HttpResponse {
    HttpResponse::Ok().json(board.tally())
}
