use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
};

use crate::{
    dto::{
        competition::GameDefinitionDto,
        results::{GameResultsResponse, OverallResultsResponse, OverviewResponse},
    },
    error::AppError,
    services::{public_service, report::REPORT_FILE_NAME},
    state::SharedState,
};

/// Public read-only endpoints used by marshals and spectators.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/catalog", get(get_catalog))
        .route("/public/overview", get(get_overview))
        .route("/public/games/{id}/results", get(get_game_results))
        .route("/public/results", get(get_overall_results))
        .route("/public/results/export", get(export_results))
}

#[utoipa::path(
    get,
    path = "/public/catalog",
    tag = "public",
    responses((status = 200, description = "Games in play order", body = [GameDefinitionDto]))
)]
/// Return the five games with their rules and limits.
pub async fn get_catalog() -> Json<Vec<GameDefinitionDto>> {
    Json(public_service::get_catalog())
}

#[utoipa::path(
    get,
    path = "/public/overview",
    tag = "public",
    responses((status = 200, description = "Competition progress", body = OverviewResponse))
)]
/// Return rosters, per-game progress and the overall status.
pub async fn get_overview(State(state): State<SharedState>) -> Json<OverviewResponse> {
    Json(public_service::get_overview(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/games/{id}/results",
    tag = "public",
    params(("id" = String, Path, description = "Stable game id, e.g. `house-of-cards`")),
    responses(
        (status = 200, description = "Ranking of the game", body = GameResultsResponse),
        (status = 404, description = "Unknown game or nothing recorded yet")
    )
)]
/// Return the ranking of one recorded game.
pub async fn get_game_results(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameResultsResponse>, AppError> {
    Ok(Json(public_service::get_game_results(&state, &id).await?))
}

#[utoipa::path(
    get,
    path = "/public/results",
    tag = "public",
    responses((status = 200, description = "Aggregate ranking", body = OverallResultsResponse))
)]
/// Return the aggregate ranking over every recorded game.
pub async fn get_overall_results(State(state): State<SharedState>) -> Json<OverallResultsResponse> {
    Json(public_service::get_overall_results(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/results/export",
    tag = "public",
    responses((status = 200, description = "Printable results page", content_type = "text/html", body = String))
)]
/// Download the aggregate ranking as an HTML page.
pub async fn export_results(State(state): State<SharedState>) -> impl IntoResponse {
    let page = public_service::export_results(&state).await;
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILE_NAME}\""),
            ),
        ],
        page,
    )
}
