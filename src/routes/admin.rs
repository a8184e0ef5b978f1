use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_valid::Valid;

use crate::{
    auth::Role,
    dto::{
        admin::{
            NameRequest, RosterRequest, RosterResponse, StartCompetitionRequest, TeamInputPatch,
        },
        competition::{FinalizeResponse, SessionSnapshot, TeamInputView},
        phase::PhaseSnapshot,
    },
    error::AppError,
    services::{admin_service, auth_service},
    state::{SharedState, roster::RosterKind},
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints for setting up and running the competition.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/roster", get(get_roster).put(replace_roster))
        .route("/admin/teams", post(add_team))
        .route("/admin/teams/{name}", delete(remove_team))
        .route("/admin/marshals", post(add_marshal))
        .route("/admin/marshals/{name}", delete(remove_marshal))
        .route("/admin/competition", get(get_phase))
        .route("/admin/competition/start", post(start_competition))
        .route("/admin/competition/advance", post(advance_competition))
        .route("/admin/competition/reset", post(reset_competition))
        .route("/admin/session", get(get_session))
        .route("/admin/session/teams/{name}", patch(update_team_input))
        .route("/admin/session/teams/{name}/complete", post(finalize_team))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Current team and marshal rosters.
#[utoipa::path(
    get,
    path = "/admin/roster",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login")),
    responses((status = 200, description = "Current rosters", body = RosterResponse))
)]
pub async fn get_roster(State(state): State<SharedState>) -> Json<RosterResponse> {
    Json(admin_service::get_roster(&state).await)
}

/// Replace both rosters before the competition starts.
#[utoipa::path(
    put,
    path = "/admin/roster",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login")),
    request_body = RosterRequest,
    responses(
        (status = 200, description = "Rosters replaced", body = RosterResponse),
        (status = 400, description = "Blank or duplicate names"),
        (status = 409, description = "Competition already started"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn replace_roster(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RosterRequest>>,
) -> Result<Json<RosterResponse>, AppError> {
    Ok(Json(admin_service::replace_roster(&state, payload).await?))
}

/// Register a team.
#[utoipa::path(
    post,
    path = "/admin/teams",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Team registered", body = RosterResponse),
        (status = 409, description = "Duplicate name or competition already started")
    )
)]
pub async fn add_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<NameRequest>>,
) -> Result<Json<RosterResponse>, AppError> {
    let roster = admin_service::add_member(&state, RosterKind::Teams, &payload.name).await?;
    Ok(Json(roster))
}

/// Unregister a team.
#[utoipa::path(
    delete,
    path = "/admin/teams/{name}",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login"),
        ("name" = String, Path, description = "Team name")
    ),
    responses(
        (status = 200, description = "Team removed", body = RosterResponse),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn remove_team(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<RosterResponse>, AppError> {
    let roster = admin_service::remove_member(&state, RosterKind::Teams, &name).await?;
    Ok(Json(roster))
}

/// Register a marshal.
#[utoipa::path(
    post,
    path = "/admin/marshals",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Marshal registered", body = RosterResponse),
        (status = 409, description = "Duplicate name or competition already started")
    )
)]
pub async fn add_marshal(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<NameRequest>>,
) -> Result<Json<RosterResponse>, AppError> {
    let roster = admin_service::add_member(&state, RosterKind::Marshals, &payload.name).await?;
    Ok(Json(roster))
}

/// Unregister a marshal.
#[utoipa::path(
    delete,
    path = "/admin/marshals/{name}",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login"),
        ("name" = String, Path, description = "Marshal name")
    ),
    responses(
        (status = 200, description = "Marshal removed", body = RosterResponse),
        (status = 404, description = "Unknown marshal")
    )
)]
pub async fn remove_marshal(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<RosterResponse>, AppError> {
    let roster = admin_service::remove_member(&state, RosterKind::Marshals, &name).await?;
    Ok(Json(roster))
}

/// Sequencer position.
#[utoipa::path(
    get,
    path = "/admin/competition",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login")),
    responses((status = 200, description = "Current phase", body = PhaseSnapshot))
)]
pub async fn get_phase(State(state): State<SharedState>) -> Json<PhaseSnapshot> {
    Json(admin_service::phase_snapshot(&state).await)
}

/// Accept the rules and open the first game.
#[utoipa::path(
    post,
    path = "/admin/competition/start",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login")),
    request_body = StartCompetitionRequest,
    responses(
        (status = 200, description = "Competition started", body = PhaseSnapshot),
        (status = 400, description = "Rules not accepted"),
        (status = 409, description = "Rosters incomplete or competition already started"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn start_competition(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartCompetitionRequest>>,
) -> Result<Json<PhaseSnapshot>, AppError> {
    Ok(Json(admin_service::start_competition(&state, payload).await?))
}

/// Move to the next game, or finish after the last one.
#[utoipa::path(
    post,
    path = "/admin/competition/advance",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login")),
    responses(
        (status = 200, description = "Competition advanced", body = PhaseSnapshot),
        (status = 409, description = "Current game incomplete")
    )
)]
pub async fn advance_competition(
    State(state): State<SharedState>,
) -> Result<Json<PhaseSnapshot>, AppError> {
    Ok(Json(admin_service::advance_competition(&state).await?))
}

/// Discard every result and return to setup.
#[utoipa::path(
    post,
    path = "/admin/competition/reset",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login")),
    responses(
        (status = 200, description = "Competition reset", body = PhaseSnapshot),
        (status = 409, description = "Competition not started")
    )
)]
pub async fn reset_competition(
    State(state): State<SharedState>,
) -> Result<Json<PhaseSnapshot>, AppError> {
    Ok(Json(admin_service::reset_competition(&state).await?))
}

/// Working inputs of the game being played.
#[utoipa::path(
    get,
    path = "/admin/session",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login")),
    responses(
        (status = 200, description = "Current session", body = SessionSnapshot),
        (status = 409, description = "No game running")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(admin_service::session_snapshot(&state).await?))
}

/// Partially update a team's raw input.
#[utoipa::path(
    patch,
    path = "/admin/session/teams/{name}",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login"),
        ("name" = String, Path, description = "Team name")
    ),
    request_body = TeamInputPatch,
    responses(
        (status = 200, description = "Input updated", body = TeamInputView),
        (status = 400, description = "Field out of range"),
        (status = 404, description = "Unknown team"),
        (status = 409, description = "Team already completed or no game running")
    )
)]
pub async fn update_team_input(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Valid(Json(payload)): Valid<Json<TeamInputPatch>>,
) -> Result<Json<TeamInputView>, AppError> {
    Ok(Json(
        admin_service::update_team_input(&state, &name, payload).await?,
    ))
}

/// Finalize a team for the current game. Repeated calls are harmless.
#[utoipa::path(
    post,
    path = "/admin/session/teams/{name}/complete",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin session token issued by /auth/login"),
        ("name" = String, Path, description = "Team name")
    ),
    responses(
        (status = 200, description = "Team finalized", body = FinalizeResponse),
        (status = 400, description = "Input cannot be scored yet"),
        (status = 404, description = "Unknown team"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn finalize_team(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<FinalizeResponse>, AppError> {
    Ok(Json(admin_service::finalize_team(&state, &name).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    match auth_service::role_for(&state, provided) {
        Some(Role::Admin) => Ok(next.run(req).await),
        Some(Role::Marshal) => Err(AppError::Unauthorized(
            "token does not grant admin access".into(),
        )),
        None => Err(AppError::Unauthorized("invalid admin token".into())),
    }
}
