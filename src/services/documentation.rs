use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Office Olympics backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::events_stream,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::public::get_catalog,
        crate::routes::public::get_overview,
        crate::routes::public::get_game_results,
        crate::routes::public::get_overall_results,
        crate::routes::public::export_results,
        crate::routes::admin::get_roster,
        crate::routes::admin::replace_roster,
        crate::routes::admin::add_team,
        crate::routes::admin::remove_team,
        crate::routes::admin::add_marshal,
        crate::routes::admin::remove_marshal,
        crate::routes::admin::get_phase,
        crate::routes::admin::start_competition,
        crate::routes::admin::advance_competition,
        crate::routes::admin::reset_competition,
        crate::routes::admin::get_session,
        crate::routes::admin::update_team_input,
        crate::routes::admin::finalize_team,
    ),
    components(
        schemas(
            crate::auth::Role,
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::auth::LoginRequest,
            crate::dto::auth::LoginResponse,
            crate::dto::admin::RosterRequest,
            crate::dto::admin::NameRequest,
            crate::dto::admin::RosterResponse,
            crate::dto::admin::StartCompetitionRequest,
            crate::dto::admin::TeamInputPatch,
            crate::dto::phase::VisiblePhase,
            crate::dto::phase::PhaseSnapshot,
            crate::dto::competition::GameDefinitionDto,
            crate::dto::competition::TeamInputView,
            crate::dto::competition::SessionSnapshot,
            crate::dto::competition::FinalizeResponse,
            crate::dto::competition::TeamResultDto,
            crate::dto::competition::GameRecordDto,
            crate::dto::results::GameStandingDto,
            crate::dto::results::GameResultsResponse,
            crate::dto::results::OverallStandingDto,
            crate::dto::results::OverallResultsResponse,
            crate::dto::results::OverviewStatus,
            crate::dto::results::GameProgressDto,
            crate::dto::results::OverviewResponse,
            crate::dto::sse::NotificationEnvelope,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::CompetitionStartedEvent,
            crate::dto::sse::GameUpdateEvent,
            crate::dto::sse::GameCompletedEvent,
            crate::dto::sse::CompetitionFinishedEvent,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "auth", description = "Session login and logout"),
        (name = "public", description = "Read-only views for marshals and spectators"),
        (name = "admin", description = "Competition setup and operation"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/admin/session/teams/{name}/complete"));
        assert!(paths.contains_key("/public/games/{id}/results"));
        assert!(paths.contains_key("/sse/events"));
        assert_eq!(paths.len(), 21);
    }
}
