//! Service helpers that expose read-only projections of the competition to
//! marshals and other observers. None of them touch storage.

use std::time::SystemTime;

use time::OffsetDateTime;

use crate::{
    dto::{
        competition::GameDefinitionDto,
        results::{
            GameProgressDto, GameResultsResponse, GameStandingDto, OverallResultsResponse,
            OverallStandingDto, OverviewResponse, OverviewStatus,
        },
    },
    error::ServiceError,
    services::report,
    state::{
        SharedState,
        catalog::{self, CATALOG},
        competition::CompetitionState,
        results::{game_ranking, overall_ranking},
        sequencer::CompetitionPhase,
    },
};

/// The five games in play order.
pub fn get_catalog() -> Vec<GameDefinitionDto> {
    CATALOG.iter().map(GameDefinitionDto::from).collect()
}

/// Dashboard summary: rosters, progress per game and overall status.
pub async fn get_overview(state: &SharedState) -> OverviewResponse {
    state.read_competition(build_overview).await
}

fn build_overview(competition: &CompetitionState) -> OverviewResponse {
    let teams = competition.roster().teams();
    let records = competition.records();
    let total_games = catalog::total_games();

    let games = CATALOG
        .iter()
        .map(|game| {
            let record = competition.record(game.id);
            GameProgressDto {
                game_id: game.id.to_string(),
                game_name: game.name.to_string(),
                completed_teams: record.map_or(0, |record| record.results.len()),
                total_teams: teams.len(),
                recorded: record.is_some(),
            }
        })
        .collect();

    let every_game_done = records.len() == total_games
        && records.iter().all(|record| record.is_complete(teams));
    let status = if competition.phase() == CompetitionPhase::Finished || every_game_done {
        OverviewStatus::Complete
    } else if records.is_empty() {
        OverviewStatus::Waiting
    } else {
        OverviewStatus::InProgress
    };

    OverviewResponse {
        status,
        phase: competition.phase().into(),
        current_game_index: competition.phase().game_index(),
        teams: teams.to_vec(),
        marshals: competition.roster().marshals().to_vec(),
        games_recorded: records.len(),
        total_games,
        games,
    }
}

/// Ranking of one recorded game with links to its recorded neighbours.
pub async fn get_game_results(
    state: &SharedState,
    game_id: &str,
) -> Result<GameResultsResponse, ServiceError> {
    let (game_index, definition) = catalog::find_game(game_id)
        .ok_or_else(|| ServiceError::NotFound(format!("game `{game_id}` does not exist")))?;

    state
        .read_competition(|competition| {
            let records = competition.records();
            let position = records
                .iter()
                .position(|record| record.game_id == definition.id)
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("no results recorded for game `{game_id}`"))
                })?;
            let record = &records[position];

            let standings = game_ranking(record, definition, competition.roster().teams())
                .into_iter()
                .map(GameStandingDto::from)
                .collect();

            Ok(GameResultsResponse {
                game_id: definition.id.to_string(),
                game_name: definition.name.to_string(),
                game_index,
                scoring: definition.scoring.label().to_string(),
                standings,
                teams_recorded: record.results.len(),
                previous_game_id: position
                    .checked_sub(1)
                    .and_then(|previous| records.get(previous))
                    .map(|record| record.game_id.clone()),
                next_game_id: records.get(position + 1).map(|record| record.game_id.clone()),
            })
        })
        .await
}

/// Aggregate ranking of every registered team.
pub async fn get_overall_results(state: &SharedState) -> OverallResultsResponse {
    state
        .read_competition(|competition| OverallResultsResponse {
            phase: competition.phase().into(),
            games_recorded: competition.records().len(),
            total_games: catalog::total_games(),
            standings: overall_standings(competition),
        })
        .await
}

/// Printable HTML page of the aggregate ranking.
pub async fn export_results(state: &SharedState) -> String {
    let standings = state.read_competition(overall_standings).await;
    let today = OffsetDateTime::from(SystemTime::now()).date();
    report::render_results(&standings, today)
}

fn overall_standings(competition: &CompetitionState) -> Vec<OverallStandingDto> {
    overall_ranking(competition.roster().teams(), competition.records())
        .into_iter()
        .map(OverallStandingDto::from)
        .collect()
}
