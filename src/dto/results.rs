//! Observer-facing rankings and progress.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::phase::VisiblePhase,
    state::results::{GameStanding, OverallStanding, format_clock},
};

/// One line of a per-game ranking.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStandingDto {
    pub position: usize,
    pub team: String,
    pub elapsed_seconds: u32,
    /// `m:ss`
    pub time: String,
}

impl From<GameStanding> for GameStandingDto {
    fn from(standing: GameStanding) -> Self {
        Self {
            position: standing.position,
            time: format_clock(u64::from(standing.elapsed_seconds)),
            team: standing.team_name,
            elapsed_seconds: standing.elapsed_seconds,
        }
    }
}

/// Ranking of one recorded game with navigation to its neighbours.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameResultsResponse {
    pub game_id: String,
    pub game_name: String,
    /// 0-based catalog index.
    pub game_index: usize,
    pub scoring: String,
    pub standings: Vec<GameStandingDto>,
    /// Number of teams with a result, ranked or not.
    pub teams_recorded: usize,
    /// Previous recorded game, in play order.
    pub previous_game_id: Option<String>,
    /// Next recorded game, in play order.
    pub next_game_id: Option<String>,
}

/// One line of the aggregate ranking.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverallStandingDto {
    pub position: usize,
    pub team: String,
    pub total_seconds: u64,
    /// `m:ss`
    pub total_time: String,
    pub games_completed: usize,
}

impl From<OverallStanding> for OverallStandingDto {
    fn from(standing: OverallStanding) -> Self {
        Self {
            position: standing.position,
            total_time: format_clock(standing.total_seconds),
            team: standing.team_name,
            total_seconds: standing.total_seconds,
            games_completed: standing.games_completed,
        }
    }
}

/// Aggregate ranking across every recorded game.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverallResultsResponse {
    pub phase: VisiblePhase,
    pub games_recorded: usize,
    pub total_games: usize,
    pub standings: Vec<OverallStandingDto>,
}

/// Coarse competition status shown on the observer dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OverviewStatus {
    /// No game has a result yet.
    Waiting,
    InProgress,
    /// Every game is complete.
    Complete,
}

/// Completion count of one catalog game.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameProgressDto {
    pub game_id: String,
    pub game_name: String,
    pub completed_teams: usize,
    pub total_teams: usize,
    /// A record exists for the game.
    pub recorded: bool,
}

/// Observer dashboard summary.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub status: OverviewStatus,
    pub phase: VisiblePhase,
    pub current_game_index: Option<usize>,
    pub teams: Vec<String>,
    pub marshals: Vec<String>,
    pub games_recorded: usize,
    pub total_games: usize,
    pub games: Vec<GameProgressDto>,
}
