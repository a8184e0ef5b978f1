use std::time::SystemTime;

use indexmap::IndexMap;

use crate::state::catalog::GameDefinition;

/// Immutable outcome of a team for one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTeamResult {
    /// Team the result belongs to.
    pub team_name: String,
    /// Canonical elapsed time in seconds.
    pub elapsed_seconds: u32,
    /// When the team was finalized. Unknown for results restored from storage.
    pub completed_at: Option<SystemTime>,
}

/// Results gathered for one game, keyed by team name in completion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    /// Catalog id of the game.
    pub game_id: String,
    /// Display name of the game.
    pub game_name: String,
    /// Finalized results; entries are only ever added.
    pub results: IndexMap<String, FinalizedTeamResult>,
}

impl GameRecord {
    /// Start an empty record for the given game.
    pub fn new(game: &GameDefinition) -> Self {
        Self {
            game_id: game.id.to_string(),
            game_name: game.name.to_string(),
            results: IndexMap::new(),
        }
    }

    /// Insert a result unless the team already has one.
    ///
    /// Returns the stored result, which is the pre-existing one when the team
    /// was already recorded.
    pub fn insert_once(&mut self, result: FinalizedTeamResult) -> &FinalizedTeamResult {
        self.results
            .entry(result.team_name.clone())
            .or_insert(result)
    }

    /// Result recorded for a team, if any.
    pub fn result_for(&self, team: &str) -> Option<&FinalizedTeamResult> {
        self.results.get(team)
    }

    /// Whether every registered team has a result.
    pub fn is_complete(&self, teams: &[String]) -> bool {
        teams.iter().all(|team| self.results.contains_key(team))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog::CATALOG;

    fn result(team: &str, seconds: u32) -> FinalizedTeamResult {
        FinalizedTeamResult {
            team_name: team.into(),
            elapsed_seconds: seconds,
            completed_at: None,
        }
    }

    #[test]
    fn insert_once_keeps_first_result() {
        let mut record = GameRecord::new(&CATALOG[1]);
        record.insert_once(result("Alpha", 70));
        let stored = record.insert_once(result("Alpha", 10)).clone();
        assert_eq!(stored.elapsed_seconds, 70);
        assert_eq!(record.results.len(), 1);
    }

    #[test]
    fn completeness_tracks_roster() {
        let teams = vec!["Alpha".to_string(), "Beta".to_string()];
        let mut record = GameRecord::new(&CATALOG[1]);
        record.insert_once(result("Alpha", 70));
        assert!(!record.is_complete(&teams));
        record.insert_once(result("Beta", 80));
        assert!(record.is_complete(&teams));
    }
}
