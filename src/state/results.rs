//! Per-game and aggregate rankings.
//!
//! Both views sort ascending by time with registration order as the
//! tie-break, and assign 1-based positions.

use crate::state::{catalog::GameDefinition, records::GameRecord};

/// One line of a per-game ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStanding {
    /// 1-based rank.
    pub position: usize,
    /// Team name.
    pub team_name: String,
    /// Elapsed time recorded for the game.
    pub elapsed_seconds: u32,
}

/// One line of the aggregate ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallStanding {
    /// 1-based rank.
    pub position: usize,
    /// Team name.
    pub team_name: String,
    /// Sum of elapsed times over every recorded game.
    pub total_seconds: u64,
    /// Number of games with a result for the team.
    pub games_completed: usize,
}

/// Rank the teams of a game record.
///
/// Position-based games only rank their scored places; the other teams keep
/// their results but are left out of the ranking.
pub fn game_ranking(
    record: &GameRecord,
    definition: &GameDefinition,
    teams: &[String],
) -> Vec<GameStanding> {
    let mut entries: Vec<(usize, &str, u32)> = record
        .results
        .values()
        .filter_map(|result| {
            let order = registration_order(teams, &result.team_name)?;
            Some((order, result.team_name.as_str(), result.elapsed_seconds))
        })
        .collect();

    entries.sort_by_key(|(order, _, elapsed)| (*elapsed, *order));

    if let Some(places) = definition.scoring.ranked_places() {
        entries.truncate(places);
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(rank, (_, team_name, elapsed_seconds))| GameStanding {
            position: rank + 1,
            team_name: team_name.to_string(),
            elapsed_seconds,
        })
        .collect()
}

/// Rank every registered team by total time over all records.
///
/// A team missing from a record contributes nothing for that game.
pub fn overall_ranking(teams: &[String], records: &[GameRecord]) -> Vec<OverallStanding> {
    let mut totals: Vec<(String, u64, usize)> = teams
        .iter()
        .map(|team| {
            records
                .iter()
                .filter_map(|record| record.result_for(team))
                .fold((team.clone(), 0u64, 0usize), |(name, total, count), result| {
                    (name, total + u64::from(result.elapsed_seconds), count + 1)
                })
        })
        .collect();

    // stable: equal totals keep registration order
    totals.sort_by_key(|(_, total, _)| *total);

    totals
        .into_iter()
        .enumerate()
        .map(|(rank, (team_name, total_seconds, games_completed))| OverallStanding {
            position: rank + 1,
            team_name,
            total_seconds,
            games_completed,
        })
        .collect()
}

/// Render seconds as `m:ss`.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn registration_order(teams: &[String], name: &str) -> Option<usize> {
    teams.iter().position(|team| team == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        catalog::{CATALOG, find_game},
        records::FinalizedTeamResult,
    };

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    fn record_with(definition: &GameDefinition, results: &[(&str, u32)]) -> GameRecord {
        let mut record = GameRecord::new(definition);
        for (team, seconds) in results {
            record.insert_once(FinalizedTeamResult {
                team_name: team.to_string(),
                elapsed_seconds: *seconds,
                completed_at: None,
            });
        }
        record
    }

    #[test]
    fn manual_time_game_ranks_ascending() {
        let teams = names(&["Alpha", "Beta", "Gamma"]);
        let (_, game) = find_game("around-the-clock").unwrap();
        let record = record_with(game, &[("Alpha", 120), ("Beta", 90), ("Gamma", 105)]);

        let ranking = game_ranking(&record, game, &teams);
        let order: Vec<_> = ranking
            .iter()
            .map(|s| (s.position, s.team_name.as_str(), s.elapsed_seconds))
            .collect();
        assert_eq!(
            order,
            vec![(1, "Beta", 90), (2, "Gamma", 105), (3, "Alpha", 120)]
        );
    }

    #[test]
    fn ties_follow_registration_order() {
        let teams = names(&["Alpha", "Beta", "Gamma"]);
        let game = &CATALOG[2];
        // completion order differs from registration order
        let record = record_with(game, &[("Gamma", 60), ("Beta", 60), ("Alpha", 61)]);

        let ranking = game_ranking(&record, game, &teams);
        assert_eq!(ranking[0].team_name, "Beta");
        assert_eq!(ranking[1].team_name, "Gamma");
        assert_eq!(ranking[2].team_name, "Alpha");
    }

    #[test]
    fn position_based_game_ranks_top_three_only() {
        let teams = names(&["Alpha", "Beta", "Gamma", "Delta"]);
        let game = &CATALOG[0];
        let record = record_with(
            game,
            &[("Alpha", 45), ("Beta", 75), ("Gamma", 90), ("Delta", 90)],
        );

        let ranking = game_ranking(&record, game, &teams);
        let order: Vec<_> = ranking
            .iter()
            .map(|s| (s.team_name.as_str(), s.elapsed_seconds))
            .collect();
        assert_eq!(order, vec![("Alpha", 45), ("Beta", 75), ("Gamma", 90)]);
    }

    #[test]
    fn partial_participation_counts_only_recorded_games() {
        let teams = names(&["Alpha", "Delta"]);
        let records: Vec<GameRecord> = CATALOG
            .iter()
            .enumerate()
            .map(|(index, game)| {
                let mut results = vec![("Alpha", 100)];
                if matches!(index, 0 | 1 | 3) {
                    results.push(("Delta", 10 * (index as u32 + 1)));
                }
                record_with(game, &results)
            })
            .collect();

        let ranking = overall_ranking(&teams, &records);
        let delta = ranking.iter().find(|s| s.team_name == "Delta").unwrap();
        assert_eq!(delta.games_completed, 3);
        assert_eq!(delta.total_seconds, 10 + 20 + 40);
        assert_eq!(delta.position, 1);

        let alpha = ranking.iter().find(|s| s.team_name == "Alpha").unwrap();
        assert_eq!(alpha.games_completed, 5);
        assert_eq!(alpha.total_seconds, 500);
    }

    #[test]
    fn aggregate_is_consistent_with_records() {
        let teams = names(&["Alpha", "Beta", "Gamma"]);
        let records = vec![
            record_with(&CATALOG[1], &[("Alpha", 70), ("Beta", 70), ("Gamma", 50)]),
            record_with(&CATALOG[2], &[("Beta", 30), ("Alpha", 30)]),
        ];

        let ranking = overall_ranking(&teams, &records);
        let completed: usize = ranking.iter().map(|s| s.games_completed).sum();
        let recorded: usize = records.iter().map(|r| r.results.len()).sum();
        assert_eq!(completed, recorded);

        assert!(
            ranking
                .windows(2)
                .all(|pair| pair[0].total_seconds <= pair[1].total_seconds)
        );
        // Alpha and Beta tie on 100; Alpha registered first.
        let order: Vec<_> = ranking.iter().map(|s| s.team_name.as_str()).collect();
        assert_eq!(order, vec!["Gamma", "Alpha", "Beta"]);
        assert_eq!(
            ranking.iter().map(|s| s.position).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn clock_format_pads_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(70), "1:10");
        assert_eq!(format_clock(605), "10:05");
    }
}
