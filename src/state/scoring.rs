//! Conversion of raw per-team inputs into comparable elapsed times.

use thiserror::Error;

use crate::state::catalog::{GameDefinition, ScoringKind};

/// Working state recorded for one team during the current game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTeamInput {
    /// Whole minutes of a manual time.
    pub minutes: u32,
    /// Seconds of a manual time (0..=59).
    pub seconds: u32,
    /// Number of infractions.
    pub penalties: u32,
    /// Whether the creativity bonus was granted.
    pub bonus: bool,
    /// Place awarded in a position-based game (1..=3).
    pub position: Option<u8>,
    /// Set by the operator to accept a manual time of exactly 0:00.
    pub confirmed_zero: bool,
    /// Whether the team has been finalized for this game.
    pub completed: bool,
}

/// Partial update of a [`RawTeamInput`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInputPatch {
    /// New minutes of a manual time.
    pub minutes: Option<u32>,
    /// New seconds of a manual time, 0..=59.
    pub seconds: Option<u32>,
    /// New infraction count.
    pub penalties: Option<u32>,
    /// Whether the bonus was earned.
    pub bonus: Option<bool>,
    /// `Some(None)` clears the selected position.
    pub position: Option<Option<u8>>,
    /// Accept a manual time of exactly 0:00.
    pub confirmed_zero: Option<bool>,
}

impl RawTeamInput {
    /// Apply a partial update to the editable fields.
    pub fn apply(&mut self, patch: RawInputPatch) {
        if let Some(minutes) = patch.minutes {
            self.minutes = minutes;
        }
        if let Some(seconds) = patch.seconds {
            self.seconds = seconds;
        }
        if let Some(penalties) = patch.penalties {
            self.penalties = penalties;
        }
        if let Some(bonus) = patch.bonus {
            self.bonus = bonus;
        }
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(confirmed_zero) = patch.confirmed_zero {
            self.confirmed_zero = confirmed_zero;
        }
    }

    fn manual_seconds(&self) -> u32 {
        self.minutes.saturating_mul(60).saturating_add(self.seconds)
    }
}

/// Reasons a raw input cannot be scored yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// Position-based game without a selected place.
    #[error("a position must be selected for this game")]
    MissingPosition,
    /// Selected place outside the ranked places.
    #[error("position {0} is not a ranked place")]
    InvalidPosition(u8),
    /// Manual-time game still at 0:00 without confirmation.
    #[error("a non-zero time must be entered (or 0:00 explicitly confirmed)")]
    MissingTime,
    /// Seconds field outside 0..=59.
    #[error("seconds must be between 0 and 59 (got {0})")]
    InvalidSeconds(u32),
}

/// Compute the elapsed seconds of a team for the given game.
///
/// The result is deterministic and never negative: bonuses saturate at zero.
pub fn compute_elapsed_seconds(
    game: &GameDefinition,
    input: &RawTeamInput,
) -> Result<u32, ScoringError> {
    match game.scoring {
        ScoringKind::PositionBased {
            table,
            bonus_seconds,
        } => {
            let position = input.position.ok_or(ScoringError::MissingPosition)?;
            let base = table
                .seconds_for(position)
                .ok_or(ScoringError::InvalidPosition(position))?;
            if input.bonus {
                Ok(base.saturating_sub(bonus_seconds))
            } else {
                Ok(base)
            }
        }
        ScoringKind::ManualTime { penalty_seconds } => {
            if input.seconds > 59 {
                return Err(ScoringError::InvalidSeconds(input.seconds));
            }
            let base = input.manual_seconds();
            if base == 0 && !input.confirmed_zero {
                return Err(ScoringError::MissingTime);
            }
            let penalty = match penalty_seconds {
                Some(per_infraction) => input.penalties.saturating_mul(per_infraction),
                None => 0,
            };
            Ok(base.saturating_add(penalty))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::catalog::{CATALOG, find_game};

    fn house_of_cards() -> &'static GameDefinition {
        &CATALOG[0]
    }

    fn chair_race() -> &'static GameDefinition {
        find_game("office-chair-race").unwrap().1
    }

    fn placed(position: u8, bonus: bool) -> RawTeamInput {
        RawTeamInput {
            position: Some(position),
            bonus,
            ..Default::default()
        }
    }

    fn timed(minutes: u32, seconds: u32, penalties: u32) -> RawTeamInput {
        RawTeamInput {
            minutes,
            seconds,
            penalties,
            ..Default::default()
        }
    }

    #[test]
    fn position_times_follow_table_and_bonus() {
        let game = house_of_cards();
        assert_eq!(compute_elapsed_seconds(game, &placed(1, true)), Ok(45));
        assert_eq!(compute_elapsed_seconds(game, &placed(2, false)), Ok(75));
        assert_eq!(compute_elapsed_seconds(game, &placed(3, false)), Ok(90));
    }

    #[test]
    fn position_times_are_monotonic_and_bonus_never_increases() {
        let game = house_of_cards();
        for bonus in [false, true] {
            let times: Vec<u32> = (1..=3)
                .map(|p| compute_elapsed_seconds(game, &placed(p, bonus)).unwrap())
                .collect();
            assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
        }
        for position in 1..=3 {
            let plain = compute_elapsed_seconds(game, &placed(position, false)).unwrap();
            let boosted = compute_elapsed_seconds(game, &placed(position, true)).unwrap();
            assert!(boosted < plain || boosted == 0);
        }
    }

    #[test]
    fn bonus_larger_than_base_clamps_to_zero() {
        let game = GameDefinition {
            scoring: ScoringKind::PositionBased {
                table: crate::state::catalog::PositionTable::new(10, 20, 30),
                bonus_seconds: 15,
            },
            ..*house_of_cards()
        };
        assert_eq!(compute_elapsed_seconds(&game, &placed(1, true)), Ok(0));
    }

    #[test]
    fn position_is_required() {
        let game = house_of_cards();
        let input = RawTeamInput {
            bonus: true,
            ..Default::default()
        };
        assert_eq!(
            compute_elapsed_seconds(game, &input),
            Err(ScoringError::MissingPosition)
        );
        assert_eq!(
            compute_elapsed_seconds(game, &placed(4, false)),
            Err(ScoringError::InvalidPosition(4))
        );
    }

    #[test]
    fn chair_race_adds_penalties() {
        assert_eq!(compute_elapsed_seconds(chair_race(), &timed(1, 0, 2)), Ok(70));
    }

    #[test]
    fn each_penalty_adds_exactly_five_seconds() {
        let game = chair_race();
        for penalties in 0..10 {
            let before = compute_elapsed_seconds(game, &timed(2, 13, penalties)).unwrap();
            let after = compute_elapsed_seconds(game, &timed(2, 13, penalties + 1)).unwrap();
            assert_eq!(after - before, 5);
        }
    }

    #[test]
    fn penalties_are_ignored_without_penalty_rule() {
        let (_, game) = find_game("around-the-clock").unwrap();
        assert_eq!(compute_elapsed_seconds(game, &timed(1, 30, 4)), Ok(90));
    }

    #[test]
    fn zero_time_requires_confirmation() {
        let game = chair_race();
        assert_eq!(
            compute_elapsed_seconds(game, &timed(0, 0, 3)),
            Err(ScoringError::MissingTime)
        );

        let confirmed = RawTeamInput {
            confirmed_zero: true,
            ..Default::default()
        };
        assert_eq!(compute_elapsed_seconds(game, &confirmed), Ok(0));
    }

    #[test]
    fn seconds_out_of_range_are_rejected() {
        assert_eq!(
            compute_elapsed_seconds(chair_race(), &timed(1, 60, 0)),
            Err(ScoringError::InvalidSeconds(60))
        );
    }

    #[test]
    fn patch_updates_only_provided_fields() {
        let mut input = timed(1, 10, 0);
        input.apply(RawInputPatch {
            penalties: Some(2),
            position: Some(Some(2)),
            ..Default::default()
        });
        assert_eq!(input.minutes, 1);
        assert_eq!(input.seconds, 10);
        assert_eq!(input.penalties, 2);
        assert_eq!(input.position, Some(2));

        input.apply(RawInputPatch {
            position: Some(None),
            ..Default::default()
        });
        assert_eq!(input.position, None);
    }
}
