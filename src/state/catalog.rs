//! Fixed catalog of the five games played, in play order.

/// Seconds awarded to the first three places of a position-based game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionTable([u32; 3]);

impl PositionTable {
    /// Build a table from the base times of 1st, 2nd and 3rd place.
    pub const fn new(first: u32, second: u32, third: u32) -> Self {
        Self([first, second, third])
    }

    /// Base time for a 1-based position, `None` when the position is not ranked.
    pub fn seconds_for(&self, position: u8) -> Option<u32> {
        let index = usize::from(position).checked_sub(1)?;
        self.0.get(index).copied()
    }

    /// Base times from 1st place down.
    pub fn times(&self) -> &[u32] {
        &self.0
    }

    /// Number of ranked places in the table.
    pub const fn places(&self) -> usize {
        self.0.len()
    }
}

/// How raw inputs of a game are turned into elapsed seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringKind {
    /// Teams are ranked by the marshal; each place maps to a fixed time and an
    /// optional creativity bonus is subtracted.
    PositionBased {
        /// Base time per place.
        table: PositionTable,
        /// Seconds subtracted when the bonus is granted.
        bonus_seconds: u32,
    },
    /// The marshal records a stopwatch time; infractions may add a penalty.
    ManualTime {
        /// Seconds added per infraction, when the game has penalties at all.
        penalty_seconds: Option<u32>,
    },
}

impl ScoringKind {
    /// Number of places shown in the per-game results, `None` when every team is ranked.
    pub fn ranked_places(&self) -> Option<usize> {
        match self {
            ScoringKind::PositionBased { table, .. } => Some(table.places()),
            ScoringKind::ManualTime { .. } => None,
        }
    }

    /// Stable label used in API payloads.
    pub fn label(&self) -> &'static str {
        match self {
            ScoringKind::PositionBased { .. } => "position-based",
            ScoringKind::ManualTime { .. } => "manual-time",
        }
    }
}

/// Static description of a game in the competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameDefinition {
    /// Stable key, also used as the `id` of persisted game records.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Rules summary shown to operators and observers.
    pub description: &'static str,
    /// Scoring rules applied to raw inputs.
    pub scoring: ScoringKind,
    /// Advisory time limit in minutes. Never enforced.
    pub max_minutes: u32,
}

/// Advisory per-game limit shared by every catalog entry.
pub const MAX_GAME_MINUTES: u32 = 10;

/// The games in play order. The order is part of the competition rules.
pub static CATALOG: [GameDefinition; 5] = [
    GameDefinition {
        id: "house-of-cards",
        name: "House of Cards",
        description: "Build the tallest card tower - Score based on size + creativity bonus (-15 seconds)",
        scoring: ScoringKind::PositionBased {
            table: PositionTable::new(60, 75, 90),
            bonus_seconds: 15,
        },
        max_minutes: MAX_GAME_MINUTES,
    },
    GameDefinition {
        id: "office-chair-race",
        name: "Office Chair Race",
        description: "Speed racing on office chairs - Penalties: +5 seconds per mishap",
        scoring: ScoringKind::ManualTime {
            penalty_seconds: Some(5),
        },
        max_minutes: MAX_GAME_MINUTES,
    },
    GameDefinition {
        id: "around-the-clock",
        name: "Around the Clock",
        description: "Time-based precision challenge",
        scoring: ScoringKind::ManualTime {
            penalty_seconds: None,
        },
        max_minutes: MAX_GAME_MINUTES,
    },
    GameDefinition {
        id: "pass-the-spud",
        name: "Pass the Spud",
        description: "Team coordination game",
        scoring: ScoringKind::ManualTime {
            penalty_seconds: None,
        },
        max_minutes: MAX_GAME_MINUTES,
    },
    GameDefinition {
        id: "drop-the-ball",
        name: "Skin the snake",
        description: "Precision dropping challenge - FINAL GAME",
        scoring: ScoringKind::ManualTime {
            penalty_seconds: None,
        },
        max_minutes: MAX_GAME_MINUTES,
    },
];

/// Look up a game by its catalog index.
pub fn game_at(index: usize) -> Option<&'static GameDefinition> {
    CATALOG.get(index)
}

/// Look up a game and its index by stable id.
pub fn find_game(id: &str) -> Option<(usize, &'static GameDefinition)> {
    CATALOG.iter().enumerate().find(|(_, game)| game.id == id)
}

/// Number of games in the competition.
pub fn total_games() -> usize {
    CATALOG.len()
}
