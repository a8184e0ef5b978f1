use thiserror::Error;

/// Which of the two name lists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterKind {
    /// Competing teams.
    Teams,
    /// Observing marshals.
    Marshals,
}

impl RosterKind {
    fn label(self) -> &'static str {
        match self {
            RosterKind::Teams => "team",
            RosterKind::Marshals => "marshal",
        }
    }
}

impl std::fmt::Display for RosterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Reasons a roster edit is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// Name is empty once trimmed.
    #[error("{0} name cannot be empty")]
    EmptyName(RosterKind),
    /// Name already registered (case-sensitive).
    #[error("{kind} `{name}` is already registered")]
    Duplicate { kind: RosterKind, name: String },
    /// Name not present in the roster.
    #[error("{kind} `{name}` is not registered")]
    NotFound { kind: RosterKind, name: String },
}

/// Ordered, unique team and marshal names.
///
/// Registration order is preserved; it is the tie-break of every ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    teams: Vec<String>,
    marshals: Vec<String>,
}

impl Roster {
    /// Build a roster from raw name lists, applying the same rules as [`Roster::add`].
    pub fn from_names(
        teams: impl IntoIterator<Item = String>,
        marshals: impl IntoIterator<Item = String>,
    ) -> Result<Self, RosterError> {
        let mut roster = Self::default();
        for team in teams {
            roster.add(RosterKind::Teams, &team)?;
        }
        for marshal in marshals {
            roster.add(RosterKind::Marshals, &marshal)?;
        }
        Ok(roster)
    }

    /// Registered teams in registration order.
    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    /// Registered marshals in registration order.
    pub fn marshals(&self) -> &[String] {
        &self.marshals
    }

    /// Both rosters hold at least one name.
    pub fn is_ready(&self) -> bool {
        !self.teams.is_empty() && !self.marshals.is_empty()
    }

    /// Registration index of a team.
    pub fn team_position(&self, name: &str) -> Option<usize> {
        self.teams.iter().position(|team| team == name)
    }

    /// Append a trimmed, unique name. Returns the stored name.
    pub fn add(&mut self, kind: RosterKind, name: &str) -> Result<String, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::EmptyName(kind));
        }
        let list = self.list_mut(kind);
        if list.iter().any(|existing| existing == name) {
            return Err(RosterError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
        list.push(name.to_string());
        Ok(name.to_string())
    }

    /// Remove a name, keeping the order of the others.
    pub fn remove(&mut self, kind: RosterKind, name: &str) -> Result<(), RosterError> {
        let list = self.list_mut(kind);
        let index = list
            .iter()
            .position(|existing| existing == name)
            .ok_or_else(|| RosterError::NotFound {
                kind,
                name: name.to_string(),
            })?;
        list.remove(index);
        Ok(())
    }

    fn list_mut(&mut self, kind: RosterKind) -> &mut Vec<String> {
        match kind {
            RosterKind::Teams => &mut self.teams,
            RosterKind::Marshals => &mut self.marshals,
        }
    }
}
