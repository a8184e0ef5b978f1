//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::validation::{validate_display_name, validate_name_list, validate_position},
    state::{roster::Roster, scoring::RawInputPatch},
};

/// Replacement of both rosters during setup.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RosterRequest {
    #[validate(custom(function = "validate_name_list"))]
    pub teams: Vec<String>,
    #[validate(custom(function = "validate_name_list"))]
    pub marshals: Vec<String>,
}

/// Single name added to a roster.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct NameRequest {
    #[validate(custom(function = "validate_display_name"))]
    pub name: String,
}

/// Current rosters, in registration order.
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterResponse {
    pub teams: Vec<String>,
    pub marshals: Vec<String>,
}

impl From<&Roster> for RosterResponse {
    fn from(roster: &Roster) -> Self {
        Self {
            teams: roster.teams().to_vec(),
            marshals: roster.marshals().to_vec(),
        }
    }
}

/// Confirmation of the competition rules.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartCompetitionRequest {
    pub rules_accepted: bool,
}

/// Partial update of a team's raw input. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamInputPatch {
    pub minutes: Option<u32>,
    pub seconds: Option<u32>,
    pub penalties: Option<u32>,
    pub bonus: Option<bool>,
    /// If omitted, does not change it. If null, clears the selected position.
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<u8>)]
    pub position: Option<Option<u8>>,
    /// Accepts a manual time of exactly 0:00.
    pub confirmed_zero: Option<bool>,
}

impl Validate for TeamInputPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(seconds) = self.seconds {
            if seconds > 59 {
                let mut err = ValidationError::new("seconds_range");
                err.message = Some(format!("Seconds must be between 0 and 59 (got {seconds})").into());
                errors.add("seconds", err);
            }
        }

        if let Some(ref position) = self.position {
            if let Err(e) = validate_position(position) {
                errors.add("position", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<TeamInputPatch> for RawInputPatch {
    fn from(patch: TeamInputPatch) -> Self {
        Self {
            minutes: patch.minutes,
            seconds: patch.seconds,
            penalties: patch.penalties,
            bonus: patch.bonus,
            position: patch.position,
            confirmed_zero: patch.confirmed_zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_null_clears_and_absent_keeps() {
        let cleared: TeamInputPatch = serde_json::from_str(r#"{"position": null}"#).unwrap();
        assert_eq!(cleared.position, Some(None));

        let untouched: TeamInputPatch = serde_json::from_str(r#"{"minutes": 2}"#).unwrap();
        assert_eq!(untouched.position, None);
        assert_eq!(untouched.minutes, Some(2));

        let placed: TeamInputPatch = serde_json::from_str(r#"{"position": 1}"#).unwrap();
        assert_eq!(placed.position, Some(Some(1)));
    }

    #[test]
    fn patch_validation_flags_out_of_range_fields() {
        let patch: TeamInputPatch =
            serde_json::from_str(r#"{"seconds": 75, "position": 4, "confirmedZero": true}"#)
                .unwrap();
        let errors = patch.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("seconds"));
        assert!(fields.contains_key("position"));
    }

    #[test]
    fn roster_request_rejects_duplicates() {
        let request = RosterRequest {
            teams: vec!["Alpha".into(), "Alpha".into()],
            marshals: vec!["Sam".into()],
        };
        assert!(request.validate().is_err());
    }
}
