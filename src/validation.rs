use crate::club::NewClub;
use crate::error::ClubsError;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    /// Parses and validates a `POST /clubs` body.
    pub fn validate_create_club_request(body: &[u8]) -> Result<NewClub, ClubsError> {
        let body: Value = serde_json::from_slice(body)
            .map_err(|e| ClubsError::Validation(format!("Malformed JSON body: {}", e)))?;

        let name = Self::required_str(&body, "name")?;
        let nation = Self::required_str(&body, "nation")?;

        let club = NewClub::new(name, nation);
        Self::validate_new_club(&club)?;
        Ok(club)
    }

    pub fn validate_new_club(club: &NewClub) -> Result<(), ClubsError> {
        club.validate()
            .map_err(|e| ClubsError::Validation(describe(&e)))
    }

    /// Validates the `nation` query parameter of a filter request
    pub fn validate_nation_param(nation: Option<&str>) -> Result<String, ClubsError> {
        let nation = nation
            .ok_or_else(|| ClubsError::Validation("Missing 'nation' parameter".to_string()))?
            .trim();

        if nation.is_empty() {
            return Err(ClubsError::Validation(
                "Nation cannot be empty".to_string(),
            ));
        }

        Ok(nation.to_string())
    }

    fn required_str<'a>(body: &'a Value, field: &str) -> Result<&'a str, ClubsError> {
        body.get(field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ClubsError::Validation(
                format!("Missing or invalid '{}' field", field),
            ))
    }
}

fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}
