//! Tolerant decoding of the upstream sports API's stringly-typed fields.
//! Score feeds vary in whether scores and ids are quoted, so every field
//! here accepts either a JSON string or a number.

use serde::Deserialize;

use crate::models::EventStatus;

#[derive(Debug, Deserialize)]
pub struct UpstreamFixture {
    #[serde(rename = "idEvent")]
    pub external_id: String,
    #[serde(rename = "strHomeTeam")]
    pub home_team: Option<String>,
    #[serde(rename = "strAwayTeam")]
    pub away_team: Option<String>,
    #[serde(rename = "dateEvent")]
    pub date_event: Option<String>,
    #[serde(rename = "strTime")]
    pub time_event: Option<String>,
    #[serde(rename = "strStatus")]
    pub status: Option<String>,
    #[serde(rename = "intHomeScore", deserialize_with = "lenient_i32_opt", default)]
    pub home_score: Option<i32>,
    #[serde(rename = "intAwayScore", deserialize_with = "lenient_i32_opt", default)]
    pub away_score: Option<i32>,
    #[serde(rename = "strProgress")]
    pub period: Option<String>,
}

fn lenient_i32_opt<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i32),
        Null,
    }

    Ok(match Option::<StringOrInt>::deserialize(deserializer)? {
        Some(StringOrInt::String(s)) => s.trim().parse().ok(),
        Some(StringOrInt::Int(n)) => Some(n),
        Some(StringOrInt::Null) | None => None,
    })
}

/// Maps upstream status vocabulary onto the internal `EventStatus`.
/// Unrecognised values fall back to `None` so the caller skips the
/// update rather than guessing.
pub fn map_upstream_status(raw: &str) -> Option<EventStatus> {
    match raw.trim() {
        "FT" | "AET" | "PEN" | "Match Finished" => Some(EventStatus::Final),
        "HT" | "1H" | "2H" | "ET" | "P" | "In Progress" => Some(EventStatus::Live),
        "Postponed" => Some(EventStatus::Postponed),
        "NS" | "Not Started" => Some(EventStatus::Scheduled),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_terminal_statuses() {
        assert_eq!(map_upstream_status("FT"), Some(EventStatus::Final));
        assert_eq!(map_upstream_status("Match Finished"), Some(EventStatus::Final));
    }

    #[test]
    fn maps_live_statuses() {
        assert_eq!(map_upstream_status("HT"), Some(EventStatus::Live));
        assert_eq!(map_upstream_status("In Progress"), Some(EventStatus::Live));
    }

    #[test]
    fn unknown_status_is_none() {
        assert_eq!(map_upstream_status("garbage"), None);
    }

    #[test]
    fn lenient_score_accepts_both_shapes() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "lenient_i32_opt", default)]
            value: Option<i32>,
        }
        let from_string: Wrapper = serde_json::from_str(r#"{"value": "3"}"#).unwrap();
        let from_int: Wrapper = serde_json::from_str(r#"{"value": 3}"#).unwrap();
        assert_eq!(from_string.value, Some(3));
        assert_eq!(from_int.value, Some(3));
    }
}
