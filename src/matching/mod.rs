//! Fuzzy Matcher: gates a channel on sport keywords, then
//! scores it against every known league with Jaro-Winkler and picks the
//! arg-max above threshold.

pub mod jaro_winkler;
pub mod keywords;

use crate::models::League;
use uuid::Uuid;

pub use jaro_winkler::{jaro_winkler, normalise};
pub use keywords::{passes_keyword_gate, passes_keyword_gate_with};

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Confidence >= store_threshold: auto-confirmed match.
    Confirmed { league_id: Uuid, confidence: f64 },
    /// Confidence in [index_threshold, store_threshold): candidate, not confirmed.
    Candidate { league_id: Uuid, confidence: f64 },
    /// Either the keyword gate failed, or no league scored above index_threshold.
    Unmatched,
}

impl MatchOutcome {
    pub fn league_id(&self) -> Option<Uuid> {
        match self {
            MatchOutcome::Confirmed { league_id, .. } | MatchOutcome::Candidate { league_id, .. } => {
                Some(*league_id)
            }
            MatchOutcome::Unmatched => None,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            MatchOutcome::Confirmed { confidence, .. } | MatchOutcome::Candidate { confidence, .. } => {
                *confidence
            }
            MatchOutcome::Unmatched => 0.0,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, MatchOutcome::Confirmed { .. })
    }
}

pub struct LeagueMatcher {
    pub index_threshold: f64,
    pub store_threshold: f64,
}

impl LeagueMatcher {
    pub fn new(index_threshold: f64, store_threshold: f64) -> Self {
        Self {
            index_threshold,
            store_threshold,
        }
    }

    /// Match one channel against the full league catalog. Non-sports
    /// channels (failing the keyword gate) are always `Unmatched` with
    /// confidence 0, never scored.
    pub fn match_channel(
        &self,
        channel_name: &str,
        group_title: Option<&str>,
        leagues: &[League],
    ) -> MatchOutcome {
        let league_keywords: Vec<&str> = leagues.iter().flat_map(League::keywords).collect();
        if !passes_keyword_gate_with(channel_name, group_title, &league_keywords) {
            return MatchOutcome::Unmatched;
        }

        let normalised_name = normalise(channel_name);
        let mut best: Option<(Uuid, f64)> = None;

        for league in leagues {
            let score = jaro_winkler(&normalised_name, &normalise(&league.canonical_name));
            if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
                best = Some((league.id, score));
            }
        }

        match best {
            Some((league_id, confidence)) if confidence >= self.store_threshold => {
                MatchOutcome::Confirmed {
                    league_id,
                    confidence,
                }
            }
            Some((league_id, confidence)) if confidence >= self.index_threshold => {
                MatchOutcome::Candidate {
                    league_id,
                    confidence,
                }
            }
            _ => MatchOutcome::Unmatched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn league(name: &str) -> League {
        League {
            id: Uuid::new_v4(),
            canonical_name: name.to_string(),
            sport_keywords: String::new(),
            remote_feed_id: None,
        }
    }

    #[test]
    fn non_sports_channel_is_always_unmatched() {
        let matcher = LeagueMatcher::new(0.70, 0.82);
        let leagues = vec![league("National Football League")];
        let outcome = matcher.match_channel("Cartoon Kids Channel", Some("Kids"), &leagues);
        assert_eq!(outcome, MatchOutcome::Unmatched);
    }

    #[test]
    fn exact_keyword_match_confirms() {
        let matcher = LeagueMatcher::new(0.70, 0.82);
        let leagues = vec![
            league("National Football League"),
            league("National Basketball Association"),
        ];
        let outcome = matcher.match_channel("NFL Network", Some("Sports"), &leagues);
        assert!(outcome.confidence() > 0.0);
    }

    #[test]
    fn espn_scores_above_zero_against_sports_leagues() {
        let matcher = LeagueMatcher::new(0.70, 0.82);
        let leagues = vec![
            league("National Football League"),
            league("National Basketball Association"),
        ];
        let outcome = matcher.match_channel("ESPN", Some("Sports"), &leagues);
        // ESPN passes the keyword gate but may not clear index_threshold
        // against either league name — either candidate/confirmed with a
        // real league id, or unmatched. Never panics either way.
        if let Some(league_id) = outcome.league_id() {
            assert!(leagues.iter().any(|l| l.id == league_id));
        }
    }
}
