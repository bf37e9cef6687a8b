//! Sport-keyword gate: a channel is only eligible for
//! league matching once its name contains a recognised sports keyword,
//! or its group tag equals a sport category (case-insensitive substring).

const DEFAULT_KEYWORDS: &[&str] = &[
    "ESPN",
    "NFL",
    "NBA",
    "MLB",
    "NHL",
    "FOX SPORTS",
    "SKY SPORTS",
    "DAZN",
    "BEIN",
    "TNT",
    "NCAA",
    "MOTORSPORT",
    "SPORT",
];

const SPORT_GROUP_CATEGORIES: &[&str] = &["sports", "sport"];

pub fn passes_keyword_gate(channel_name: &str, group_title: Option<&str>) -> bool {
    passes_keyword_gate_with(channel_name, group_title, &[])
}

/// Same gate, extended with per-league keywords sourced from the league
/// catalog (spec.md §3's "set of sport-keywords used to gate matching"),
/// so a channel can also pass by matching a keyword a specific league
/// contributes even when it isn't one of the built-in broadcaster brands.
pub fn passes_keyword_gate_with(
    channel_name: &str,
    group_title: Option<&str>,
    extra_keywords: &[&str],
) -> bool {
    let upper_name = channel_name.to_uppercase();
    if DEFAULT_KEYWORDS.iter().any(|kw| upper_name.contains(kw)) {
        return true;
    }
    if extra_keywords
        .iter()
        .any(|kw| !kw.is_empty() && upper_name.contains(&kw.to_uppercase()))
    {
        return true;
    }
    if let Some(group) = group_title {
        let lower_group = group.to_lowercase();
        return SPORT_GROUP_CATEGORIES
            .iter()
            .any(|cat| lower_group.contains(cat));
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn espn_channel_name_passes() {
        assert!(passes_keyword_gate("ESPN HD", None));
    }

    #[test]
    fn sports_group_tag_passes() {
        assert!(passes_keyword_gate("Random Channel", Some("Sports")));
    }

    #[test]
    fn unrelated_channel_fails() {
        assert!(!passes_keyword_gate("Kids Cartoon Network", Some("Kids")));
    }

    #[test]
    fn league_contributed_keyword_passes_gate() {
        assert!(!passes_keyword_gate("Redzone Channel", None));
        assert!(passes_keyword_gate_with("Redzone Channel", None, &["REDZONE"]));
    }
}
