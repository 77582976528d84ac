//! Fuzzy matching of user-typed event names against provider names

/// How well a query matched a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchQuality {
    Partial,
    Exact,
}

/// Normalise for comparison: lower-case, single spaces, no punctuation
pub fn normalise(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best match of `query` against any of `names`
///
/// `"abu dhabi"` matches `"Abu Dhabi Grand Prix"` partially and `"Qatar"`
/// matches the country name `"Qatar"` exactly. `"Monza"` matches a location.
pub fn match_event<'a>(query: &str, names: impl IntoIterator<Item = &'a str>) -> Option<MatchQuality> {
    let query = normalise(query);
    if query.is_empty() {
        return None;
    }

    names
        .into_iter()
        .map(normalise)
        .filter_map(|name| {
            if name == query {
                Some(MatchQuality::Exact)
            } else if contains_words(&name, &query) {
                Some(MatchQuality::Partial)
            } else {
                None
            }
        })
        .max()
}

/// Word-aligned containment so "spa" does not match "spain"
fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}
