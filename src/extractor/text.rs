//! Text helpers shared by every extraction stage: travel mode, preferences,
//! time context and place-name cleanup.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{LocationMention, TravelMode};

/// Weekday names, shared by several time patterns
const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

static WALKING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:walk|walks|walking|on foot|hike|hiking|stroll)\b").expect("valid regex")
});

static CYCLING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:cycle|cycling|bike|biking|bicycle|by bike)\b").expect("valid regex")
});

/// (pattern, preference tag) in reporting order
static PREFERENCES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\b(?:avoid(?:ing)?|no|without)\s+(?:the\s+)?tolls?\b|\btoll[- ]free\b", "avoid_tolls"),
        (
            r"(?i)\b(?:avoid(?:ing)?|no|without)\s+(?:the\s+)?(?:highways?|motorways?|freeways?)\b",
            "avoid_highways",
        ),
        (r"(?i)\b(?:avoid(?:ing)?|no|without)\s+(?:the\s+)?ferr(?:y|ies)\b", "avoid_ferries"),
        (r"(?i)\bscenic\b", "scenic"),
        (r"(?i)\b(?:fastest|quickest)\b", "fastest"),
        (r"(?i)\bshortest\b", "shortest"),
    ]
    .into_iter()
    .map(|(pattern, tag)| (Regex::new(pattern).expect("valid regex"), tag))
    .collect()
});

/// One or more time phrases at the end of a name
static TRAILING_TIME: LazyLock<Regex> = LazyLock::new(|| {
    let phrase = format!(
        r"(?:today|tonight|tomorrow|yesterday|now|this\s+(?:morning|afternoon|evening|week(?:end)?)|next\s+(?:week(?:end)?|month|{WEEKDAYS})|on\s+(?:{WEEKDAYS})|(?:{WEEKDAYS})|at\s+(?:\d{{1,2}}(?::\d{{2}})?\s*(?:am|pm)?|noon|midnight)|in\s+the\s+(?:morning|afternoon|evening)|for\s+(?:the\s+)?(?:weekend|week|day|night|\d+\s+(?:days?|nights?|weeks?))|morning|afternoon|evening|night)"
    );
    Regex::new(&format!(r"(?i)(?:^|\s+)(?P<time>{phrase}(?:\s+{phrase})*)$")).expect("valid regex")
});

/// Everything from a preference clause onward ("London avoiding tolls")
static PREFERENCE_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*,?\s*\b(?:avoid|avoiding|without|with|using|taking|prefer|preferring|scenic|fastest|quickest|shortest|please)\b.*$",
    )
    .expect("valid regex")
});

static MODE_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*\b(?:by\s+(?:car|bike|bicycle|foot|road|train|rail|bus|coach|plane|air|boat|ferry)|on\s+(?:foot|(?:a\s+)?bike)|driving|walking|cycling|biking)\b",
    )
    .expect("valid regex")
});

static LEADING_FILLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:the|a|an|city\s+of|downtown)\s+").expect("valid regex")
});

static LIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:,\s*(?:and\s+|then\s+)?|;|&|\band\s+then\b|\bthen\b|\band\b|\bfollowed\s+by\b)\s*")
        .expect("valid regex")
});

/// Collapse whitespace and drop trailing sentence punctuation
#[must_use]
pub fn normalize_query(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', '?', '!'])
        .trim()
        .to_string()
}

#[must_use]
pub fn detect_travel_mode(query: &str) -> TravelMode {
    if WALKING.is_match(query) {
        TravelMode::Walking
    } else if CYCLING.is_match(query) {
        TravelMode::Cycling
    } else {
        TravelMode::Driving
    }
}

#[must_use]
pub fn detect_preferences(query: &str) -> Vec<String> {
    PREFERENCES
        .iter()
        .filter(|(pattern, _)| pattern.is_match(query))
        .map(|(_, tag)| (*tag).to_string())
        .collect()
}

/// Normalize a free-form preference ("Avoid Tolls") into a tag ("avoid_tolls")
#[must_use]
pub fn normalize_preference(raw: &str) -> Option<String> {
    let detected = detect_preferences(raw);
    if let Some(first) = detected.into_iter().next() {
        return Some(first);
    }
    let tag = raw
        .trim()
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    (!tag.is_empty()).then_some(tag)
}

/// Split a list phrase ("Paris, Lyon and Nice") into its items
#[must_use]
pub fn split_list(list: &str) -> Vec<String> {
    LIST_SEPARATOR
        .split(list)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Turn a raw captured phrase into a mention: strips preference clauses,
/// travel-mode phrases and fillers, and splits off a trailing time context.
/// Returns `None` when nothing of the name is left.
#[must_use]
pub fn to_mention(raw: &str) -> Option<LocationMention> {
    let without_prefs = PREFERENCE_TAIL.replace(raw, "");
    let without_mode = MODE_PHRASE.replace_all(&without_prefs, "");
    let mut name = without_mode.trim().to_string();

    let mut time_context = None;
    if let Some(caps) = TRAILING_TIME.captures(&name) {
        let whole = caps.get(0).map_or(0, |m| m.start());
        time_context = caps.name("time").map(|m| m.as_str().to_lowercase());
        name.truncate(whole);
    }

    let name = LEADING_FILLER.replace(name.trim(), "");
    let name = name
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?' | '"' | ':'))
        .to_string();

    if name.is_empty() {
        return None;
    }

    Some(LocationMention {
        name,
        time_context,
        coordinates: None,
    })
}

/// Drop later mentions whose name repeats an earlier one (case-insensitive)
#[must_use]
pub fn dedup_mentions(mentions: Vec<LocationMention>) -> Vec<LocationMention> {
    let mut unique: Vec<LocationMention> = Vec::with_capacity(mentions.len());
    for mention in mentions {
        if !unique.iter().any(|m| m.name.eq_ignore_ascii_case(&mention.name)) {
            unique.push(mention);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Walk from the station to the museum", TravelMode::Walking)]
    #[case("route on foot from A to B", TravelMode::Walking)]
    #[case("Bike ride from Amsterdam to Utrecht", TravelMode::Cycling)]
    #[case("Drive from Paris to Lyon", TravelMode::Driving)]
    #[case("Route from Paris to London", TravelMode::Driving)]
    fn test_detect_travel_mode(#[case] query: &str, #[case] expected: TravelMode) {
        assert_eq!(detect_travel_mode(query), expected);
    }

    #[test]
    fn test_detect_preferences() {
        assert_eq!(
            detect_preferences("scenic drive from Nice to Genoa avoiding tolls, no ferries"),
            vec!["avoid_tolls", "avoid_ferries", "scenic"]
        );
        assert_eq!(detect_preferences("the quickest way, avoid motorways"), vec![
            "avoid_highways",
            "fastest"
        ]);
        assert!(detect_preferences("Route from Paris to London").is_empty());
    }

    #[test]
    fn test_normalize_preference() {
        assert_eq!(normalize_preference("Avoid Tolls").as_deref(), Some("avoid_tolls"));
        assert_eq!(normalize_preference("kid friendly").as_deref(), Some("kid_friendly"));
        assert_eq!(normalize_preference("  "), None);
    }

    #[rstest]
    #[case("London", "London", None)]
    #[case("London tomorrow morning", "London", Some("tomorrow morning"))]
    #[case("Berlin on Friday at 5pm", "Berlin", Some("on friday at 5pm"))]
    #[case("Rome for the weekend", "Rome", Some("for the weekend"))]
    #[case("London by car avoiding tolls", "London", None)]
    #[case("Prague by train", "Prague", None)]
    #[case("Dublin by plane next week", "Dublin", Some("next week"))]
    #[case("Oxford by bus", "Oxford", None)]
    #[case("the Eiffel Tower", "Eiffel Tower", None)]
    #[case("Lyon, please", "Lyon", None)]
    #[case("Nice in the evening", "Nice", Some("in the evening"))]
    fn test_to_mention(
        #[case] raw: &str,
        #[case] name: &str,
        #[case] time_context: Option<&str>,
    ) {
        let mention = to_mention(raw).unwrap();
        assert_eq!(mention.name, name);
        assert_eq!(mention.time_context.as_deref(), time_context);
    }

    #[test]
    fn test_to_mention_nothing_left() {
        assert!(to_mention("tomorrow").is_none());
        assert!(to_mention("   ").is_none());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("Paris, Lyon and Nice"),
            vec!["Paris", "Lyon", "Nice"]
        );
        assert_eq!(
            split_list("Rome; Florence, and then Venice"),
            vec!["Rome", "Florence", "Venice"]
        );
        assert_eq!(split_list("Tokyo"), vec!["Tokyo"]);
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  Route   from Paris\tto London?! "), "Route from Paris to London");
    }

    #[test]
    fn test_dedup_mentions() {
        let mentions = vec![
            LocationMention::named("Paris"),
            LocationMention::named("paris"),
            LocationMention::named("Lyon"),
        ];
        let unique = dedup_mentions(mentions);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "Paris");
    }
}
