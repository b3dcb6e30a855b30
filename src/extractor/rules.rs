//! Ordered regex rules for the common query shapes. The first rule that
//! matches decides the intent and the raw place phrases.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::text::split_list;
use crate::models::IntentType;

/// Raw outcome of a rule: intent plus unprocessed place phrases in order
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub rule: &'static str,
    pub intent: IntentType,
    pub phrases: Vec<String>,
}

/// Verbs and nouns that mark a query as a travel request
pub const ROUTE_KEYWORDS: &str =
    r"route|routes|directions?|drive|driving|walk|walking|cycle|cycling|bike|biking|ride|travel|go|get|navigate|way|trip|journey|commute";

static ROUTE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{ROUTE_KEYWORDS})\b")).expect("valid regex")
});

/// Optional "via A, B" tail shared by the route rules
const VIA: &str = r"(?:\s+(?:via|through|passing\s+through|stopping\s+(?:at|in))\s+(?P<via>.+?))?";

static FROM_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\bfrom\s+(?P<origin>.+?)\s+(?:to|->|→)\s+(?P<dest>.+?){VIA}$"
    ))
    .expect("valid regex")
});

static BETWEEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbetween\s+(?P<origin>.+?)\s+and\s+(?P<dest>.+)$").expect("valid regex")
});

static KEYWORD_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:{ROUTE_KEYWORDS})\b(?:\s+(?:me|us))?\s+(?P<origin>.+?)\s+(?:to|->|→)\s+(?P<dest>.+?){VIA}$"
    ))
    .expect("valid regex")
});

static BARE_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<origin>[^,;]+?)\s+(?:to|->|→)\s+(?P<dest>[^,;]+?){VIA}$"
    ))
    .expect("valid regex")
});

static TOUR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:visit(?:ing)?|tour(?:ing)?|(?:road\s+)?trip\s+(?:through|across|around|to)|itinerary\s+(?:for|through)|stops?\s+(?:at|in))\s+(?P<list>.+)$",
    )
    .expect("valid regex")
});

static SHOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:please\s+|can\s+you\s+|could\s+you\s+)?(?:show(?:\s+me)?|display|where\s+(?:is|are)|map(?:\s+of)?|find|locate|mark|pin|plot|highlight)\s+(?:me\s+)?(?:the\s+)?(?:(?:locations?|cities|places|positions?)\s+(?:of\s+)?)?(?P<list>.+)$",
    )
    .expect("valid regex")
});

/// Words that never start a place name in a bare "X to Y" query
const NON_PLACE_STARTERS: &[&str] = &[
    "i", "i'd", "i'm", "we", "we'd", "we're", "you", "they", "want", "need", "how", "what",
    "where", "when", "let", "lets", "let's", "can", "could", "please", "like", "going", "plan",
    "take", "see", "visit", "is", "it", "there", "show", "time", "have", "would", "go", "get",
    "fly", "travel", "drive",
];

/// Whether the query contains a route keyword
#[must_use]
pub fn has_route_keyword(query: &str) -> bool {
    ROUTE_KEYWORD.is_match(query)
}

/// Run the rules in order; `None` when no rule applies
#[must_use]
pub fn match_rules(query: &str) -> Option<RuleMatch> {
    if let Some(caps) = FROM_TO.captures(query) {
        return Some(route_match("from_to", &caps));
    }
    if let Some(caps) = BETWEEN.captures(query) {
        return Some(route_match("between", &caps));
    }
    if let Some(caps) = KEYWORD_TO.captures(query) {
        return Some(route_match("keyword_to", &caps));
    }
    if let Some(caps) = BARE_TO.captures(query)
        && looks_like_place(&caps["origin"])
        && looks_like_place(&caps["dest"])
    {
        return Some(route_match("bare_to", &caps));
    }
    if let Some(caps) = TOUR.captures(query) {
        let phrases = split_list(&caps["list"]);
        let intent = if phrases.len() >= 2 {
            IntentType::Route
        } else {
            IntentType::Locations
        };
        return Some(RuleMatch {
            rule: "tour",
            intent,
            phrases,
        });
    }
    if let Some(caps) = SHOW.captures(query) {
        return Some(RuleMatch {
            rule: "show",
            intent: IntentType::Locations,
            phrases: split_list(&caps["list"]),
        });
    }
    None
}

/// origin, via stops in order, destination
fn route_match(rule: &'static str, caps: &Captures<'_>) -> RuleMatch {
    let mut phrases = vec![caps["origin"].to_string()];
    if let Some(via) = caps.name("via") {
        phrases.extend(split_list(via.as_str()));
    }
    phrases.push(caps["dest"].to_string());
    RuleMatch {
        rule,
        intent: IntentType::Route,
        phrases,
    }
}

fn looks_like_place(phrase: &str) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let Some(first) = words.first() else {
        return false;
    };
    words.len() <= 4 && !NON_PLACE_STARTERS.contains(&first.to_lowercase().as_str())
}
