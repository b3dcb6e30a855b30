//! Prompt construction and validation of the model's JSON reply

use serde::Deserialize;
use serde_json::Value;

use super::text::{self, normalize_preference};
use crate::models::{Coordinates, IntentType, LocationMention, TravelMode};
use crate::{MapQueryError, Result};

/// Instruction sent ahead of the user's query
const INSTRUCTIONS: &str = r#"You extract map intents from travel questions.
Reply with a single JSON object and nothing else, using exactly these keys:
{
  "intentType": "route" | "locations",
  "locations": [{"name": string, "timeContext": string | null}],
  "travelMode": "driving" | "walking" | "cycling",
  "preferences": [string],
  "message": string,
  "suggestedSequence": [string]
}
Rules:
- "route" means the user wants to travel between two or more places; list them in travel order.
- "locations" means the user wants to see one or more places on a map.
- Use place names a geocoder understands ("Paris, France"), one entry per place.
- "timeContext" holds any time phrase tied to that place ("tomorrow morning"), else null.
- "suggestedSequence" repeats the location names in the order they should be visited.
- "message" is one short sentence describing what will be shown.
"#;

/// Full prompt for `query`
#[must_use]
pub fn build_prompt(query: &str) -> String {
    format!("{INSTRUCTIONS}\nUser request: {query}")
}

/// Validated model output, before the shared result assembly
#[derive(Debug, Clone, PartialEq)]
pub struct ModelExtraction {
    pub intent: IntentType,
    pub mentions: Vec<LocationMention>,
    pub travel_mode: Option<TravelMode>,
    pub preferences: Vec<String>,
    pub message: Option<String>,
    pub sequence: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExtraction {
    intent_type: Option<String>,
    #[serde(default)]
    locations: Vec<RawLocation>,
    travel_mode: Option<String>,
    #[serde(default)]
    preferences: Vec<String>,
    message: Option<String>,
    #[serde(default)]
    suggested_sequence: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLocation {
    Name(String),
    Detailed(RawLocationDetail),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLocationDetail {
    name: String,
    #[serde(default, alias = "time_context")]
    time_context: Option<String>,
    #[serde(default)]
    coordinates: Option<Value>,
}

/// Slice from the first `{` to the last `}`, tolerating code fences and chatter
fn json_object(reply: &str) -> Result<&str> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&reply[start..=end]),
        _ => Err(MapQueryError::api("Model reply contains no JSON object")),
    }
}

/// Accept `[lon, lat]` or `{"longitude", "latitude"}` when in range
fn parse_coordinates(value: &Value) -> Option<Coordinates> {
    let coordinates = match value {
        Value::Array(items) if items.len() == 2 => {
            Coordinates::new(items[0].as_f64()?, items[1].as_f64()?)
        }
        Value::Object(map) => Coordinates::new(
            map.get("longitude").or_else(|| map.get("lng"))?.as_f64()?,
            map.get("latitude").or_else(|| map.get("lat"))?.as_f64()?,
        ),
        _ => return None,
    };
    coordinates.is_valid().then_some(coordinates)
}

/// Parse and validate a model reply
pub fn parse_reply(reply: &str) -> Result<ModelExtraction> {
    let raw: RawExtraction = serde_json::from_str(json_object(reply)?)
        .map_err(|e| MapQueryError::api(format!("Model reply is not a valid extraction: {e}")))?;

    let mentions: Vec<LocationMention> = raw
        .locations
        .into_iter()
        .filter_map(|location| match location {
            RawLocation::Name(name) => Some(LocationMention::named(name.trim())),
            RawLocation::Detailed(detail) => Some(LocationMention {
                name: detail.name.trim().to_string(),
                time_context: detail
                    .time_context
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("null")),
                coordinates: detail.coordinates.as_ref().and_then(parse_coordinates),
            }),
        })
        .filter(|mention| !mention.name.is_empty())
        .collect();
    let mentions = text::dedup_mentions(mentions);

    if mentions.is_empty() {
        return Err(MapQueryError::api("Model reply lists no locations"));
    }

    let mut intent = match raw.intent_type.as_deref().map(str::to_lowercase).as_deref() {
        Some("route") => IntentType::Route,
        Some("locations" | "location" | "markers") => IntentType::Locations,
        _ if mentions.len() >= 2 => IntentType::Route,
        _ => IntentType::Locations,
    };
    if intent == IntentType::Route && mentions.len() < 2 {
        intent = IntentType::Locations;
    }

    // unknown names are dropped; an unusable sequence means mention order
    let sequence: Vec<String> = raw
        .suggested_sequence
        .iter()
        .filter_map(|name| {
            mentions
                .iter()
                .find(|m| m.name.eq_ignore_ascii_case(name.trim()))
                .map(|m| m.name.clone())
        })
        .fold(Vec::new(), |mut acc: Vec<String>, name| {
            if !acc.contains(&name) {
                acc.push(name);
            }
            acc
        });

    let travel_mode = raw
        .travel_mode
        .as_deref()
        .map(|mode| TravelMode::parse(mode).unwrap_or_default());

    let mut preferences: Vec<String> = Vec::new();
    for tag in raw.preferences.iter().filter_map(|p| normalize_preference(p)) {
        if !preferences.contains(&tag) {
            preferences.push(tag);
        }
    }

    Ok(ModelExtraction {
        intent,
        mentions,
        travel_mode,
        preferences,
        message: raw.message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
        sequence,
    })
}
