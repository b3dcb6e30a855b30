//! Intent extraction module
//!
//! Turns free text into an [`ExtractionResult`] in three stages:
//! - ordered regex rules for the common query shapes
//! - a remote text-generation call whose JSON reply is validated
//! - string matching against the built-in city table
//!
//! Travel mode, preferences and time context are detected the same way for
//! every stage.

pub mod llm_reply;
pub mod rules;
pub mod text;

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::geocoding::gazetteer;
use crate::llm::TextGenerator;
use crate::models::{
    ExtractionResult, ExtractionSource, IntentType, LocationMention, TravelMode,
    VisualizationType,
};
use crate::{MapQueryError, Result};

/// Queries longer than this are rejected before any processing
pub const MAX_QUERY_CHARS: usize = 500;

const NOTHING_FOUND: &str =
    "I couldn't find any places in that request. Try something like \"Route from Paris to London\".";

/// Free text to structured map intent
pub struct IntentExtractor {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl IntentExtractor {
    /// Create an extractor; without a generator only rules and string matching are used
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Whether a remote text generator is configured
    #[must_use]
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Extract intent and locations from `query`
    #[instrument(skip(self))]
    pub async fn extract(&self, query: &str) -> Result<ExtractionResult> {
        let query = text::normalize_query(query);
        if query.is_empty() {
            return Err(MapQueryError::validation("Query cannot be empty"));
        }
        if query.chars().count() > MAX_QUERY_CHARS {
            return Err(MapQueryError::validation(format!(
                "Query is too long (max {MAX_QUERY_CHARS} characters)"
            )));
        }

        if let Some(result) = self.extract_with_rules(&query) {
            return Ok(result);
        }

        if let Some(generator) = &self.generator {
            match self.extract_with_model(generator.as_ref(), &query).await {
                Ok(result) => return Ok(result),
                Err(e) => warn!("Model extraction failed, using string matching: {}", e),
            }
        }

        Ok(self.extract_with_fallback(&query))
    }

    /// Stage one: ordered regex rules
    #[must_use]
    pub fn extract_with_rules(&self, query: &str) -> Option<ExtractionResult> {
        let matched = rules::match_rules(query)?;
        let mentions: Vec<LocationMention> = matched
            .phrases
            .iter()
            .filter_map(|phrase| text::to_mention(phrase))
            .collect();
        let mentions = text::dedup_mentions(mentions);

        if mentions.is_empty() {
            debug!("Rule '{}' matched but left no place names", matched.rule);
            return None;
        }

        info!(
            "Rule '{}' extracted {} location(s)",
            matched.rule,
            mentions.len()
        );
        Some(assemble(
            query,
            matched.intent,
            mentions,
            None,
            Vec::new(),
            None,
            ExtractionSource::Rules,
        ))
    }

    /// Stage two: remote model with a validated JSON reply
    async fn extract_with_model(
        &self,
        generator: &dyn TextGenerator,
        query: &str,
    ) -> Result<ExtractionResult> {
        let reply = generator.generate(&llm_reply::build_prompt(query), true).await?;
        let parsed = llm_reply::parse_reply(&reply)?;

        info!("Model extracted {} location(s)", parsed.mentions.len());

        let result = assemble(
            query,
            parsed.intent,
            parsed.mentions,
            parsed.travel_mode,
            parsed.preferences,
            parsed.message,
            ExtractionSource::Llm,
        );
        Ok(with_sequence(result, parsed.sequence))
    }

    /// Stage three: city names found anywhere in the text
    #[must_use]
    pub fn extract_with_fallback(&self, query: &str) -> ExtractionResult {
        let cities = gazetteer::find_mentions(query);
        if cities.is_empty() {
            info!("No locations found in query");
            return ExtractionResult::empty(NOTHING_FOUND, ExtractionSource::Fallback);
        }

        let intent = if cities.len() >= 2 && rules::has_route_keyword(query) {
            IntentType::Route
        } else {
            IntentType::Locations
        };
        let mentions = cities
            .iter()
            .map(|city| LocationMention {
                name: city.name.to_string(),
                time_context: None,
                coordinates: Some(city.coordinates()),
            })
            .collect();

        info!("String matching found {} known city(ies)", cities.len());
        assemble(
            query,
            intent,
            mentions,
            None,
            Vec::new(),
            None,
            ExtractionSource::Fallback,
        )
    }
}

/// Replace the default sequence when the model's one is usable; locations
/// it leaves out are appended in mention order
fn with_sequence(mut result: ExtractionResult, sequence: Vec<String>) -> ExtractionResult {
    let required = if result.is_route() { 2 } else { 1 };
    if sequence.len() < required {
        return result;
    }
    let mut full = sequence;
    for location in &result.locations {
        if !full.iter().any(|n| n.eq_ignore_ascii_case(&location.name)) {
            full.push(location.name.clone());
        }
    }
    result.suggested_sequence = full;
    result
}

/// Shared result assembly; upholds the route invariants
fn assemble(
    query: &str,
    intent: IntentType,
    mentions: Vec<LocationMention>,
    travel_mode: Option<TravelMode>,
    preferences: Vec<String>,
    message: Option<String>,
    source: ExtractionSource,
) -> ExtractionResult {
    let intent = if intent == IntentType::Route && mentions.len() < 2 {
        IntentType::Locations
    } else {
        intent
    };

    let travel_mode = travel_mode.unwrap_or_else(|| text::detect_travel_mode(query));

    let mut preferences = preferences;
    for tag in text::detect_preferences(query) {
        if !preferences.contains(&tag) {
            preferences.push(tag);
        }
    }

    let suggested_sequence: Vec<String> = mentions.iter().map(|m| m.name.clone()).collect();
    let message = message.unwrap_or_else(|| describe(intent, &mentions));

    ExtractionResult {
        intent_type: intent,
        visualization_type: VisualizationType::from(intent),
        locations: mentions,
        travel_mode,
        preferences,
        message,
        suggested_sequence,
        source,
    }
}

fn describe(intent: IntentType, mentions: &[LocationMention]) -> String {
    let names: Vec<&str> = mentions.iter().map(|m| m.name.as_str()).collect();
    match (intent, names.as_slice()) {
        (IntentType::Route, [first, stops @ .., last]) if stops.is_empty() => {
            format!("Showing route from {first} to {last}")
        }
        (IntentType::Route, [first, stops @ .., last]) => {
            format!("Showing route from {first} to {last} via {}", stops.join(", "))
        }
        (_, [only]) => format!("Showing 1 location: {only}"),
        (_, many) => format!("Showing {} locations: {}", many.len(), many.join(", ")),
    }
}
