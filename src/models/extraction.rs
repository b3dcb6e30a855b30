//! Extraction model: the structured record produced from a free-text query

use serde::{Deserialize, Serialize};

use super::Coordinates;

/// Classification of a query
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    /// Travel between two or more places
    Route,
    /// Show one or more places
    #[default]
    Locations,
}

/// How the result should be drawn
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationType {
    Route,
    #[default]
    Markers,
}

impl From<IntentType> for VisualizationType {
    fn from(intent: IntentType) -> Self {
        match intent {
            IntentType::Route => VisualizationType::Route,
            IntentType::Locations => VisualizationType::Markers,
        }
    }
}

/// Travel mode, maps 1:1 onto Mapbox directions profiles
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl TravelMode {
    /// Mapbox directions profile name
    #[must_use]
    pub fn profile(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Cycling => "cycling",
        }
    }

    /// Lenient parse used for upstream model output; unknown values yield `None`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "driving" | "drive" | "car" | "driving-traffic" => Some(TravelMode::Driving),
            "walking" | "walk" | "foot" | "on foot" | "hiking" => Some(TravelMode::Walking),
            "cycling" | "cycle" | "bike" | "bicycle" | "biking" => Some(TravelMode::Cycling),
            _ => None,
        }
    }
}

/// Which extraction stage produced a result
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    /// Ordered regex rules
    Rules,
    /// Remote text-generation model
    Llm,
    /// String matching against the built-in city table
    Fallback,
}

/// A place mentioned in the query
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationMention {
    pub name: String,
    /// Free-form time phrase attached to the place ("tomorrow morning")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_context: Option<String>,
    /// Pre-resolved coordinates, skips geocoding when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

impl LocationMention {
    #[must_use]
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            time_context: None,
            coordinates: None,
        }
    }
}

/// Structured interpretation of a free-text map query
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub intent_type: IntentType,
    pub locations: Vec<LocationMention>,
    pub visualization_type: VisualizationType,
    pub travel_mode: TravelMode,
    pub preferences: Vec<String>,
    pub message: String,
    pub suggested_sequence: Vec<String>,
    pub source: ExtractionSource,
}

impl ExtractionResult {
    /// Result carrying no locations, shown to the user as a message only
    #[must_use]
    pub fn empty<S: Into<String>>(message: S, source: ExtractionSource) -> Self {
        Self {
            intent_type: IntentType::Locations,
            locations: Vec::new(),
            visualization_type: VisualizationType::Markers,
            travel_mode: TravelMode::Driving,
            preferences: Vec::new(),
            message: message.into(),
            suggested_sequence: Vec::new(),
            source,
        }
    }

    #[must_use]
    pub fn is_route(&self) -> bool {
        self.intent_type == IntentType::Route
    }

    /// Locations in visiting order: `suggested_sequence` first (case-insensitive),
    /// then any location it does not mention, in mention order
    #[must_use]
    pub fn ordered_locations(&self) -> Vec<&LocationMention> {
        let mut ordered: Vec<&LocationMention> = Vec::with_capacity(self.locations.len());
        for name in &self.suggested_sequence {
            if let Some(location) = self
                .locations
                .iter()
                .find(|l| l.name.eq_ignore_ascii_case(name))
                && !ordered.iter().any(|o| std::ptr::eq(*o, location))
            {
                ordered.push(location);
            }
        }
        for location in &self.locations {
            if !ordered.iter().any(|o| std::ptr::eq(*o, location)) {
                ordered.push(location);
            }
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(names: &[&str], sequence: &[&str]) -> ExtractionResult {
        ExtractionResult {
            intent_type: IntentType::Route,
            locations: names.iter().map(|n| LocationMention::named(*n)).collect(),
            visualization_type: VisualizationType::Route,
            travel_mode: TravelMode::Driving,
            preferences: vec![],
            message: String::new(),
            suggested_sequence: sequence.iter().map(|s| s.to_string()).collect(),
            source: ExtractionSource::Rules,
        }
    }

    #[test]
    fn test_ordered_locations_follow_sequence() {
        let result = result_with(&["Paris", "Berlin", "Rome"], &["rome", "Paris"]);
        let names: Vec<&str> = result
            .ordered_locations()
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["Rome", "Paris", "Berlin"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut result = result_with(&["Paris", "London"], &["Paris", "London"]);
        result.locations[0].time_context = Some("tomorrow".into());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["intentType"], "route");
        assert_eq!(json["visualizationType"], "route");
        assert_eq!(json["travelMode"], "driving");
        assert_eq!(json["locations"][0]["timeContext"], "tomorrow");
        assert!(json["locations"][1].get("timeContext").is_none());
        assert_eq!(json["suggestedSequence"][1], "London");
    }

    #[test]
    fn test_travel_mode_parse() {
        assert_eq!(TravelMode::parse("Walking"), Some(TravelMode::Walking));
        assert_eq!(TravelMode::parse("bike"), Some(TravelMode::Cycling));
        assert_eq!(TravelMode::parse("teleport"), None);
        assert_eq!(TravelMode::Cycling.profile(), "cycling");
    }
}
