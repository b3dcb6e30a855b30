//! Built-in lookup table of well-known cities
//!
//! Answers the common queries without a network round trip and backs the
//! string-matching fallback of the extractor.

use crate::models::Coordinates;

/// A table entry: display name, lookup keys and `[lon, lat]`
#[derive(Debug, Clone, Copy)]
pub struct City {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub longitude: f64,
    pub latitude: f64,
}

impl City {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.longitude, self.latitude)
    }

    /// Lower-case lookup keys, the display name first
    pub fn keys(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(normalize_place(self.name))
            .chain(self.aliases.iter().map(|alias| normalize_place(alias)))
    }
}

macro_rules! city {
    ($name:literal, [$($alias:literal),*], $lon:expr, $lat:expr) => {
        City { name: $name, aliases: &[$($alias),*], longitude: $lon, latitude: $lat }
    };
}

pub static CITIES: &[City] = &[
    city!("Amsterdam", [], 4.9041, 52.3676),
    city!("Athens", [], 23.7275, 37.9838),
    city!("Bangkok", [], 100.5018, 13.7563),
    city!("Barcelona", [], 2.1734, 41.3851),
    city!("Beijing", ["peking"], 116.4074, 39.9042),
    city!("Berlin", [], 13.4050, 52.5200),
    city!("Boston", [], -71.0589, 42.3601),
    city!("Brussels", ["bruxelles"], 4.3517, 50.8503),
    city!("Budapest", [], 19.0402, 47.4979),
    city!("Buenos Aires", [], -58.3816, -34.6037),
    city!("Cairo", [], 31.2357, 30.0444),
    city!("Cape Town", [], 18.4241, -33.9249),
    city!("Chicago", [], -87.6298, 41.8781),
    city!("Copenhagen", [], 12.5683, 55.6761),
    city!("Dubai", [], 55.2708, 25.2048),
    city!("Dublin", [], -6.2603, 53.3498),
    city!("Edinburgh", [], -3.1883, 55.9533),
    city!("Florence", ["firenze"], 11.2558, 43.7696),
    city!("Frankfurt", [], 8.6821, 50.1109),
    city!("Geneva", ["geneve"], 6.1432, 46.2044),
    city!("Hamburg", [], 9.9937, 53.5511),
    city!("Hong Kong", [], 114.1694, 22.3193),
    city!("Istanbul", [], 28.9784, 41.0082),
    city!("Lisbon", ["lisboa"], -9.1393, 38.7223),
    city!("London", [], -0.1276, 51.5072),
    city!("Los Angeles", ["la"], -118.2437, 34.0522),
    city!("Lyon", [], 4.8357, 45.7640),
    city!("Madrid", [], -3.7038, 40.4168),
    city!("Manchester", [], -2.2426, 53.4808),
    city!("Marseille", ["marseilles"], 5.3698, 43.2965),
    city!("Melbourne", [], 144.9631, -37.8136),
    city!("Mexico City", [], -99.1332, 19.4326),
    city!("Milan", ["milano"], 9.1900, 45.4642),
    city!("Montreal", [], -73.5673, 45.5017),
    city!("Moscow", [], 37.6173, 55.7558),
    city!("Mumbai", ["bombay"], 72.8777, 19.0760),
    city!("Munich", ["munchen", "münchen"], 11.5820, 48.1351),
    city!("Naples", ["napoli"], 14.2681, 40.8518),
    city!("New York", ["nyc", "new york city"], -74.0060, 40.7128),
    city!("Nice", [], 7.2620, 43.7102),
    city!("Oslo", [], 10.7522, 59.9139),
    city!("Paris", [], 2.3522, 48.8566),
    city!("Prague", ["praha"], 14.4378, 50.0755),
    city!("Rio de Janeiro", ["rio"], -43.1729, -22.9068),
    city!("Rome", ["roma"], 12.4964, 41.9028),
    city!("San Francisco", ["sf"], -122.4194, 37.7749),
    city!("Seattle", [], -122.3321, 47.6062),
    city!("Seoul", [], 126.9780, 37.5665),
    city!("Singapore", [], 103.8198, 1.3521),
    city!("Stockholm", [], 18.0686, 59.3293),
    city!("Sydney", [], 151.2093, -33.8688),
    city!("Tokyo", [], 139.6503, 35.6762),
    city!("Toronto", [], -79.3832, 43.6532),
    city!("Vancouver", [], -123.1207, 49.2827),
    city!("Venice", ["venezia"], 12.3155, 45.4408),
    city!("Vienna", ["wien"], 16.3738, 48.2082),
    city!("Warsaw", ["warszawa"], 21.0122, 52.2297),
    city!("Washington", ["washington dc", "washington d.c.", "dc"], -77.0369, 38.9072),
    city!("Zurich", ["zürich"], 8.5417, 47.3769),
];

/// Lower-case, drop punctuation other than hyphens/apostrophes, collapse whitespace
#[must_use]
pub fn normalize_place(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '\'' {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exact lookup on name or alias
#[must_use]
pub fn lookup(name: &str) -> Option<&'static City> {
    let key = normalize_place(name);
    if key.is_empty() {
        return None;
    }
    CITIES.iter().find(|city| city.keys().any(|k| k == key))
}

/// Substring lookup. Prefers the longest table key found as whole words in
/// the query ("Paris, France"), then the shortest key containing the query
/// ("Amster"). Queries shorter than 3 characters never match.
#[must_use]
pub fn fuzzy_lookup(name: &str) -> Option<&'static City> {
    let query = normalize_place(name);
    if query.chars().count() < 3 {
        return None;
    }

    // short aliases ("la", "sf") only ever match exactly
    let candidates = || {
        CITIES.iter().flat_map(|city| {
            city.keys()
                .filter(|key| key.chars().count() >= 3)
                .map(move |key| (city, key))
        })
    };

    let within_query = candidates()
        .filter(|(_, key)| contains_word(&query, key))
        .max_by_key(|(_, key)| key.len());
    if let Some((city, _)) = within_query {
        return Some(city);
    }

    candidates()
        .filter(|(_, key)| key.contains(&query))
        .min_by_key(|(_, key)| key.len())
        .map(|(city, _)| city)
}

/// Keys that are also everyday English words; in free text they only count
/// when written capitalized
const COMMON_WORDS: &[&str] = &["nice"];

fn capitalized_in(text: &str, key: &str) -> bool {
    text.split(|c: char| !(c.is_alphanumeric() || c == '-' || c == '\''))
        .any(|token| {
            token.eq_ignore_ascii_case(key) && token.chars().next().is_some_and(char::is_uppercase)
        })
}

/// Cities mentioned in free text, ordered by first position, without duplicates
#[must_use]
pub fn find_mentions(text: &str) -> Vec<&'static City> {
    let haystack = normalize_place(text);
    let mut hits: Vec<(usize, usize, &'static City)> = Vec::new();

    for city in CITIES {
        let best = city
            .keys()
            .filter(|key| key.chars().count() >= 3)
            .filter(|key| !COMMON_WORDS.contains(&key.as_str()) || capitalized_in(text, key))
            .filter_map(|key| word_position(&haystack, &key).map(|pos| (pos, key.len())))
            .min_by_key(|(pos, _)| *pos);
        if let Some((pos, len)) = best {
            hits.push((pos, len, city));
        }
    }

    hits.sort_by_key(|(pos, len, _)| (*pos, std::cmp::Reverse(*len)));

    // drop hits nested inside a longer earlier one ("york" inside "new york")
    let mut result: Vec<&'static City> = Vec::new();
    let mut covered_until = 0usize;
    for (pos, len, city) in hits {
        if pos < covered_until {
            continue;
        }
        covered_until = pos + len;
        if !result.iter().any(|c| std::ptr::eq(*c, city)) {
            result.push(city);
        }
    }
    result
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    word_position(haystack, needle).is_some()
}

/// Byte offset of `needle` in `haystack` on word boundaries
fn word_position(haystack: &str, needle: &str) -> Option<usize> {
    let mut start = 0;
    while let Some(offset) = haystack[start..].find(needle) {
        let pos = start + offset;
        let end = pos + needle.len();
        let before_ok = pos == 0 || haystack[..pos].ends_with(' ');
        let after_ok = end == haystack.len() || haystack[end..].starts_with(' ');
        if before_ok && after_ok {
            return Some(pos);
        }
        start = pos + needle.len().max(1);
        if start >= haystack.len() {
            break;
        }
    }
    None
}
