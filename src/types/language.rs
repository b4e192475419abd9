use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language served to a visitor. Only two buckets exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    /// Lenient parse used for stored or user-supplied values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "zh" => Some(Language::Zh),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| format!("unsupported language '{s}', expected en or zh"))
    }
}

/// Where a country signal came from. Stamped when the signal is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalSource {
    Header,
    DevOverride,
    ClientApi,
    None,
}

/// Raw geolocation signal for one request or client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoSignal {
    /// Uppercase two-letter code, or empty when nothing was resolved.
    pub country_code: String,
    pub city: String,
    pub region: String,
    pub source: SignalSource,
}

impl GeoSignal {
    pub fn new(country_code: impl Into<String>, source: SignalSource) -> Self {
        Self {
            country_code: country_code.into(),
            city: String::new(),
            region: String::new(),
            source,
        }
    }

    pub fn empty() -> Self {
        Self::new("", SignalSource::None)
    }

    pub fn with_location(mut self, city: impl Into<String>, region: impl Into<String>) -> Self {
        self.city = city.into();
        self.region = region.into();
        self
    }
}

/// The resolved language plus the signal it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDecision {
    pub language: Language,
    pub is_chinese_region: bool,
    pub signal: GeoSignal,
    pub resolved_at: DateTime<Utc>,
}

impl LanguageDecision {
    /// Terminal default used whenever resolution cannot produce anything better.
    pub fn fallback() -> Self {
        Self {
            language: Language::En,
            is_chinese_region: false,
            signal: GeoSignal::empty(),
            resolved_at: Utc::now(),
        }
    }

    /// Equality that ignores the resolution timestamp.
    pub fn same_outcome(&self, other: &LanguageDecision) -> bool {
        self.language == other.language
            && self.is_chinese_region == other.is_chinese_region
            && self.signal == other.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse_is_lenient() {
        assert_eq!(Language::parse("ZH"), Some(Language::Zh));
        assert_eq!(Language::parse(" en "), Some(Language::En));
        assert_eq!(Language::parse("fr"), None);
        assert_eq!(Language::parse(""), None);
        assert!("de".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::Zh).unwrap(), "\"zh\"");
        assert_eq!(Language::default(), Language::En);
    }

    #[test]
    fn test_fallback_decision() {
        let decision = LanguageDecision::fallback();
        assert_eq!(decision.language, Language::En);
        assert!(!decision.is_chinese_region);
        assert_eq!(decision.signal.country_code, "");
        assert_eq!(decision.signal.source, SignalSource::None);
    }

    #[test]
    fn test_signal_source_wire_names() {
        assert_eq!(
            serde_json::to_string(&SignalSource::DevOverride).unwrap(),
            "\"devOverride\""
        );
        assert_eq!(
            serde_json::to_string(&SignalSource::ClientApi).unwrap(),
            "\"clientApi\""
        );
    }
}
