//! Country code -> language bucket.

use crate::types::{GeoSignal, Language, LanguageDecision};
use chrono::Utc;

/// Chinese-speaking regions as seen by the server-side resolver.
pub const SERVER_CHINESE_REGIONS: &[&str] = &["CN", "HK", "MO", "TW"];

/// Chinese-speaking regions as seen by client-side geolocation. Includes Singapore,
/// which the server set does not; the two are kept apart until product decides.
pub const CLIENT_CHINESE_REGIONS: &[&str] = &["CN", "HK", "MO", "TW", "SG"];

/// Which region set a classification runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSet {
    Server,
    Client,
}

impl RegionSet {
    fn codes(self) -> &'static [&'static str] {
        match self {
            RegionSet::Server => SERVER_CHINESE_REGIONS,
            RegionSet::Client => CLIENT_CHINESE_REGIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub language: Language,
    pub is_chinese_region: bool,
}

/// Uppercase and trim a raw country code.
pub fn normalize_country(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// True for exactly two ASCII letters (after normalisation).
pub fn is_country_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Classify against the server region set.
pub fn classify(country_code: Option<&str>) -> Classification {
    classify_with(country_code, RegionSet::Server)
}

pub fn classify_with(country_code: Option<&str>, set: RegionSet) -> Classification {
    let code = country_code.map(normalize_country).unwrap_or_default();
    let is_chinese_region = !code.is_empty() && set.codes().contains(&code.as_str());
    Classification {
        language: if is_chinese_region {
            Language::Zh
        } else {
            Language::En
        },
        is_chinese_region,
    }
}

/// Build a decision from a signal. The language depends only on the country code.
pub fn decide(signal: GeoSignal, set: RegionSet) -> LanguageDecision {
    let Classification {
        language,
        is_chinese_region,
    } = classify_with(Some(&signal.country_code), set);
    LanguageDecision {
        language,
        is_chinese_region,
        signal,
        resolved_at: Utc::now(),
    }
}
