//! Per-domain branding. All domains currently follow geolocation for language;
//! the override predicates are kept as the place to pin a language per domain.

use crate::types::Language;
use serde::Serialize;

pub const CANONICAL_DOMAIN: &str = "dock2gdansk.com";

const TITLE: &str = "Dock2Gdansk - Professional Cargo Transportation";
const DESCRIPTION: &str = "Reliable cargo transportation between China and Poland";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PolicyEntry {
    hostname: &'static str,
    region: &'static str,
    title: &'static str,
    description: &'static str,
}

const POLICY_TABLE: &[PolicyEntry] = &[
    PolicyEntry {
        hostname: CANONICAL_DOMAIN,
        region: "international",
        title: TITLE,
        description: DESCRIPTION,
    },
    PolicyEntry {
        hostname: "dock2gdansk.cn",
        region: "china",
        title: TITLE,
        description: DESCRIPTION,
    },
    PolicyEntry {
        hostname: "dock2gdansk.pl",
        region: "poland",
        title: TITLE,
        description: DESCRIPTION,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainPolicy {
    pub hostname: String,
    pub region: String,
    pub display_title: String,
    pub display_description: String,
}

impl From<&PolicyEntry> for DomainPolicy {
    fn from(entry: &PolicyEntry) -> Self {
        Self {
            hostname: entry.hostname.to_string(),
            region: entry.region.to_string(),
            display_title: entry.title.to_string(),
            display_description: entry.description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainMetadata {
    pub title: String,
    pub description: String,
    pub region: String,
}

/// `WWW.Dock2Gdansk.com.` -> `dock2gdansk.com`
pub fn normalize_hostname(hostname: &str) -> String {
    let lowered = hostname.trim().trim_end_matches('.').to_ascii_lowercase();
    match lowered.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}

fn lookup(hostname: &str) -> &'static PolicyEntry {
    let clean = normalize_hostname(hostname);
    POLICY_TABLE
        .iter()
        .find(|entry| entry.hostname == clean)
        .unwrap_or(&POLICY_TABLE[0])
}

/// Policy for a hostname; unknown hosts get the canonical entry.
pub fn resolve(hostname: &str) -> DomainPolicy {
    DomainPolicy::from(lookup(hostname))
}

pub fn metadata(hostname: &str) -> DomainMetadata {
    let entry = lookup(hostname);
    DomainMetadata {
        title: entry.title.to_string(),
        description: entry.description.to_string(),
        region: entry.region.to_string(),
    }
}

/// Whether this domain pins its language instead of following geolocation. Never, for now.
pub fn overrides_geolocation(_hostname: &str) -> bool {
    false
}

/// Language a domain falls back to when nothing else resolves.
pub fn fallback_language(_hostname: &str) -> Language {
    Language::En
}
