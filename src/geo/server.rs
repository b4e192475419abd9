//! Server-side language resolution from edge geolocation headers.
//!
//! Order of precedence:
//! 1. `x-vercel-ip-country`, then `cf-ipcountry`
//! 2. on a development host only, the `test-country` query parameter (default `US`)
//! 3. nothing: empty signal, English
//!
//! Any failure while reading the request produces [`Resolution::Fallback`], which callers
//! turn into the terminal default decision. Resolution never blocks page delivery.

use crate::errors::ResolveFailure;
use crate::geo::classifier::{decide, is_country_code, normalize_country, RegionSet};
use crate::types::{GeoSignal, LanguageDecision, SignalSource};
use std::collections::HashMap;
use tracing::{debug, error, info};
use warp::http::uri::Authority;
use warp::http::header::HOST;
use warp::http::HeaderMap;

pub const HEADER_VERCEL_COUNTRY: &str = "x-vercel-ip-country";
pub const HEADER_VERCEL_CITY: &str = "x-vercel-ip-city";
pub const HEADER_VERCEL_REGION: &str = "x-vercel-ip-country-region";
pub const HEADER_CF_COUNTRY: &str = "cf-ipcountry";
pub const HEADER_CF_CITY: &str = "cf-ipcity";

pub const TEST_COUNTRY_PARAM: &str = "test-country";
pub const DEFAULT_DEV_COUNTRY: &str = "US";
pub const DEVELOPMENT_HOSTS: &[&str] = &["localhost", "127.0.0.1"];

/// Read access to an inbound request. Every accessor may fail.
pub trait RequestView {
    fn header(&self, name: &str) -> Result<Option<String>, ResolveFailure>;
    /// Target hostname without port.
    fn hostname(&self) -> Result<Option<String>, ResolveFailure>;
    fn query_param(&self, name: &str) -> Result<Option<String>, ResolveFailure>;
}

/// Already-materialised request parts, as handed over by the HTTP layer.
///
/// The hostname comes from an explicit authority when one is given, else the `Host` header.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    headers: HeaderMap,
    authority: Option<String>,
    query: HashMap<String, String>,
}

impl InboundRequest {
    pub fn new(
        headers: HeaderMap,
        authority: Option<String>,
        query: HashMap<String, String>,
    ) -> Self {
        Self {
            headers,
            authority,
            query,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl RequestView for InboundRequest {
    fn header(&self, name: &str) -> Result<Option<String>, ResolveFailure> {
        match self.headers.get(name) {
            None => Ok(None),
            Some(value) => value
                .to_str()
                .map(|s| Some(s.trim().to_string()))
                .map_err(|_| ResolveFailure::MalformedHeader(name.to_string())),
        }
    }

    fn hostname(&self) -> Result<Option<String>, ResolveFailure> {
        let raw = match (&self.authority, self.headers.get(HOST)) {
            (Some(authority), _) => authority.as_str(),
            (None, Some(value)) => value
                .to_str()
                .map_err(|_| ResolveFailure::MalformedTarget("host header is not text".to_string()))?,
            (None, None) => return Ok(None),
        };
        let authority: Authority = raw
            .parse()
            .map_err(|e| ResolveFailure::MalformedTarget(format!("{raw}: {e}")))?;
        Ok(Some(authority.host().to_ascii_lowercase()))
    }

    fn query_param(&self, name: &str) -> Result<Option<String>, ResolveFailure> {
        Ok(self.query.get(name).cloned())
    }
}

/// Outcome of one resolution. The caller has to handle both arms.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(LanguageDecision),
    Fallback(ResolveFailure),
}

impl Resolution {
    pub fn into_decision(self) -> LanguageDecision {
        match self {
            Resolution::Resolved(decision) => decision,
            Resolution::Fallback(_) => LanguageDecision::fallback(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback(_))
    }
}

#[derive(Debug, Clone)]
pub struct ServerResolver {
    development_hosts: Vec<String>,
    default_dev_country: String,
}

impl Default for ServerResolver {
    fn default() -> Self {
        Self {
            development_hosts: DEVELOPMENT_HOSTS.iter().map(|h| h.to_string()).collect(),
            default_dev_country: DEFAULT_DEV_COUNTRY.to_string(),
        }
    }
}

impl ServerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_development_host(&self, hostname: &str) -> bool {
        self.development_hosts
            .iter()
            .any(|h| h.eq_ignore_ascii_case(hostname))
    }

    pub fn resolve(&self, request: &dyn RequestView) -> Resolution {
        match self.try_resolve(request) {
            Ok(decision) => {
                info!(
                    country = %decision.signal.country_code,
                    language = %decision.language,
                    source = ?decision.signal.source,
                    "resolved request language"
                );
                Resolution::Resolved(decision)
            }
            Err(failure) => {
                error!(%failure, "language resolution failed, serving default");
                Resolution::Fallback(failure)
            }
        }
    }

    fn try_resolve(&self, request: &dyn RequestView) -> Result<LanguageDecision, ResolveFailure> {
        let header_country =
            first_country_header(request, &[HEADER_VERCEL_COUNTRY, HEADER_CF_COUNTRY])?;
        let city = first_header(request, &[HEADER_VERCEL_CITY, HEADER_CF_CITY])?;
        let region = request.header(HEADER_VERCEL_REGION)?.unwrap_or_default();
        let hostname = request.hostname()?.unwrap_or_default();
        let is_development = self.is_development_host(&hostname);

        // Headers win; the override is only consulted on development hosts.
        let signal = match header_country {
            Some(code) => GeoSignal::new(code, SignalSource::Header),
            None if is_development => {
                let code = self.development_country(request)?;
                debug!(%code, %hostname, "development mode, using test country");
                GeoSignal::new(code, SignalSource::DevOverride)
            }
            None => GeoSignal::empty(),
        }
        .with_location(city, region);

        Ok(decide(signal, RegionSet::Server))
    }

    fn development_country(&self, request: &dyn RequestView) -> Result<String, ResolveFailure> {
        let Some(raw) = request.query_param(TEST_COUNTRY_PARAM)? else {
            return Ok(self.default_dev_country.clone());
        };
        let code = normalize_country(&raw);
        if is_country_code(&code) {
            Ok(code)
        } else {
            debug!(value = %raw, "ignoring invalid test-country override");
            Ok(self.default_dev_country.clone())
        }
    }
}

fn first_country_header(
    request: &dyn RequestView,
    names: &[&str],
) -> Result<Option<String>, ResolveFailure> {
    for name in names {
        if let Some(raw) = request.header(name)? {
            let code = normalize_country(&raw);
            if is_country_code(&code) {
                return Ok(Some(code));
            }
            if !code.is_empty() {
                debug!(header = *name, value = %raw, "ignoring malformed country header");
            }
        }
    }
    Ok(None)
}

fn first_header(request: &dyn RequestView, names: &[&str]) -> Result<String, ResolveFailure> {
    for name in names {
        if let Some(value) = request.header(name)? {
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;
    use warp::http::HeaderValue;

    fn request(host: &str, headers: &[(&'static str, &str)], query: &[(&str, &str)]) -> InboundRequest {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        let query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        InboundRequest::new(map, Some(host.to_string()), query)
    }

    struct BrokenRequest;

    impl RequestView for BrokenRequest {
        fn header(&self, _name: &str) -> Result<Option<String>, ResolveFailure> {
            Err(ResolveFailure::HeadersUnavailable("accessor failed".to_string()))
        }
        fn hostname(&self) -> Result<Option<String>, ResolveFailure> {
            Ok(Some("example.com".to_string()))
        }
        fn query_param(&self, _name: &str) -> Result<Option<String>, ResolveFailure> {
            Ok(None)
        }
    }

    #[test]
    fn test_vercel_header_on_production_host() {
        let req = request("example.com", &[(HEADER_VERCEL_COUNTRY, "CN")], &[]);
        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.language, Language::Zh);
        assert_eq!(decision.signal.source, SignalSource::Header);
        assert_eq!(decision.signal.country_code, "CN");
    }

    #[test]
    fn test_cloudflare_header_is_secondary() {
        let req = request(
            "dock2gdansk.com",
            &[(HEADER_CF_COUNTRY, "hk"), (HEADER_CF_CITY, "Hong Kong")],
            &[],
        );
        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.signal.country_code, "HK");
        assert_eq!(decision.signal.city, "Hong Kong");
        assert_eq!(decision.language, Language::Zh);

        let req = request(
            "dock2gdansk.com",
            &[(HEADER_VERCEL_COUNTRY, "PL"), (HEADER_CF_COUNTRY, "CN")],
            &[],
        );
        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.signal.country_code, "PL");
        assert_eq!(decision.language, Language::En);
    }

    #[test]
    fn test_dev_override_on_localhost() {
        let req = request("localhost:5176", &[], &[(TEST_COUNTRY_PARAM, "TW")]);
        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.language, Language::Zh);
        assert_eq!(decision.signal.source, SignalSource::DevOverride);
        assert_eq!(decision.signal.country_code, "TW");
    }

    #[test]
    fn test_dev_default_is_us() {
        let req = request("127.0.0.1", &[], &[]);
        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.signal.country_code, "US");
        assert_eq!(decision.language, Language::En);
        assert_eq!(decision.signal.source, SignalSource::DevOverride);
    }

    #[test]
    fn test_invalid_override_falls_back_to_us() {
        let req = request("localhost", &[], &[(TEST_COUNTRY_PARAM, "China")]);
        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.signal.country_code, "US");
    }

    #[test]
    fn test_override_ignored_when_headers_present() {
        let req = request(
            "localhost",
            &[(HEADER_VERCEL_COUNTRY, "DE")],
            &[(TEST_COUNTRY_PARAM, "CN")],
        );
        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.signal.country_code, "DE");
        assert_eq!(decision.signal.source, SignalSource::Header);
    }

    #[test]
    fn test_override_ignored_on_production_host() {
        let req = request("dock2gdansk.com", &[], &[(TEST_COUNTRY_PARAM, "CN")]);
        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.language, Language::En);
        assert_eq!(decision.signal.country_code, "");
        assert_eq!(decision.signal.source, SignalSource::None);
    }

    #[test]
    fn test_region_and_city_are_carried() {
        let req = request(
            "example.com",
            &[
                (HEADER_VERCEL_COUNTRY, "CN"),
                (HEADER_VERCEL_CITY, "Shanghai"),
                (HEADER_VERCEL_REGION, "SH"),
            ],
            &[],
        );
        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.signal.city, "Shanghai");
        assert_eq!(decision.signal.region, "SH");
    }

    #[test]
    fn test_throwing_accessor_yields_default() {
        let resolution = ServerResolver::new().resolve(&BrokenRequest);
        assert!(resolution.is_fallback());
        let decision = resolution.into_decision();
        assert_eq!(decision.language, Language::En);
        assert!(!decision.is_chinese_region);
        assert_eq!(decision.signal.source, SignalSource::None);
    }

    #[test]
    fn test_non_utf8_header_yields_default() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HEADER_VERCEL_COUNTRY,
            HeaderValue::from_bytes(&[0xC3, 0x28]).unwrap(),
        );
        let req = InboundRequest::new(headers, Some("example.com".to_string()), HashMap::new());
        let resolution = ServerResolver::new().resolve(&req);
        assert_eq!(
            resolution,
            Resolution::Fallback(ResolveFailure::MalformedHeader(
                HEADER_VERCEL_COUNTRY.to_string()
            ))
        );
    }

    #[test]
    fn test_hostname_from_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("LOCALHOST:5176"));
        let req = InboundRequest::new(headers, None, HashMap::new());
        assert_eq!(req.hostname().unwrap().as_deref(), Some("localhost"));

        let decision = ServerResolver::new().resolve(&req).into_decision();
        assert_eq!(decision.signal.source, SignalSource::DevOverride);
    }

    #[test]
    fn test_malformed_authority_yields_default() {
        let req = InboundRequest::new(HeaderMap::new(), Some("bad host".to_string()), HashMap::new());
        assert!(ServerResolver::new().resolve(&req).is_fallback());
    }
}
