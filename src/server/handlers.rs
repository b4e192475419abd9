use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;

use crate::domain_policy::DomainPolicy;
use crate::geo::server::{
    InboundRequest, Resolution, ServerResolver, HEADER_CF_CITY, HEADER_CF_COUNTRY,
    HEADER_VERCEL_CITY, HEADER_VERCEL_COUNTRY, HEADER_VERCEL_REGION,
};
use crate::types::{Language, LanguageDecision, SignalSource};

use super::context::RequestContext;

/// Headers echoed by the debug endpoint, in output order.
pub const DEBUG_HEADERS: &[&str] = &[
    HEADER_VERCEL_COUNTRY,
    HEADER_VERCEL_CITY,
    HEADER_VERCEL_REGION,
    "x-vercel-ip-latitude",
    "x-vercel-ip-longitude",
    HEADER_CF_COUNTRY,
    HEADER_CF_CITY,
    "x-forwarded-for",
    "x-real-ip",
    "user-agent",
    "accept-language",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationView {
    pub country: String,
    pub city: String,
    pub region: String,
    pub detected_language: Language,
    pub is_chinese_region: bool,
    pub source: SignalSource,
    pub timestamp: String,
}

impl From<&LanguageDecision> for GeolocationView {
    fn from(decision: &LanguageDecision) -> Self {
        Self {
            country: decision.signal.country_code.clone(),
            city: decision.signal.city.clone(),
            region: decision.signal.region.clone(),
            detected_language: decision.language,
            is_chinese_region: decision.is_chinese_region,
            source: decision.signal.source,
            timestamp: decision.resolved_at.to_rfc3339(),
        }
    }
}

/// Data handed to the rendering layer for one page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContext {
    pub geolocation: GeolocationView,
    pub language: Language,
    pub domain: DomainPolicy,
    pub overrides_geolocation: bool,
    pub fallback_language: Language,
}

impl From<&RequestContext> for PageContext {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            geolocation: GeolocationView::from(&ctx.decision),
            language: ctx.language,
            domain: ctx.policy.clone(),
            overrides_geolocation: ctx.overrides_geolocation,
            fallback_language: ctx.fallback_language,
        }
    }
}

pub fn page_context(resolver: &ServerResolver, request: &InboundRequest) -> PageContext {
    PageContext::from(&RequestContext::build(resolver, request))
}

/// Diagnostic echo of raw geolocation headers and the decision derived from them.
pub fn debug_report(
    resolver: &ServerResolver,
    request: &InboundRequest,
    remote: Option<SocketAddr>,
) -> Value {
    let headers = request.headers();
    let raw = |name: &str| -> Option<String> {
        headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    };

    let mut echoed = serde_json::Map::new();
    for name in DEBUG_HEADERS {
        echoed.insert(name.to_string(), json!(raw(*name)));
    }

    let detected_country = raw(HEADER_VERCEL_COUNTRY)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| raw(HEADER_CF_COUNTRY).filter(|v| !v.trim().is_empty()));

    let client_ip = raw("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|v| !v.is_empty())
        .or_else(|| raw("x-real-ip"))
        .or_else(|| remote.map(|addr| addr.ip().to_string()));

    let resolution = resolver.resolve(request);
    let fallback_reason = match &resolution {
        Resolution::Fallback(reason) => Some(reason.to_string()),
        Resolution::Resolved(_) => None,
    };
    let decision = resolution.into_decision();

    json!({
        "geolocation": {
            "clientIP": client_ip,
            "timestamp": Utc::now().to_rfc3339(),
            "headers": Value::Object(echoed),
            "detectedCountry": detected_country,
            "detectedLanguage": decision.language,
            "decision": GeolocationView::from(&decision),
            "fallbackReason": fallback_reason,
        }
    })
}
