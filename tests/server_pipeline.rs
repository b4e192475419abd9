//! Server-side pipeline through the HTTP routes.

use geolang::domain_policy;
use geolang::errors::ResolveFailure;
use geolang::geo::server::{RequestView, Resolution, ServerResolver};
use geolang::geo::{classify, InboundRequest};
use geolang::server::routes;
use geolang::{Language, SignalSource};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use warp::http::HeaderMap;

async fn context_for(host: &str, path: &str, headers: &[(&str, &str)]) -> Value {
    let filter = routes(Arc::new(ServerResolver::new()), true);
    let mut request = warp::test::request().path(path).header("host", host);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let resp = request.reply(&filter).await;
    assert_eq!(resp.status().as_u16(), 200);
    serde_json::from_slice(resp.body()).unwrap()
}

#[tokio::test]
async fn test_chinese_regions_get_chinese() {
    for country in ["CN", "HK", "MO", "TW"] {
        let body = context_for("dock2gdansk.com", "/", &[("x-vercel-ip-country", country)]).await;
        assert_eq!(body["language"], "zh", "{country}");
    }
    for country in ["SG", "PL", "US", "XX"] {
        let body = context_for("dock2gdansk.com", "/", &[("x-vercel-ip-country", country)]).await;
        assert_eq!(body["language"], "en", "{country}");
    }
}

#[tokio::test]
async fn test_localhost_without_headers() {
    let body = context_for("localhost", "/", &[]).await;
    assert_eq!(body["geolocation"]["country"], "US");
    assert_eq!(body["geolocation"]["source"], "devOverride");
    assert_eq!(body["language"], "en");

    let body = context_for("127.0.0.1:5176", "/?test-country=MO", &[]).await;
    assert_eq!(body["geolocation"]["country"], "MO");
    assert_eq!(body["language"], "zh");
}

#[tokio::test]
async fn test_domain_branding_follows_host() {
    let www = context_for("www.dock2gdansk.cn", "/", &[]).await;
    let bare = context_for("dock2gdansk.cn", "/", &[]).await;
    assert_eq!(www["domain"], bare["domain"]);
    assert_eq!(bare["domain"]["region"], "china");
    assert_eq!(bare["fallbackLanguage"], "en");
}

struct ExplodingRequest;

impl RequestView for ExplodingRequest {
    fn header(&self, name: &str) -> Result<Option<String>, ResolveFailure> {
        Err(ResolveFailure::HeadersUnavailable(name.to_string()))
    }
    fn hostname(&self) -> Result<Option<String>, ResolveFailure> {
        Err(ResolveFailure::MalformedTarget("no url".to_string()))
    }
    fn query_param(&self, name: &str) -> Result<Option<String>, ResolveFailure> {
        Err(ResolveFailure::HeadersUnavailable(name.to_string()))
    }
}

#[test]
fn test_resolver_never_raises() {
    let resolution = ServerResolver::new().resolve(&ExplodingRequest);
    assert!(matches!(resolution, Resolution::Fallback(_)));
    let decision = resolution.into_decision();
    assert_eq!(decision.language, Language::En);
    assert!(!decision.is_chinese_region);
    assert_eq!(decision.signal.country_code, "");
    assert_eq!(decision.signal.source, SignalSource::None);
}

#[test]
fn test_classifier_idempotent_through_resolver() {
    let mut headers = HeaderMap::new();
    headers.insert("cf-ipcountry", "tw".parse().unwrap());
    let request = InboundRequest::new(headers, Some("example.com".to_string()), HashMap::new());
    let resolver = ServerResolver::new();

    let first = resolver.resolve(&request).into_decision();
    let second = resolver.resolve(&request).into_decision();
    assert!(first.same_outcome(&second));
    assert_eq!(classify(Some("TW")).language, first.language);
}

#[test]
fn test_domain_policy_predicates() {
    assert_eq!(
        domain_policy::resolve("www.dock2gdansk.com"),
        domain_policy::resolve("dock2gdansk.com")
    );
    assert!(!domain_policy::overrides_geolocation("dock2gdansk.cn"));
}
