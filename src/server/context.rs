use crate::domain_policy::{self, DomainPolicy};
use crate::geo::server::{InboundRequest, RequestView, ServerResolver};
use crate::types::{Language, LanguageDecision};
use tracing::debug;

/// Everything resolved for one request before rendering starts.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub decision: LanguageDecision,
    /// Language actually served after domain policy was consulted.
    pub language: Language,
    pub hostname: String,
    pub policy: DomainPolicy,
    pub overrides_geolocation: bool,
    pub fallback_language: Language,
}

impl RequestContext {
    pub fn build(resolver: &ServerResolver, request: &InboundRequest) -> Self {
        let decision = resolver.resolve(request).into_decision();
        // A malformed host was already reported by the resolver; branding just uses the default.
        let hostname = request.hostname().ok().flatten().unwrap_or_default();
        let policy = domain_policy::resolve(&hostname);
        let overrides_geolocation = domain_policy::overrides_geolocation(&hostname);
        let fallback_language = domain_policy::fallback_language(&hostname);

        let language = if overrides_geolocation {
            debug!(%hostname, language = %fallback_language, "domain pins language");
            fallback_language
        } else {
            decision.language
        };

        Self {
            decision,
            language,
            hostname,
            policy,
            overrides_geolocation,
            fallback_language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::server::HEADER_VERCEL_COUNTRY;
    use std::collections::HashMap;
    use warp::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_domain_never_vetoes_geolocation() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_VERCEL_COUNTRY, HeaderValue::from_static("CN"));
        let request = InboundRequest::new(
            headers,
            Some("www.dock2gdansk.pl".to_string()),
            HashMap::new(),
        );

        let ctx = RequestContext::build(&ServerResolver::new(), &request);
        assert_eq!(ctx.language, Language::Zh);
        assert_eq!(ctx.policy.region, "poland");
        assert!(!ctx.overrides_geolocation);
        assert_eq!(ctx.fallback_language, Language::En);
    }
}
