//! Response security headers set on every reply.

use warp::http::header::{HeaderName, HeaderValue};
use warp::http::HeaderMap;

pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
script-src 'self' 'unsafe-inline'; \
style-src 'self' 'unsafe-inline'; \
img-src 'self' data: https:; \
font-src 'self' data:; \
connect-src 'self' https://*.amazonaws.com https://ipapi.co https://ipinfo.io https://api.ipgeolocation.io; \
frame-ancestors 'none'";

pub const PERMISSIONS_POLICY: &str = "camera=(), microphone=(), geolocation=(), payment=()";

/// Headers to add; empty when disabled.
pub fn security_headers(enabled: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if !enabled {
        return headers;
    }
    let pairs = [
        ("content-security-policy", CONTENT_SECURITY_POLICY),
        ("x-frame-options", "DENY"),
        ("x-content-type-options", "nosniff"),
        ("referrer-policy", "strict-origin-when-cross-origin"),
        ("permissions-policy", PERMISSIONS_POLICY),
    ];
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_headers() {
        let headers = security_headers(true);
        assert_eq!(headers.len(), 5);
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-content-type-options"], "nosniff");
    }

    #[test]
    fn test_disabled_headers() {
        assert!(security_headers(false).is_empty());
    }
}
