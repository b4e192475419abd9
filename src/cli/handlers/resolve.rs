use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use warp::http::header::{HeaderName, HeaderValue};
use warp::http::HeaderMap;

use crate::geo::server::{InboundRequest, ServerResolver};
use crate::server::page_context;

/// Handler for the resolve command
pub fn handle_resolve(host: &str, headers: &[String], query: Option<&str>) -> Result<()> {
    let request = build_request(host, headers, query)?;
    let context = page_context(&ServerResolver::new(), &request);
    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

pub fn build_request(host: &str, headers: &[String], query: Option<&str>) -> Result<InboundRequest> {
    let mut map = HeaderMap::new();
    for raw in headers {
        let (name, value) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("header '{raw}' must be NAME=VALUE"))?;
        let name = HeaderName::from_bytes(name.trim().to_ascii_lowercase().as_bytes())
            .with_context(|| format!("invalid header name in '{raw}'"))?;
        let value = HeaderValue::from_str(value.trim())
            .with_context(|| format!("invalid header value in '{raw}'"))?;
        map.append(name, value);
    }

    Ok(InboundRequest::new(
        map,
        Some(host.to_string()),
        parse_query(query.unwrap_or_default())?,
    ))
}

fn parse_query(query: &str) -> Result<HashMap<String, String>> {
    let query = query.trim_start_matches('?');
    if query.is_empty() {
        return Ok(HashMap::new());
    }
    let url = reqwest::Url::parse(&format!("http://localhost/?{query}"))
        .with_context(|| format!("invalid query string '{query}'"))?;
    Ok(url.query_pairs().into_owned().collect())
}
