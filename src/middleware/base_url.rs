use crate::config::media::MediaConfig;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::convert::Infallible;

/// Scheme and host the client used to reach us, without a trailing slash.
/// Media URLs in responses are built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBase(pub String);

impl RequestBase {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for RequestBase
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(url) = parts
            .extensions
            .get::<MediaConfig>()
            .and_then(|config| config.public_base_url.clone())
        {
            return Ok(RequestBase(url));
        }

        let scheme = header_value(parts, "x-forwarded-proto").unwrap_or("http");
        let host = header_value(parts, header::HOST.as_str())
            .or_else(|| parts.uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");

        Ok(RequestBase(format!("{scheme}://{host}")))
    }
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
