//! Caller context extracted from request headers.
//!
//! Every mutating endpoint threads `X-Tenant-Id`, `X-Username`, and
//! `X-Correlation-Id` into the envelopes it emits. W3C `traceparent` /
//! `tracestate` headers, when present, are carried on the envelope so the
//! consumer's handling span links back to the request's trace.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use uuid::Uuid;

use paintworks_core::envelope::{TraceContext, WrapOptions};
use paintworks_core::error::DomainError;

use crate::error::ApiError;

/// Extractor building the [`WrapOptions`] for envelopes raised by this
/// request.
#[derive(Debug)]
pub struct CallerContext(pub WrapOptions);

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parses a W3C `traceparent` header (`00-{trace-id}-{parent-id}-{flags}`).
/// Malformed values are ignored rather than rejected.
fn parse_traceparent(value: &str) -> Option<(String, String, String)> {
    let mut parts = value.split('-');
    let version = parts.next()?;
    let trace_id = parts.next()?;
    let parent_id = parts.next()?;
    let flags = parts.next()?;
    if version.len() != 2 || trace_id.len() != 32 || parent_id.len() != 16 || flags.len() != 2 {
        return None;
    }
    Some((trace_id.to_owned(), parent_id.to_owned(), flags.to_owned()))
}

fn trace_from_headers(headers: &HeaderMap) -> Option<TraceContext> {
    let raw = header_str(headers, "traceparent")?;
    let (trace_id, parent_span_id, trace_flags) = parse_traceparent(raw)?;
    Some(TraceContext {
        trace_id,
        parent_span_id: Some(parent_span_id),
        trace_flags: Some(trace_flags),
        trace_state: header_str(headers, "tracestate").map(str::to_owned),
    })
}

impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        let tenant_id = header_str(headers, "x-tenant-id")
            .map(str::to_owned)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ApiError(DomainError::Validation(
                    "X-Tenant-Id header is required".into(),
                ))
            })?;

        let username = header_str(headers, "x-username")
            .filter(|u| !u.trim().is_empty())
            .unwrap_or("anonymous")
            .to_owned();

        let correlation_id = header_str(headers, "x-correlation-id")
            .and_then(|v| v.parse::<Uuid>().ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(WrapOptions {
            tenant_id,
            username,
            correlation_id,
            causation_id: None,
            trace: trace_from_headers(headers),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::try_from(*name).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_traceparent_parses_into_trace_context() {
        let map = headers(&[
            (
                "traceparent",
                "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
            ),
            ("tracestate", "vendor=value"),
        ]);
        let trace = trace_from_headers(&map).unwrap();
        assert_eq!(trace.trace_id, "0af7651916cd43dd8448eb211c80319c");
        assert_eq!(trace.parent_span_id.as_deref(), Some("b7ad6b7169203331"));
        assert_eq!(trace.trace_flags.as_deref(), Some("01"));
        assert_eq!(trace.trace_state.as_deref(), Some("vendor=value"));
    }

    #[test]
    fn test_malformed_traceparent_is_ignored() {
        let map = headers(&[("traceparent", "not-a-traceparent")]);
        assert!(trace_from_headers(&map).is_none());
    }
}
