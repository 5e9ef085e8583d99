// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # OpenTelemetry Integration for Management API Calls
//!
//! This module propagates the current trace context into the headers of outgoing
//! management API requests, using whatever text-map propagator the host process
//! installed globally. With no propagator installed nothing is injected.

use opentelemetry::{propagation::Injector, Context};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::error;

/// An adapter for injecting OpenTelemetry context into HTTP request headers.
pub(crate) struct HeaderInjector<'a> {
    headers: &'a mut HeaderMap,
}

impl<'a> HeaderInjector<'a> {
    pub(crate) fn new(headers: &'a mut HeaderMap) -> Self {
        Self { headers }
    }
}

impl Injector for HeaderInjector<'_> {
    /// Sets a trace context key-value pair as a request header.
    ///
    /// Keys or values that are not valid in an HTTP header are dropped.
    fn set(&mut self, key: &str, value: String) {
        let name = match HeaderName::from_bytes(key.to_lowercase().as_bytes()) {
            Ok(name) => name,
            Err(err) => {
                error!(error = err.to_string(), key, "invalid trace header name");
                return;
            }
        };

        match HeaderValue::from_str(&value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(err) => error!(error = err.to_string(), key, "invalid trace header value"),
        }
    }
}

/// Builds the trace headers for a request made within `ctx`.
pub(crate) fn trace_headers(ctx: &Context) -> HeaderMap {
    let mut headers = HeaderMap::new();

    opentelemetry::global::get_text_map_propagator(|propagator| {
        propagator.inject_context(ctx, &mut HeaderInjector::new(&mut headers))
    });

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injector_lowercases_header_names() {
        let mut headers = HeaderMap::new();
        let mut injector = HeaderInjector::new(&mut headers);

        injector.set(
            "Traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".to_owned(),
        );

        assert_eq!(
            headers.get("traceparent").map(|v| v.to_str().unwrap()),
            Some("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")
        );
    }

    #[test]
    fn injector_drops_invalid_values() {
        let mut headers = HeaderMap::new();
        HeaderInjector::new(&mut headers).set("tracestate", "bad\nvalue".to_owned());
        HeaderInjector::new(&mut headers).set("bad header", "value".to_owned());

        assert!(headers.is_empty());
    }

    #[test]
    fn no_headers_without_an_active_span() {
        assert!(trace_headers(&Context::new()).is_empty());
    }
}
