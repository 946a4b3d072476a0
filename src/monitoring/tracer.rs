/*!
 * Tracing
 * Subscriber setup and per-call spans for the blocking POSIX calls
 */

use crate::core::errno::Errno;
use std::time::Instant;
use tracing::{debug, span, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - POSIX9_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("POSIX9_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_names(true)
                    .compact(),
            )
            .try_init()
    };

    if installed.is_ok() {
        debug!("Structured tracing initialized (json: {})", use_json);
    }
}

/// Span around one potentially blocking call
///
/// Records the outcome and how long the calling context was parked in it.
pub struct CallSpan {
    span: tracing::Span,
    start: Instant,
    call: &'static str,
}

impl CallSpan {
    pub fn new(call: &'static str) -> Self {
        let span = span!(
            Level::DEBUG,
            "posix_call",
            call = call,
            result = tracing::field::Empty,
            errno = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
            call,
        }
    }

    pub fn record_ok(&self) {
        self.span.record("result", "ok");
    }

    pub fn record_errno(&self, errno: Errno) {
        self.span.record("result", "error");
        self.span.record("errno", errno.code());
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for CallSpan {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_micros() as u64;
        self.span.record("duration_us", elapsed);
        let _entered = self.span.enter();
        debug!(call = self.call, duration_us = elapsed, "call finished");
    }
}
