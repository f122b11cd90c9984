/*!
 * Structured Tracing
 * Tracing bootstrap and per-frame spans for the dispatch path
 */

use crate::core::types::ProcedureKey;
use crate::mediator::types::SyscallError;
use std::time::Instant;
use tracing::{debug, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing.
///
/// Environment variables:
/// - `RUST_LOG`: log level filter (default: info)
/// - `KERNEL_TRACE_JSON`: emit JSON-formatted output when `1`/`true`
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("KERNEL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::FULL),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .init();
    }
}

/// Generate a unique trace ID for dispatch correlation
#[must_use]
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span covering one call frame's execution, with structured fields for
/// the bubbled status and any trap cause
pub struct FrameSpan {
    span: tracing::Span,
    start: Instant,
    trace_id: String,
}

impl FrameSpan {
    #[must_use]
    pub fn new(procedure: &ProcedureKey, depth: usize) -> Self {
        let trace_id = generate_trace_id();

        let span = span!(
            Level::DEBUG,
            "frame",
            trace_id = %trace_id,
            procedure = %procedure,
            depth = depth,
            status = tracing::field::Empty,
            trap = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Record the frame's bubbled status
    pub fn record_status(&self, status: u32) {
        self.span.record("status", status);
    }

    /// Record a trap with its cause and resulting status
    pub fn record_trap(&self, cause: &SyscallError) {
        self.span.record("trap", tracing::field::display(cause));
        self.span.record("status", cause.status_code());
        let _entered = self.span.enter();
        warn!(trace_id = %self.trace_id, cause = %cause, "frame trapped");
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for FrameSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();
        debug!(
            trace_id = %self.trace_id,
            duration_us = duration.as_micros() as u64,
            "frame completed"
        );
    }
}

/// Helper to open a frame span
#[inline]
#[must_use]
pub fn span_frame(procedure: &ProcedureKey, depth: usize) -> FrameSpan {
    FrameSpan::new(procedure, depth)
}
