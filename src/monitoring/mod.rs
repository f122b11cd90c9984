/*!
 * Monitoring
 * Tracing bootstrap and dispatch-path spans
 */

pub mod tracer;

pub use tracer::{generate_trace_id, init_tracing, span_frame, FrameSpan};
