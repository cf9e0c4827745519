//! Tracing utilities for statement, pool and catalog observability.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level event with the fully substituted SQL and parameter count.
///
/// ```ignore
/// rowkit_trace_query!(sql, params);
/// ```
#[macro_export]
macro_rules! rowkit_trace_query {
    ($sql:expr, $params:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(
            sql = %$crate::value::full_sql($sql, $params),
            params = $params.len(),
            "rowkit.query"
        );
    };
}

/// Emit an error-level event for a failed statement, with the substituted SQL
/// and a captured stack trace.
#[macro_export]
macro_rules! rowkit_trace_failure {
    ($err:expr, $sql:expr, $params:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!(
            error = %$err,
            sql = %$crate::value::full_sql($sql, $params),
            backtrace = %::std::backtrace::Backtrace::force_capture(),
            "rowkit.failure"
        );
    };
}

/// Emit a debug-level event for pool lifecycle (acquire, release, close).
///
/// ```ignore
/// rowkit_trace_pool!("acquire", state.open, state.idle.len());
/// ```
#[macro_export]
macro_rules! rowkit_trace_pool {
    ($event:literal, $open:expr, $idle:expr) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(event = $event, open = $open, idle = $idle, "rowkit.pool");
    };
}

/// Emit a warn-level event with a free-form message.
#[macro_export]
macro_rules! rowkit_warn {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
    };
}

/// Emit a debug-level event with a free-form message.
#[macro_export]
macro_rules! rowkit_debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
    };
}
