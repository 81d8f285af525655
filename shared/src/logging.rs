//! Shared logging utilities for consistent tracing across the scanner

use crate::types::ComponentId;
use chrono::{DateTime, Utc};

/// Build the filter directive for a base level
pub fn filter_directive(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    format!("scanner={base_level},shared={base_level},reqwest=warn,hyper=warn")
}

/// Initialize tracing subscriber with an optional log level
///
/// `RUST_LOG` wins over the level argument when it is set.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(log_level)));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// Clock time attached to every component event
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Emit a tracing event at `$level` tagged with a component and the clock
/// time; the level macros below delegate here
#[macro_export]
macro_rules! component_event {
    ($level:ident, $component:expr, $($arg:tt)*) => {
        tracing::$level!(
            component = %$component,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        )
    };
}

#[macro_export]
macro_rules! component_info {
    ($component:expr, $($arg:tt)*) => { $crate::component_event!(info, $component, $($arg)*) };
}

#[macro_export]
macro_rules! component_warn {
    ($component:expr, $($arg:tt)*) => { $crate::component_event!(warn, $component, $($arg)*) };
}

#[macro_export]
macro_rules! component_error {
    ($component:expr, $($arg:tt)*) => { $crate::component_event!(error, $component, $($arg)*) };
}

#[macro_export]
macro_rules! component_debug {
    ($component:expr, $($arg:tt)*) => { $crate::component_event!(debug, $component, $($arg)*) };
}

pub fn log_startup(component: ComponentId, details: &str) {
    crate::component_info!(component, "🚀 Starting {}", details);
}

pub fn log_shutdown(component: ComponentId, reason: &str) {
    crate::component_info!(component, "🛑 Shutting down: {}", reason);
}

/// Log a failed step with the error as a structured field
pub fn log_error(component: ComponentId, context: &str, error: &dyn std::fmt::Display) {
    crate::component_error!(component, error = %error, "❌ {} failed: {}", context, error);
}

pub fn log_success(component: ComponentId, message: &str) {
    crate::component_info!(component, "✅ {}", message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive_uses_level() {
        assert_eq!(
            filter_directive(Some("debug")),
            "scanner=debug,shared=debug,reqwest=warn,hyper=warn"
        );
        assert!(filter_directive(None).starts_with("scanner=info"));
    }

    #[test]
    fn test_macros_expand_without_subscriber() {
        crate::component_info!(ComponentId::Intake, "info {}", 1);
        crate::component_warn!(ComponentId::Dispatcher, "warn");
        crate::component_debug!(ComponentId::Host, payload = "abc", "debug");
        crate::component_error!(ComponentId::Host, "error {}", "x");
    }
}
