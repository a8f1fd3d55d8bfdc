//! Logging integration.
//!
//! Configures a [`tracing`] subscriber from [`Settings`] and provides the
//! span each navigation attempt runs in.

use crate::settings::Settings;

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable events with source locations.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Production deployments always log JSON.
    pub const fn for_settings(settings: &Settings) -> Self {
        if settings.production_mode || settings.log_json {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Installs the global tracing subscriber described by `settings`.
///
/// `settings.log_level` accepts any `EnvFilter` directive; an unparsable one
/// falls back to `info`. Only the first call in a process installs anything.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::Subscriber::builder().with_env_filter(filter).with_target(true);

    let installed = match LogFormat::for_settings(settings) {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.with_file(true).with_line_number(true).pretty().try_init(),
    };
    if installed.is_ok() {
        tracing::debug!(level = %settings.log_level, "logging installed");
    }
}

/// Creates the span a navigation attempt runs in.
///
/// # Examples
///
/// ```
/// use wayfinder_core::logging::navigation_span;
///
/// let span = navigation_span("users/42", "router_link");
/// let _guard = span.enter();
/// tracing::debug!("resolving");
/// ```
pub fn navigation_span(location: &str, trigger: &str) -> tracing::Span {
    tracing::info_span!("navigation", location = location, trigger = trigger)
}
