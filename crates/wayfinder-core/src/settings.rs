//! Router settings.
//!
//! [`Settings`] holds everything a router reads at runtime. Values are plain
//! data so they can be loaded from TOML or JSON by
//! [`settings_loader`](crate::settings_loader) and shared behind an `Arc`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default number of forward/reroute hops allowed in one navigation attempt.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Runtime configuration for a router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Error pages ──────────────────────────────────────────────────

    /// When `true`, error views show a minimal message only. When `false`,
    /// they include near-miss route diagnostics and the causing error chain.
    pub production_mode: bool,

    // ── Navigation ───────────────────────────────────────────────────

    /// Maximum forward/reroute hops in one navigation attempt.
    pub max_redirects: usize,
    /// Retry an unmatched path with its trailing slash added or removed.
    pub toggle_trailing_slash: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "wayfinder_router=trace").
    pub log_level: String,
    /// Emit structured JSON log lines even outside production mode.
    pub log_json: bool,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Application settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            production_mode: false,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            toggle_trailing_slash: true,
            log_level: "info".to_string(),
            log_json: false,
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns `true` when error views may show diagnostics.
    pub const fn verbose_errors(&self) -> bool {
        !self.production_mode
    }

    /// Returns a production configuration with defaults everywhere else.
    pub fn production() -> Self {
        Self {
            production_mode: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(!s.production_mode);
        assert!(s.verbose_errors());
        assert_eq!(s.max_redirects, DEFAULT_MAX_REDIRECTS);
        assert!(s.toggle_trailing_slash);
        assert_eq!(s.log_level, "info");
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_production_disables_verbose_errors() {
        let s = Settings::production();
        assert!(s.production_mode);
        assert!(!s.verbose_errors());
        assert_eq!(s.max_redirects, DEFAULT_MAX_REDIRECTS);
    }

    #[test]
    fn test_serde_round_trip() {
        let s = Settings {
            max_redirects: 3,
            ..Settings::default()
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_redirects, 3);
    }
}
