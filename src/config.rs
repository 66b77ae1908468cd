//! Crate-wide configuration.

use std::time::Duration;

/// Default delay used by [`Debouncer`](crate::util::Debouncer).
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Default name under which the transport stores its auth token.
pub const DEFAULT_AUTH_TOKEN_NAME: &str = "saasufy.authToken";

/// Configuration shared by the debouncer, template engine and connection options.
#[derive(Debug, Clone)]
pub struct BindConfig {
    /// Delay used when a debounce call does not specify one.
    pub debounce_delay: Duration,
    /// Emit a debug event for every template span that fails to evaluate.
    pub template_diagnostics: bool,
    /// Storage name for the transport's auth token.
    pub auth_token_name: String,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
            template_diagnostics: false,
            auth_token_name: DEFAULT_AUTH_TOKEN_NAME.to_owned(),
        }
    }
}

impl BindConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default debounce delay (builder).
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    /// Enable or disable template diagnostics (builder).
    pub fn with_template_diagnostics(mut self, enabled: bool) -> Self {
        self.template_diagnostics = enabled;
        self
    }

    /// Set the auth token storage name (builder).
    pub fn with_auth_token_name(mut self, name: impl Into<String>) -> Self {
        self.auth_token_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BindConfig::new();
        assert_eq!(config.debounce_delay, Duration::from_millis(300));
        assert!(!config.template_diagnostics);
        assert_eq!(config.auth_token_name, "saasufy.authToken");
    }

    #[test]
    fn builders() {
        let config = BindConfig::new()
            .with_debounce_delay(Duration::from_millis(50))
            .with_template_diagnostics(true)
            .with_auth_token_name("app.token");
        assert_eq!(config.debounce_delay, Duration::from_millis(50));
        assert!(config.template_diagnostics);
        assert_eq!(config.auth_token_name, "app.token");
    }
}
