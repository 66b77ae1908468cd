//! Template rendering: `{{ expression }}` spans evaluated against a composed context.
//!
//! Each span is evaluated on its own. A span that fails to parse or evaluate
//! is left in the output exactly as written.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::BindConfig;
use crate::connection::ConnectionState;
use crate::expr::{self, FormatterRegistry, Scope};
use crate::sanitize::{decode_expression, escape, INVALID_PLACEHOLDER};
use crate::value::{Record, Value};

/// Name under which the connection view is bound.
pub const CONNECTION_BINDING: &str = "socket";

/// Shortest `{{ ... }}` spans, across line breaks.
static SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("span pattern is valid"));

/// Renders templates against a formatter registry.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    formatters: FormatterRegistry,
    diagnostics: bool,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(FormatterRegistry::builtin())
    }
}

impl TemplateEngine {
    /// An engine over the given formatters, diagnostics off.
    pub fn new(formatters: FormatterRegistry) -> Self {
        Self {
            formatters,
            diagnostics: false,
        }
    }

    /// An engine with the built-in formatters and settings from `config`.
    pub fn with_config(config: &BindConfig) -> Self {
        Self::default().diagnostics(config.template_diagnostics)
    }

    /// Enable or disable the debug event for failed spans (builder).
    pub fn diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    /// The formatter registry, for registering extra formatters.
    pub fn formatters_mut(&mut self) -> &mut FormatterRegistry {
        &mut self.formatters
    }

    /// Build the evaluation scope: formatters, then the connection view (if
    /// any), then caller data. Later layers win on name collisions.
    pub fn scope<'a>(&'a self, data: &Record, connection: Option<&ConnectionState>) -> Scope<'a> {
        let mut scope = Scope::new(&self.formatters).with_formatters();
        if let Some(connection) = connection {
            scope.set(CONNECTION_BINDING, connection.to_value());
        }
        scope.extend(data.iter().map(|(key, value)| (key.clone(), value.clone())));
        scope
    }

    /// Substitute every span in `template` with its escaped result.
    pub fn render(
        &self,
        template: &str,
        data: &Record,
        connection: Option<&ConnectionState>,
    ) -> String {
        if !template.contains("{{") {
            return template.to_owned();
        }
        let scope = self.scope(data, connection);

        SPAN.replace_all(template, |caps: &Captures<'_>| {
            let source = decode_expression(&caps[1]);
            match expr::evaluate(&source, &scope) {
                Ok(value) => escape(&value)
                    .display_string()
                    .unwrap_or_else(|| INVALID_PLACEHOLDER.to_owned()),
                Err(error) => {
                    if self.diagnostics {
                        tracing::debug!(expression = %source, %error, "template span left unrendered");
                    }
                    caps[0].to_owned()
                }
            }
        })
        .into_owned()
    }
}

/// Render with the built-in formatters and no diagnostics.
pub fn render_template(
    template: &str,
    data: &Record,
    connection: Option<&ConnectionState>,
) -> String {
    TemplateEngine::default().render(template, data, connection)
}
