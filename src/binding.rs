//! The usual render path: template a sanitized snapshot, then project the
//! result onto an element tree.

use crate::config::BindConfig;
use crate::connection::ConnectionState;
use crate::dom::{Dom, NodeId};
use crate::projection::project;
use crate::reactive::SafeSnapshot;
use crate::template::TemplateEngine;
use crate::value::{Record, Value};

/// A template paired with the consumer declaration that receives its output.
#[derive(Debug, Clone)]
pub struct ViewBinding {
    template: String,
    consumers: String,
    engine: TemplateEngine,
}

impl ViewBinding {
    pub fn new(template: impl Into<String>, consumers: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            consumers: consumers.into(),
            engine: TemplateEngine::default(),
        }
    }

    /// Use an engine configured from `config` (builder).
    pub fn with_config(mut self, config: &BindConfig) -> Self {
        self.engine = TemplateEngine::with_config(config);
        self
    }

    /// Use a specific engine, e.g. one with extra formatters (builder).
    pub fn with_engine(mut self, engine: TemplateEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn consumers(&self) -> &str {
        &self.consumers
    }

    /// Render the template against a snapshot.
    ///
    /// A model renders once with its fields in scope. A collection renders
    /// once per record and the pieces are concatenated in order.
    pub fn render(&self, snapshot: &SafeSnapshot, connection: Option<&ConnectionState>) -> String {
        match snapshot {
            SafeSnapshot::Model(record) => self.render_record(record, connection),
            SafeSnapshot::Collection(records) => records
                .iter()
                .map(|record| self.render_record(record, connection))
                .collect(),
        }
    }

    pub fn render_record(&self, record: &Record, connection: Option<&ConnectionState>) -> String {
        self.engine.render(&self.template, record, connection)
    }

    /// Render and write the output as content (or attribute value) to every
    /// consumer under `root`. Returns the rendered text.
    pub fn apply(
        &self,
        dom: &mut Dom,
        root: NodeId,
        snapshot: &SafeSnapshot,
        connection: Option<&ConnectionState>,
    ) -> String {
        let rendered = self.render(snapshot, connection);
        project(dom, root, &self.consumers, &Value::from(rendered.as_str()));
        tracing::trace!(consumers = %self.consumers, "view applied");
        rendered
    }
}
