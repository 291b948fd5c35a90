use serde::Serialize;
use serde_json::Value;

/// Everything a template needs: which template, the data it consumes and the
/// one-shot messages to show on top of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub template: &'static str,
    pub context: Value,
    pub flashes: Vec<String>,
}

impl Page {
    pub fn new(template: &'static str, context: Value) -> Self {
        Self {
            template,
            context,
            flashes: Vec::new(),
        }
    }

    pub fn with_flash(mut self, message: impl Into<String>) -> Self {
        self.flashes.push(message.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    MissingTemplate(String),
    #[error("Failed to serialize page {template}: {source}")]
    Serialize {
        template: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Port to the presentation layer.
///
/// The server ships [`JsonPageRenderer`]; a template engine plugs in here.
#[cfg_attr(test, mockall::automock)]
pub trait PageRenderer: Send + Sync {
    fn render(&self, page: &Page) -> Result<RenderedPage, RenderError>;
}

/// Writes the page itself as JSON.
pub struct JsonPageRenderer;

impl PageRenderer for JsonPageRenderer {
    fn render(&self, page: &Page) -> Result<RenderedPage, RenderError> {
        let body = serde_json::to_string_pretty(page).map_err(|source| RenderError::Serialize {
            template: page.template,
            source,
        })?;
        Ok(RenderedPage {
            content_type: "application/json",
            body,
        })
    }
}
