use serde::Deserialize;
use tracing::Subscriber;
use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

/// Basic tracing configuration
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    /// Pretty print
    Pretty,
    /// JSON
    Json,
    /// Compact
    Compact,
    /// Default style
    #[serde(other)]
    #[default]
    Full,
}

impl Style {
    /// A stdout formatting layer in this style
    pub fn layer<S>(self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer().with_target(true);
        match self {
            Style::Pretty => layer.pretty().boxed(),
            Style::Json => layer.json().flatten_event(true).boxed(),
            Style::Compact => layer.compact().boxed(),
            Style::Full => layer.boxed(),
        }
    }
}
