use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::engine::Environment;
use crate::value::Value;

/// What a source is told about the node it feeds.
#[derive(Clone)]
pub struct SourceContext {
    /// Dotted path of the source node
    pub path: String,
    pub config: Value,
    pub env: Environment,
}

/// An asynchronous producer of values for one root node.
///
/// `produce` sends values until it is exhausted, the run is shut down, or the
/// receiving side is dropped (the stream reduced). Send errors mean the
/// consumer is gone and are not worth reporting.
#[async_trait]
pub trait Source: Send + Sync {
    async fn produce(&self, ctx: SourceContext, tx: mpsc::UnboundedSender<Value>);

    fn name(&self) -> &'static str;
}
