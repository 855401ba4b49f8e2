use crate::engine::Environment;
use crate::value::Value;

/// What a sink is told about the node it drains.
#[derive(Clone)]
pub struct SinkContext {
    /// Dotted path of the sink node
    pub path: String,
    pub config: Value,
    pub env: Environment,
}

/// A side effect attached to a sink node.
///
/// `open` is called once per compiled instance of the node; the writer then
/// sees every value reaching the node and is closed when its stream ends.
pub trait Sink: Send + Sync {
    fn open(&self, ctx: SinkContext) -> Box<dyn SinkWriter>;

    fn name(&self) -> &'static str;
}

pub trait SinkWriter: Send {
    fn write(&mut self, value: Value);

    fn close(&mut self) {}
}
