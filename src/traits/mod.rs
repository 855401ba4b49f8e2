pub mod sink;
pub mod source;

pub use sink::{Sink, SinkContext, SinkWriter};
pub use source::{Source, SourceContext};
