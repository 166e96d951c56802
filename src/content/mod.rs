//! Content-stream parsing and interpretation.

pub mod interpreter;
pub mod operators;
pub mod parser;

pub use interpreter::{
    BoundsSink, EmitContext, Interpreter, Matrix, StreamTextSink, StructuredSink, TextSink,
    TextSpan,
};
pub use operators::{Operator, TextElement};
pub use parser::parse_content_stream;
