pub mod annotate;
pub mod pattern;
pub mod source;

pub use annotate::{Annotator, Fact, LINE_LIMIT};
pub use pattern::{scan, Insn, Matched};
pub use source::{inputs_from_args, Input, SourceError};
