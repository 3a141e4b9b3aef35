pub mod error;
pub mod model;
pub mod output;
pub mod trace;
pub mod value;

pub use error::{DialogueError, ErrorKind};
pub use model::*;
pub use output::*;
pub use trace::{DialogueTrace, DialogueTraceNode};
pub use value::*;
