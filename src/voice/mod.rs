//! Voice input: transcript session handling and utterance parsing.

mod dates;
mod parser;
mod session;

pub use dates::*;
pub use parser::*;
pub use session::*;
