//! A YAML 1.1 scanner and safe value-construction layer.
//!
//! The scanner turns a character stream into tokens; the composer builds a
//! node tree from them; the safe constructor turns nodes into generic
//! values restricted to a fixed allow-list of shapes (null, boolean,
//! integer, float, binary, timestamp, ordered map, pairs, set, string,
//! sequence, mapping). Nothing outside that list is ever instantiated,
//! which is the point: untrusted documents cannot name arbitrary types.
//!
//! ```
//! use safe_yaml::{load, Value};
//!
//! let value = load("a: 1\nb: [x, y]\n").unwrap();
//! assert_eq!(value.get("a"), Some(Value::Int(1)));
//! ```

pub use crate::composer::Composer;
pub use crate::construct::SafeConstructor;
pub use crate::error::Error;
pub use crate::mark::Mark;
pub use crate::node::{Node, NodeKind, NodeRef};
pub use crate::resolve::Tag;
pub use crate::scanner::Scanner;
pub use crate::timestamp::Timestamp;
pub use crate::token::{ScalarStyle, Token, TokenId, TokenKind};
pub use crate::value::Value;

mod base64;
pub mod composer;
pub mod construct;
mod error;
mod mark;
pub mod node;
pub mod resolve;
mod reader;
mod scalars;
pub mod scanner;
mod timestamp;
pub mod token;
pub mod value;

/// Load exactly one document. More than one document is an error; an empty
/// stream loads as [`Value::Null`].
pub fn load(input: &str) -> Result<Value, Error> {
    SafeConstructor::from_str(input).single_value()
}

/// Load every document in the stream, in order.
pub fn load_all(input: &str) -> Result<Vec<Value>, Error> {
    let mut constructor = SafeConstructor::from_str(input);
    let mut documents = Vec::new();
    while let Some(value) = constructor.next_value()? {
        documents.push(value);
    }
    Ok(documents)
}
