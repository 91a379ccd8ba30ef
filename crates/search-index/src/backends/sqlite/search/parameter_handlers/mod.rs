//! Parameter-specific SQL handlers.
//!
//! Each handler knows how to generate the SQL condition for one row kind.
//! Placeholders are numbered from `param_offset + 1`.

mod date;
mod number;
mod reference;
mod string;
mod token;

pub use date::DateHandler;
pub use number::{NumberHandler, decimal_index_key};
pub use reference::ReferenceHandler;
pub use string::StringHandler;
pub use token::TokenHandler;
