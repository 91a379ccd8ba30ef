//! Core storage traits.
//!
//! - [`ResourceStore`] - atomic persistence of resource bodies and index rows
//! - [`ReadSession`] - one read transaction spanning a whole search
//!
//! Backends live under [`crate::backends`].

pub mod store;

pub use store::{ReadSession, ResourceStore};
