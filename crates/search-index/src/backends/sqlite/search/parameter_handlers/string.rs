//! String parameter SQL handler.

use super::super::query_builder::{SqlFragment, SqlParam};

/// Handles string parameter SQL generation.
pub struct StringHandler;

impl StringHandler {
    /// Builds SQL for an already normalized string value.
    ///
    /// Stored strings carry the same normalization, so plain equality is
    /// case-insensitive in effect.
    pub fn build_sql(value: &str, param_offset: usize) -> SqlFragment {
        SqlFragment::with_params(
            format!("value_string = ?{}", param_offset + 1),
            vec![SqlParam::string(value)],
        )
    }
}
