//! Token parameter SQL handler.

use super::super::query_builder::{SqlFragment, SqlParam};

/// Handles token parameter SQL generation.
pub struct TokenHandler;

impl TokenHandler {
    /// Builds SQL for a token query value.
    ///
    /// - `system` + `code` - both must match
    /// - `system` only - any code in the system
    /// - `code` only - the code in any system, including none
    /// - neither - every token row of the parameter
    pub fn build_sql(system: Option<&str>, code: Option<&str>, param_offset: usize) -> SqlFragment {
        let param_num = param_offset + 1;

        match (system, code) {
            (Some(system), Some(code)) => SqlFragment::with_params(
                format!(
                    "value_token_system = ?{} AND value_token_code = ?{}",
                    param_num,
                    param_num + 1
                ),
                vec![SqlParam::string(system), SqlParam::string(code)],
            ),
            (Some(system), None) => SqlFragment::with_params(
                format!("value_token_system = ?{}", param_num),
                vec![SqlParam::string(system)],
            ),
            (None, Some(code)) => SqlFragment::with_params(
                format!("value_token_code = ?{}", param_num),
                vec![SqlParam::string(code)],
            ),
            (None, None) => SqlFragment::new("1 = 1"),
        }
    }
}
