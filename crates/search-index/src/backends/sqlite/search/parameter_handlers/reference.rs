//! Reference parameter SQL handler.

use crate::types::ResourceId;

use super::super::query_builder::{SqlFragment, SqlParam};

/// Handles reference parameter SQL generation.
pub struct ReferenceHandler;

impl ReferenceHandler {
    /// Builds SQL matching rows that point at `target_id`.
    ///
    /// The parameter name already fixes the path; a target type narrows
    /// further when given.
    pub fn build_sql(
        target_type: Option<&str>,
        target_id: ResourceId,
        param_offset: usize,
    ) -> SqlFragment {
        let param_num = param_offset + 1;

        match target_type {
            Some(target_type) => SqlFragment::with_params(
                format!(
                    "reference_target = ?{} AND reference_type = ?{}",
                    param_num,
                    param_num + 1
                ),
                vec![
                    SqlParam::integer(target_id.as_i64()),
                    SqlParam::string(target_type),
                ],
            ),
            None => SqlFragment::with_params(
                format!("reference_target = ?{}", param_num),
                vec![SqlParam::integer(target_id.as_i64())],
            ),
        }
    }
}
