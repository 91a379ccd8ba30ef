//! Date parameter SQL handler.

use chrono::{DateTime, Utc};

use crate::types::datetime::to_index_text;

use super::super::query_builder::{SqlFragment, SqlParam};

/// Handles date parameter SQL generation.
pub struct DateHandler;

impl DateHandler {
    /// Builds SQL for a bounded date value.
    ///
    /// A row matches when it lies entirely within the bounds: `low >= lower`
    /// and `high <= upper`. A missing bound leaves that side open. Stored
    /// dates are fixed-width text, so text comparison is chronological.
    pub fn build_sql(
        lower: Option<&DateTime<Utc>>,
        upper: Option<&DateTime<Utc>>,
        param_offset: usize,
    ) -> SqlFragment {
        let mut fragment = SqlFragment::new("");

        if let Some(lower) = lower {
            let param_num = param_offset + fragment.params.len() + 1;
            fragment = fragment.and(SqlFragment::with_params(
                format!("value_date_low >= ?{}", param_num),
                vec![SqlParam::string(to_index_text(lower))],
            ));
        }

        if let Some(upper) = upper {
            let param_num = param_offset + fragment.params.len() + 1;
            fragment = fragment.and(SqlFragment::with_params(
                format!("value_date_high <= ?{}", param_num),
                vec![SqlParam::string(to_index_text(upper))],
            ));
        }

        if fragment.is_empty() {
            // Unbounded values never get past the predicate builder.
            return SqlFragment::new("1 = 0");
        }
        fragment
    }
}
