//! Number and quantity parameter SQL handler.
//!
//! Numbers are compared through `value_number_key`, a fixed-width text key
//! whose lexical order is numeric order, so comparisons keep full decimal
//! precision.

use rust_decimal::Decimal;

use crate::search::Comparator;

use super::super::query_builder::{SqlFragment, SqlParam};

/// Digits before the point. Covers `Decimal::MAX`.
const INTEGER_DIGITS: usize = 29;
/// Digits after the point. Covers the largest `Decimal` scale.
const FRACTION_DIGITS: usize = 28;

/// Encodes a decimal as an order-preserving index key.
///
/// Non-negative values are `p` followed by the zero-padded digits; negative
/// values are `n` followed by the nines' complement of their magnitude.
/// Numerically equal values (`5`, `5.00`) share a key.
pub fn decimal_index_key(value: &Decimal) -> String {
    let magnitude = value.abs().normalize().to_string();
    let (integer, fraction) = magnitude.split_once('.').unwrap_or((&magnitude, ""));
    let digits = format!(
        "{:0>iw$}{:0<fw$}",
        integer,
        fraction,
        iw = INTEGER_DIGITS,
        fw = FRACTION_DIGITS
    );

    if value.is_sign_negative() && !value.is_zero() {
        let complement: String = digits
            .chars()
            .map(|c| match c.to_digit(10) {
                Some(d) => char::from_digit(9 - d, 10).unwrap_or(c),
                None => c,
            })
            .collect();
        format!("n{}", complement)
    } else {
        format!("p{}", digits)
    }
}

/// Handles number parameter SQL generation.
pub struct NumberHandler;

impl NumberHandler {
    /// Builds SQL for a numeric comparison with optional unit constraints.
    pub fn build_sql(
        comparator: Comparator,
        value: &Decimal,
        system: Option<&str>,
        units: Option<&str>,
        param_offset: usize,
    ) -> SqlFragment {
        let mut fragment = SqlFragment::with_params(
            format!("value_number_key {} ?{}", comparator.as_sql(), param_offset + 1),
            vec![SqlParam::string(decimal_index_key(value))],
        );

        if let Some(system) = system {
            let param_num = param_offset + fragment.params.len() + 1;
            fragment = fragment.and(SqlFragment::with_params(
                format!("value_number_system = ?{}", param_num),
                vec![SqlParam::string(system)],
            ));
        }

        if let Some(units) = units {
            let param_num = param_offset + fragment.params.len() + 1;
            fragment = fragment.and(SqlFragment::with_params(
                format!("value_number_units = ?{}", param_num),
                vec![SqlParam::string(units)],
            ));
        }

        fragment
    }
}
