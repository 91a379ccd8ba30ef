//! Search tests grouped by value kind.

pub mod composition_tests;
pub mod date_tests;
pub mod number_tests;
pub mod reference_tests;
pub mod string_tests;
pub mod token_tests;
