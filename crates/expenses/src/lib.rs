//! Expense summaries for the dashboard.
//!
//! Everything in this crate is a pure function of its inputs: the expense rows
//! handed over by the backend are read, never modified, and malformed values
//! resolve to safe defaults (`0`, empty vectors, `"Uncategorized"`) instead of
//! errors.

pub use aggregate::{Aggregator, CategoryTotal, MonthGroup, MonthKey, Period};
pub use amount::{amount_of, parse_numeric_value, sum};
pub use category::{UNCATEGORIZED, category_of};

mod aggregate;
mod amount;
mod category;
pub mod dates;
pub mod format;
pub mod plaid;
