use std::borrow::Cow;

use api_types::expense::ExpenseRecord;

use crate::format::snake_to_title_case;

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Display category of an expense.
///
/// Lookups run in order and stop at the first non-empty value: the explicit
/// `ExpenseCategory`, the Plaid primary category (title-cased), the Plaid
/// merchant name, the Plaid transaction name, then [`UNCATEGORIZED`].
pub fn category_of(expense: &ExpenseRecord) -> Cow<'_, str> {
    present(&expense.expense_category)
        .map(Cow::Borrowed)
        .or_else(|| {
            present(&expense.plaid_personal_finance_category_primary)
                .map(|primary| Cow::Owned(snake_to_title_case(primary)))
        })
        .or_else(|| present(&expense.plaid_merchant_name).map(Cow::Borrowed))
        .or_else(|| present(&expense.plaid_name).map(Cow::Borrowed))
        .unwrap_or(Cow::Borrowed(UNCATEGORIZED))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}
