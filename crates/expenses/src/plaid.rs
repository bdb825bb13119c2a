//! Mapping of raw Plaid transactions onto expense rows.

use std::collections::HashSet;

use api_types::{
    expense::{Amount, ExpenseRecord},
    plaid::{PlaidTransaction, SubmitSummary},
};
use chrono::NaiveDate;

pub const DEFAULT_APP_CATEGORY: &str = "Miscellaneous";

/// Plaid personal finance categories (primary or detailed) to app categories.
const PLAID_TO_APP_CATEGORY: &[(&str, &str)] = &[
    ("FOOD_AND_DRINK", "Groceries"),
    ("FOOD_AND_DRINK_RESTAURANTS", "Restaurant and Takeout (Non-Social)"),
    ("FOOD_AND_DRINK_COFFEE", "Restaurant and Takeout (Non-Social)"),
    ("FOOD_AND_DRINK_FAST_FOOD", "Restaurant and Takeout (Non-Social)"),
    ("FOOD_AND_DRINK_GROCERY", "Groceries"),
    ("FOOD_AND_DRINK_ALCOHOL", "Alcohol"),
    ("TRANSPORTATION", "Other Transportation Expenses"),
    ("TRANSPORTATION_PUBLIC_TRANSIT", "Other Transportation Expenses"),
    ("TRANSPORTATION_TAXI", "Taxi and Ride-Sharing"),
    ("TRANSPORTATION_PARKING", "Car-Related Expenses (excluding gasoline)"),
    ("TRANSPORTATION_GAS", "Gasoline"),
    ("TRANSPORTATION_CAR_SERVICE", "Car-Related Expenses (excluding gasoline)"),
    ("TRAVEL", "Other Transportation Expenses"),
    ("TRAVEL_FLIGHTS", "Airplane Flights"),
    ("TRAVEL_LODGING", "Hotel and Lodging"),
    ("TRAVEL_RENTAL_CAR", "Car-Related Expenses (excluding gasoline)"),
    ("SHOPPING", "Miscellaneous"),
    ("SHOPPING_CLOTHING", "Shoes and Clothing"),
    ("SHOPPING_ELECTRONICS", "Software and Electronics"),
    ("SHOPPING_SPORTING_GOODS", "Sports and Fitness"),
    ("SHOPPING_HOME_IMPROVEMENT", "Household Goods"),
    ("HOME", "Household Goods"),
    ("HOME_RENT", "Rent"),
    ("HOME_MORTGAGE", "Mortgage Principal and Interest"),
    ("HOME_IMPROVEMENT", "Capital Improvements"),
    ("HOME_MAINTENANCE", "Home Services"),
    ("HOME_FURNITURE", "Household Goods"),
    ("HOME_INSURANCE", "Homeowners Insurance"),
    ("HOME_PROPERTY_TAXES", "Property Taxes"),
    ("ENTERTAINMENT", "Entertainment"),
    ("PERSONAL_CARE", "Haircuts and Cosmetics"),
    ("MEDICAL", "Healthcare and Medical"),
    ("HEALTH_FITNESS", "Sports and Fitness"),
    ("PROFESSIONAL_SERVICES", "Miscellaneous"),
    ("PROFESSIONAL_SERVICES_EDUCATION", "Education (including student loans)"),
    ("UTILITIES", "Utilities"),
    ("UTILITIES_INTERNET", "Internet, Cell Phone, and TV"),
    ("UTILITIES_PHONE", "Internet, Cell Phone, and TV"),
    ("UTILITIES_TELEVISION", "Internet, Cell Phone, and TV"),
    ("INSURANCE", "Car and Renters Insurance"),
    ("FEES_AND_CHARGES", "Interest and Banking Fees"),
    ("LOAN", "Education (including student loans)"),
    ("INCOME", "Miscellaneous"),
    ("INCOME_DIVIDENDS", "Miscellaneous"),
    ("GENERAL_SERVICES", "Miscellaneous"),
    ("GENERAL_MERCHANDISE", "Miscellaneous"),
    ("UNCATEGORIZED", "Miscellaneous"),
];

/// Merchants categorized directly, whatever Plaid says. Matched as a
/// substring of the upper-cased merchant name, first hit wins.
const MERCHANT_TO_CATEGORY: &[(&str, &str)] = &[
    ("UBER", "Taxi and Ride-Sharing"),
    ("LYFT", "Taxi and Ride-Sharing"),
    ("NETFLIX", "Entertainment"),
    ("SPOTIFY", "Entertainment"),
    ("AMAZON PRIME", "Other Memberships and Fees"),
    ("AIRBNB", "Hotel and Lodging"),
];

const INCOME_PRIMARY_CATEGORIES: &[&str] = &["INCOME", "TRANSFER_IN"];

/// App category for a Plaid category.
///
/// Exact matches win; otherwise the segment before the first `_` is looked up,
/// then [`DEFAULT_APP_CATEGORY`].
pub fn app_category_for(plaid_category: &str) -> &'static str {
    lookup(plaid_category)
        .or_else(|| {
            plaid_category
                .split_once('_')
                .and_then(|(primary, _)| lookup(primary))
        })
        .unwrap_or(DEFAULT_APP_CATEGORY)
}

fn lookup(key: &str) -> Option<&'static str> {
    PLAID_TO_APP_CATEGORY
        .iter()
        .find_map(|(plaid, app)| (*plaid == key).then_some(*app))
}

/// Best app category for a raw transaction: merchant override, then the
/// detailed Plaid category, then the primary one.
pub fn category_for_transaction(txn: &PlaidTransaction) -> &'static str {
    let merchant = txn
        .merchant_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .or(txn.name.as_deref())
        .unwrap_or_default();

    if !merchant.is_empty() {
        let merchant = merchant.to_uppercase();
        if let Some(category) = MERCHANT_TO_CATEGORY
            .iter()
            .find_map(|(key, category)| merchant.contains(key).then_some(*category))
        {
            return category;
        }
    }

    let pfc = txn.personal_finance_category.as_ref();
    let non_empty = |category: &&str| !category.is_empty();
    pfc.and_then(|pfc| pfc.detailed.as_deref())
        .filter(non_empty)
        .or_else(|| pfc.and_then(|pfc| pfc.primary.as_deref()).filter(non_empty))
        .map_or(DEFAULT_APP_CATEGORY, app_category_for)
}

/// Builds the expense row stored for a raw transaction. Transactions without a
/// readable date are booked on `today`.
pub fn expense_from_plaid(txn: &PlaidTransaction, today: NaiveDate) -> ExpenseRecord {
    let date = txn
        .date
        .as_deref()
        .and_then(parse_plaid_date)
        .unwrap_or(today);
    let pfc = txn.personal_finance_category.clone().unwrap_or_default();
    let is_income = pfc
        .primary
        .as_deref()
        .is_some_and(|primary| INCOME_PRIMARY_CATEGORIES.contains(&primary));

    ExpenseRecord {
        expense_id: None,
        expense_date: date.format("%Y-%m-%d").to_string(),
        amount: txn.amount.map(Amount::Number),
        expense_category: Some(category_for_transaction(txn).to_string()),
        additional_notes: None,
        currency: txn.iso_currency_code.clone(),
        is_income: Some(is_income),
        plaid_account_id: txn.account_id.clone(),
        plaid_transaction_id: txn.transaction_id.clone(),
        plaid_personal_finance_category_primary: pfc.primary,
        plaid_personal_finance_category_detailed: pfc.detailed,
        plaid_merchant_name: txn.merchant_name.clone(),
        plaid_name: txn.name.clone(),
    }
}

fn parse_plaid_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Key identifying a transaction across imports.
pub fn transaction_key(
    account_id: Option<&str>,
    transaction_id: Option<&str>,
) -> Option<(String, String)> {
    Some((account_id?.to_string(), transaction_id?.to_string()))
}

/// Keys of already imported rows.
pub fn known_keys(expenses: &[ExpenseRecord]) -> HashSet<(String, String)> {
    expenses
        .iter()
        .filter_map(|row| {
            transaction_key(
                row.plaid_account_id.as_deref(),
                row.plaid_transaction_id.as_deref(),
            )
        })
        .collect()
}

/// Splits incoming transactions into the ones not imported yet, counting the
/// skipped ones. Transactions missing either id are always kept.
pub fn partition_new<'a>(
    incoming: &'a [PlaidTransaction],
    known: &HashSet<(String, String)>,
) -> (Vec<&'a PlaidTransaction>, SubmitSummary) {
    let mut summary = SubmitSummary::default();
    let fresh = incoming
        .iter()
        .filter(|txn| {
            let seen = transaction_key(txn.account_id.as_deref(), txn.transaction_id.as_deref())
                .is_some_and(|key| known.contains(&key));
            if seen {
                summary.skipped += 1;
            } else {
                summary.new_transactions += 1;
            }
            !seen
        })
        .collect();
    (fresh, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_types::plaid::PersonalFinanceCategory;

    fn txn(merchant: &str, detailed: Option<&str>, primary: Option<&str>) -> PlaidTransaction {
        PlaidTransaction {
            account_id: Some("acc".to_string()),
            transaction_id: Some(format!("t-{merchant}")),
            amount: Some(12.5),
            date: Some("2024-02-10".to_string()),
            merchant_name: Some(merchant.to_string()),
            personal_finance_category: Some(PersonalFinanceCategory {
                primary: primary.map(str::to_string),
                detailed: detailed.map(str::to_string),
                confidence_level: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn merchant_override_beats_plaid_category() {
        let t = txn("Uber Trip 1234", Some("FOOD_AND_DRINK_GROCERY"), None);
        assert_eq!(category_for_transaction(&t), "Taxi and Ride-Sharing");
    }

    #[test]
    fn detailed_category_is_mapped() {
        let t = txn("Corner Shop", Some("TRAVEL_FLIGHTS"), Some("TRAVEL"));
        assert_eq!(category_for_transaction(&t), "Airplane Flights");
    }

    #[test]
    fn unknown_detailed_category_falls_back_to_its_first_segment() {
        assert_eq!(app_category_for("HOME_SOMETHING_NEW"), "Household Goods");
        assert_eq!(app_category_for("FOOD_AND_DRINK_BAKERY"), DEFAULT_APP_CATEGORY);
        assert_eq!(app_category_for("NOPE"), DEFAULT_APP_CATEGORY);
    }

    #[test]
    fn missing_categories_default() {
        let mut t = txn("Corner Shop", None, None);
        assert_eq!(category_for_transaction(&t), DEFAULT_APP_CATEGORY);
        t.personal_finance_category = None;
        assert_eq!(category_for_transaction(&t), DEFAULT_APP_CATEGORY);
    }

    #[test]
    fn expense_row_from_transaction() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let row = expense_from_plaid(&txn("Netflix", None, Some("INCOME")), today);
        assert_eq!(row.expense_date, "2024-02-10");
        assert_eq!(row.amount, Some(Amount::Number(12.5)));
        assert_eq!(row.expense_category.as_deref(), Some("Entertainment"));
        assert_eq!(row.is_income, Some(true));
        assert_eq!(row.plaid_transaction_id.as_deref(), Some("t-Netflix"));

        let mut undated = txn("Shop", None, None);
        undated.date = Some("soon".to_string());
        assert_eq!(expense_from_plaid(&undated, today).expense_date, "2024-03-01");
    }

    #[test]
    fn already_imported_transactions_are_skipped() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let a = txn("A", None, None);
        let b = txn("B", None, None);
        let mut orphan = txn("C", None, None);
        orphan.account_id = None;

        let imported = vec![expense_from_plaid(&a, today)];
        let incoming = vec![a, b, orphan];
        let (fresh, summary) = partition_new(&incoming, &known_keys(&imported));

        assert_eq!(fresh.len(), 2);
        assert_eq!(
            summary,
            SubmitSummary {
                new_transactions: 2,
                skipped: 1
            }
        );
    }
}
