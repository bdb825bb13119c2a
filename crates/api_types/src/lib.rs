use serde::{Deserialize, Deserializer, Serialize};

/// Reads `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Empty JSON object sent as the body of the handshake POSTs.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Empty {}

pub mod link {
    use super::*;

    /// Response of `/api/info`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProductInfo {
        /// Required: a body without a product list is not a usable answer.
        pub products: Vec<String>,
        /// Item currently linked on the backend, if any.
        pub item_id: Option<String>,
        pub access_token: Option<String>,
    }

    /// Business error the backend embeds inside a 2xx body.
    ///
    /// All fields default to the empty string, which is also how "no error"
    /// is represented in the link state.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LinkTokenError {
        #[serde(default)]
        pub error_type: String,
        #[serde(default)]
        pub error_code: String,
        #[serde(default)]
        pub error_message: String,
        /// Human readable message as forwarded by the backend's error formatter.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub display_message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub status_code: Option<u16>,
    }

    impl LinkTokenError {
        pub fn is_empty(&self) -> bool {
            self.error_type.is_empty() && self.error_code.is_empty() && self.error_message.is_empty()
        }

        /// The message to show, preferring `error_message` over `display_message`.
        pub fn message(&self) -> &str {
            if !self.error_message.is_empty() {
                return &self.error_message;
            }
            self.display_message.as_deref().unwrap_or_default()
        }
    }

    /// Response of `/api/create_user_token`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserTokenResponse {
        pub user_token: Option<String>,
        pub error: Option<LinkTokenError>,
    }

    /// Response of `/api/create_link_token` and `/api/create_link_token_for_payment`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct LinkTokenResponse {
        pub link_token: Option<String>,
        pub error: Option<LinkTokenError>,
    }

    /// Response of `/api/auth/status`.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AuthStatus {
        pub authenticated: bool,
        pub username: Option<String>,
        pub display_name: Option<String>,
        pub email: Option<String>,
    }
}

pub mod expense {
    use super::*;

    /// Amount as sent by the backend: a JSON number or a loosely formatted
    /// string such as `"$1,234.56"`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Amount {
        Number(f64),
        Text(String),
    }

    impl From<f64> for Amount {
        fn from(value: f64) -> Self {
            Self::Number(value)
        }
    }

    impl From<&str> for Amount {
        fn from(value: &str) -> Self {
            Self::Text(value.to_string())
        }
    }

    /// Expense row as the backend serializes it.
    ///
    /// Only `ExpenseDate` and `Amount` are guaranteed; the Plaid fields are
    /// used as category fallbacks. Unknown fields are ignored.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct ExpenseRecord {
        #[serde(rename = "ExpenseID", default, skip_serializing_if = "Option::is_none")]
        pub expense_id: Option<i64>,
        /// Empty when the row carries no date (missing key or `null`).
        #[serde(default, deserialize_with = "null_as_default")]
        pub expense_date: String,
        #[serde(default)]
        pub amount: Option<Amount>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub expense_category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub additional_notes: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub currency: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub is_income: Option<bool>,
        #[serde(rename = "PlaidAccountID", default, skip_serializing_if = "Option::is_none")]
        pub plaid_account_id: Option<String>,
        #[serde(
            rename = "PlaidTransactionID",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        pub plaid_transaction_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub plaid_personal_finance_category_primary: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub plaid_personal_finance_category_detailed: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub plaid_merchant_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub plaid_name: Option<String>,
    }
}

pub mod plaid {
    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PersonalFinanceCategory {
        pub primary: Option<String>,
        pub detailed: Option<String>,
        pub confidence_level: Option<String>,
    }

    /// Raw transaction as returned by the linking widget.
    ///
    /// Fields this crate does not interpret are kept in `extra` so they are
    /// forwarded untouched when submitted to the backend.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct PlaidTransaction {
        pub account_id: Option<String>,
        pub transaction_id: Option<String>,
        pub amount: Option<f64>,
        pub iso_currency_code: Option<String>,
        pub date: Option<String>,
        pub authorized_date: Option<String>,
        pub name: Option<String>,
        pub merchant_name: Option<String>,
        pub personal_finance_category: Option<PersonalFinanceCategory>,
        pub pending: Option<bool>,
        #[serde(flatten)]
        pub extra: serde_json::Map<String, serde_json::Value>,
    }

    /// Scope the submitted transactions are attached to. The backend accepts
    /// numeric ids as well as strings.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum ScopeId {
        Number(i64),
        Text(String),
    }

    impl From<&str> for ScopeId {
        fn from(value: &str) -> Self {
            match value.parse::<i64>() {
                Ok(id) => Self::Number(id),
                Err(_) => Self::Text(value.to_string()),
            }
        }
    }

    /// Request body of `/api/submit_plaid_transactions`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SubmitTransactions {
        pub scope_id: ScopeId,
        pub plaid_transactions: Vec<PlaidTransaction>,
    }

    /// Acknowledgement the backend returns after an import.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SubmitSummary {
        pub new_transactions: usize,
        pub skipped: usize,
    }
}

#[cfg(test)]
mod tests {
    use super::{expense::*, link::*, plaid::*};

    #[test]
    fn expense_accepts_numeric_and_text_amounts() {
        let rows: Vec<ExpenseRecord> = serde_json::from_str(
            r#"[
                {"ExpenseDate": "2024-01-15", "Amount": 12.5, "ExpenseCategory": "Groceries"},
                {"ExpenseDate": "2024-01-16", "Amount": "$1,234.56"},
                {"ExpenseDate": "2024-01-17", "Amount": null, "ExpenseID": 7, "Extra": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(rows[0].amount, Some(Amount::Number(12.5)));
        assert_eq!(rows[0].expense_category.as_deref(), Some("Groceries"));
        assert_eq!(rows[1].amount, Some(Amount::Text("$1,234.56".to_string())));
        assert_eq!(rows[2].amount, None);
        assert_eq!(rows[2].expense_id, Some(7));
    }

    #[test]
    fn null_expense_date_reads_as_empty() {
        let rows: Vec<ExpenseRecord> = serde_json::from_str(
            r#"[
                {"ExpenseDate": null, "Amount": 5},
                {"Amount": 2},
                {"ExpenseDate": "2024-01-01", "Amount": 1}
            ]"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].expense_date, "");
        assert_eq!(rows[1].expense_date, "");
        assert_eq!(rows[2].expense_date, "2024-01-01");
    }

    #[test]
    fn product_info_requires_products() {
        assert!(serde_json::from_str::<ProductInfo>(r#"{"item_id": null}"#).is_err());
        assert!(serde_json::from_str::<ProductInfo>(r#"{"products": null}"#).is_err());

        let info: ProductInfo = serde_json::from_str(r#"{"products": ["transactions"]}"#).unwrap();
        assert_eq!(info.products, ["transactions"]);
        assert_eq!(info.item_id, None);
    }

    #[test]
    fn link_token_response_carries_embedded_error() {
        let res: LinkTokenResponse = serde_json::from_str(
            r#"{"error": {"status_code": 400, "display_message": "bad", "error_code": "INVALID_FIELD", "error_type": "INVALID_REQUEST"}}"#,
        )
        .unwrap();

        let err = res.error.unwrap();
        assert_eq!(err.error_code, "INVALID_FIELD");
        assert_eq!(err.error_message, "");
        assert_eq!(err.message(), "bad");
        assert!(!err.is_empty());
        assert!(res.link_token.is_none());
    }

    #[test]
    fn plaid_transaction_keeps_unknown_fields() {
        let txn: PlaidTransaction = serde_json::from_str(
            r#"{"transaction_id": "t1", "amount": 4.5, "logo_url": "https://x"}"#,
        )
        .unwrap();
        assert_eq!(txn.extra.get("logo_url").and_then(|v| v.as_str()), Some("https://x"));

        let back = serde_json::to_value(&txn).unwrap();
        assert_eq!(back["logo_url"], "https://x");
    }

    #[test]
    fn scope_id_prefers_numbers() {
        assert_eq!(ScopeId::from("42"), ScopeId::Number(42));
        assert_eq!(ScopeId::from("home"), ScopeId::Text("home".to_string()));
    }
}
