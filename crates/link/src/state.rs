//! Link state and its reducer.
//!
//! The state is a plain value. Every change goes through [`apply_update`],
//! which overlays a partial [`StateUpdate`] and returns the new state.

use api_types::link::LinkTokenError;

pub const TRANSACTIONS: &str = "transactions";
pub const PAYMENT_INITIATION: &str = "payment_initiation";

/// Consumer-report (CRA check report) products. Any of them switches the
/// session to the user-token flow.
pub const CRA_CHECK_REPORT_PRODUCTS: [&str; 5] = [
    "cra_base_report",
    "cra_income_insights",
    "cra_partner_insights",
    "cra_network_insights",
    "cra_cashflow_insights",
];

pub fn is_cra_product(product: &str) -> bool {
    CRA_CHECK_REPORT_PRODUCTS.contains(&product)
}

/// Link token as seen by the UI.
///
/// `Unset` renders nothing, `Failed` renders the error screen.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LinkToken {
    #[default]
    Unset,
    Failed,
    Issued(String),
}

impl LinkToken {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Issued(token) => Some(token),
            Self::Unset | Self::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Flags derived from the enabled product list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductFlags {
    pub is_payment_initiation: bool,
    pub is_user_token_flow: bool,
    pub is_cra_products_exclusively: bool,
}

pub fn product_flags<S: AsRef<str>>(products: &[S]) -> ProductFlags {
    ProductFlags {
        is_payment_initiation: products.iter().any(|p| p.as_ref() == PAYMENT_INITIATION),
        is_user_token_flow: products.iter().any(|p| is_cra_product(p.as_ref())),
        is_cra_products_exclusively: products.iter().all(|p| is_cra_product(p.as_ref())),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkState {
    pub link_success: bool,
    pub is_item_access: bool,
    pub is_payment_initiation: bool,
    pub is_cra_products_exclusively: bool,
    pub is_user_token_flow: bool,
    pub link_token: LinkToken,
    pub user_token: Option<String>,
    pub access_token: Option<String>,
    pub item_id: Option<String>,
    pub is_error: bool,
    /// `false` once the backend could not be reached for product info.
    pub backend: bool,
    pub products: Vec<String>,
    pub link_token_error: LinkTokenError,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            link_success: false,
            is_item_access: true,
            is_payment_initiation: false,
            is_cra_products_exclusively: false,
            is_user_token_flow: false,
            link_token: LinkToken::Unset,
            user_token: None,
            access_token: None,
            item_id: None,
            is_error: false,
            backend: true,
            products: vec![TRANSACTIONS.to_string()],
            link_token_error: LinkTokenError::default(),
        }
    }
}

/// Partial state. `None` leaves the field as it is; for optional fields
/// `Some(None)` clears them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub link_success: Option<bool>,
    pub is_item_access: Option<bool>,
    pub is_payment_initiation: Option<bool>,
    pub is_cra_products_exclusively: Option<bool>,
    pub is_user_token_flow: Option<bool>,
    pub link_token: Option<LinkToken>,
    pub user_token: Option<Option<String>>,
    pub access_token: Option<Option<String>>,
    pub item_id: Option<Option<String>>,
    pub is_error: Option<bool>,
    pub backend: Option<bool>,
    pub products: Option<Vec<String>>,
    pub link_token_error: Option<LinkTokenError>,
}

impl StateUpdate {
    /// Update carrying the flags derived from `products` along with the list.
    pub fn products(products: Vec<String>) -> Self {
        let flags = product_flags(&products);
        Self {
            is_payment_initiation: Some(flags.is_payment_initiation),
            is_user_token_flow: Some(flags.is_user_token_flow),
            is_cra_products_exclusively: Some(flags.is_cra_products_exclusively),
            products: Some(products),
            ..Default::default()
        }
    }
}

pub fn apply_update(state: LinkState, update: StateUpdate) -> LinkState {
    LinkState {
        link_success: update.link_success.unwrap_or(state.link_success),
        is_item_access: update.is_item_access.unwrap_or(state.is_item_access),
        is_payment_initiation: update
            .is_payment_initiation
            .unwrap_or(state.is_payment_initiation),
        is_cra_products_exclusively: update
            .is_cra_products_exclusively
            .unwrap_or(state.is_cra_products_exclusively),
        is_user_token_flow: update.is_user_token_flow.unwrap_or(state.is_user_token_flow),
        link_token: update.link_token.unwrap_or(state.link_token),
        user_token: update.user_token.unwrap_or(state.user_token),
        access_token: update.access_token.unwrap_or(state.access_token),
        item_id: update.item_id.unwrap_or(state.item_id),
        is_error: update.is_error.unwrap_or(state.is_error),
        backend: update.backend.unwrap_or(state.backend),
        products: update.products.unwrap_or(state.products),
        link_token_error: update.link_token_error.unwrap_or(state.link_token_error),
    }
}
