//! Bank-link session: the handshake with the tracker backend that yields the
//! token the linking widget needs, plus the calls made once it is linked.

pub use reqwest::Url;

pub use client::Client;
pub use error::{ClientError, StoreError};
pub use session::{LinkSession, OAUTH_STATE_PARAM, Phase, is_oauth_redirect};
pub use state::{LinkState, LinkToken, ProductFlags, StateUpdate, apply_update, product_flags};
pub use store::{FileTokenStore, LINK_TOKEN_KEY, MemoryTokenStore, TokenStore};

pub mod client;
mod error;
mod session;
pub mod state;
mod store;
