//! Bank-link handshake.
//!
//! A [`LinkSession`] walks the steps needed before the linking widget can be
//! shown:
//!
//! ```text
//! Uninitialized -> FetchingInfo -> ResumingRedirect ------------------------> Ready
//!                               \-> [MintingUserToken] -> MintingLinkToken -> Ready
//! ```
//!
//! Steps run strictly in order because each one decides what the next does.
//! None of them returns an error: transport failures become sentinels in the
//! state (`backend == false`, `LinkToken::Failed`, `user_token == None`) and
//! business errors the backend embeds in a 2xx body land in
//! `link_token_error`.
//!
//! The session is driven through `&mut self`, so two flows can never
//! interleave on it. Dropping an in-flight `initialize` future abandons the
//! pending request and nothing is written afterwards.

use reqwest::Url;
use uuid::Uuid;

use crate::{
    client::Client,
    state::{LinkState, LinkToken, StateUpdate, apply_update},
    store::{LINK_TOKEN_KEY, TokenStore},
};

/// Query parameter the bank appends when it sends the user back mid-OAuth.
pub const OAUTH_STATE_PARAM: &str = "oauth_state_id";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    FetchingInfo,
    ResumingRedirect,
    MintingUserToken,
    MintingLinkToken,
    Ready,
}

/// `true` when the page was reloaded in the middle of a bank's OAuth redirect.
pub fn is_oauth_redirect(url: &Url) -> bool {
    url.query_pairs().any(|(key, _)| key == OAUTH_STATE_PARAM)
}

#[derive(Debug)]
pub struct LinkSession<S> {
    id: Uuid,
    client: Client,
    store: S,
    state: LinkState,
    phase: Phase,
}

impl<S: TokenStore> LinkSession<S> {
    pub fn new(client: Client, store: S) -> Self {
        Self {
            id: Uuid::new_v4(),
            client,
            store,
            state: LinkState::default(),
            phase: Phase::Uninitialized,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies a UI-driven change (e.g. `link_success` once the widget
    /// reports back).
    pub fn update(&mut self, update: StateUpdate) {
        self.state = apply_update(std::mem::take(&mut self.state), update);
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(session = %self.id, from = ?self.phase, to = ?phase, "phase");
        self.phase = phase;
    }

    /// Queries enabled products and recomputes the derived flags. On failure
    /// only `backend` changes.
    pub async fn fetch_product_info(&mut self) {
        match self.client.info().await {
            Ok(info) => {
                let mut update = StateUpdate::products(info.products);
                update.item_id = Some(info.item_id);
                update.access_token = Some(info.access_token);
                self.update(update);
            }
            Err(err) => {
                tracing::warn!(session = %self.id, "backend unreachable: {err}");
                self.update(StateUpdate {
                    backend: Some(false),
                    ..Default::default()
                });
            }
        }
    }

    /// Mints the user-scoped token. Does nothing outside the user-token flow.
    pub async fn mint_user_token(&mut self) {
        if !self.state.is_user_token_flow {
            tracing::debug!(session = %self.id, "user token not needed");
            return;
        }

        let update = match self.client.create_user_token().await {
            Ok(res) => match (res.error, res.user_token) {
                (Some(error), _) => {
                    tracing::warn!(
                        session = %self.id,
                        code = %error.error_code,
                        "user token rejected: {}",
                        error.message()
                    );
                    StateUpdate {
                        link_token_error: Some(error),
                        ..Default::default()
                    }
                }
                (None, user_token) => StateUpdate {
                    user_token: Some(user_token),
                    ..Default::default()
                },
            },
            Err(err) => {
                tracing::warn!(session = %self.id, "user token request failed: {err}");
                StateUpdate {
                    user_token: Some(None),
                    ..Default::default()
                }
            }
        };
        self.update(update);
    }

    /// Mints a link token from the standard or the payment-initiation
    /// endpoint and persists it for a later redirect resume.
    pub async fn mint_link_token(&mut self, is_payment_initiation_flow: bool) {
        let update = match self.client.create_link_token(is_payment_initiation_flow).await {
            Ok(res) => match (res.error, res.link_token) {
                (Some(error), _) => {
                    tracing::warn!(
                        session = %self.id,
                        code = %error.error_code,
                        "link token rejected: {}",
                        error.message()
                    );
                    StateUpdate {
                        link_token: Some(LinkToken::Unset),
                        link_token_error: Some(error),
                        ..Default::default()
                    }
                }
                (None, Some(token)) if !token.is_empty() => {
                    if let Err(err) = self.store.save(LINK_TOKEN_KEY, &token) {
                        tracing::warn!(session = %self.id, "failed to persist link token: {err}");
                    }
                    StateUpdate {
                        link_token: Some(LinkToken::Issued(token)),
                        ..Default::default()
                    }
                }
                (None, _) => {
                    tracing::warn!(session = %self.id, "link token response without a token");
                    StateUpdate {
                        link_token: Some(LinkToken::Failed),
                        ..Default::default()
                    }
                }
            },
            Err(err) => {
                tracing::warn!(session = %self.id, "link token request failed: {err}");
                StateUpdate {
                    link_token: Some(LinkToken::Failed),
                    ..Default::default()
                }
            }
        };
        self.update(update);
    }

    /// Runs the whole handshake for the page at `current_url`.
    ///
    /// Once the session is `Ready` further calls are no-ops.
    pub async fn initialize(&mut self, current_url: &Url) {
        if self.phase == Phase::Ready {
            tracing::debug!(session = %self.id, "already initialized");
            return;
        }

        self.enter(Phase::FetchingInfo);
        self.fetch_product_info().await;

        if is_oauth_redirect(current_url) {
            self.enter(Phase::ResumingRedirect);
            self.resume_redirect();
        } else {
            if self.state.is_user_token_flow {
                self.enter(Phase::MintingUserToken);
                self.mint_user_token().await;
            }
            self.enter(Phase::MintingLinkToken);
            let for_payment = self.state.is_payment_initiation;
            self.mint_link_token(for_payment).await;
        }

        self.enter(Phase::Ready);
        tracing::info!(
            session = %self.id,
            backend = self.state.backend,
            link_token = ?self.state.link_token.as_deref().map(|_| "issued"),
            failed = self.state.link_token.is_failed(),
            "link session ready"
        );
    }

    /// Rehydrates the token minted before the redirect. Never mints.
    fn resume_redirect(&mut self) {
        let link_token = match self.store.load(LINK_TOKEN_KEY) {
            Ok(Some(token)) => LinkToken::Issued(token),
            Ok(None) => {
                tracing::warn!(session = %self.id, "no stored link token to resume");
                LinkToken::Failed
            }
            Err(err) => {
                tracing::warn!(session = %self.id, "failed to read stored link token: {err}");
                LinkToken::Failed
            }
        };
        self.update(StateUpdate {
            link_token: Some(link_token),
            ..Default::default()
        });
    }
}
