use api_types::{
    Empty,
    link::{AuthStatus, LinkTokenResponse, ProductInfo, UserTokenResponse},
    plaid::SubmitTransactions,
};
use reqwest::Url;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::ClientError;

pub const INFO_PATH: &str = "api/info";
pub const USER_TOKEN_PATH: &str = "api/create_user_token";
pub const LINK_TOKEN_PATH: &str = "api/create_link_token";
pub const PAYMENT_LINK_TOKEN_PATH: &str = "api/create_link_token_for_payment";
pub const SUBMIT_TRANSACTIONS_PATH: &str = "api/submit_plaid_transactions";
pub const AUTH_STATUS_PATH: &str = "api/auth/status";

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Thin client over the tracker's backend. One request per call, no retries.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| ClientError::InvalidUrl(format!("invalid base_url: {err}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::InvalidUrl(format!("invalid endpoint {path}: {err}")))
    }

    async fn post_json<TReq, TResp>(&self, path: &str, body: &TReq) -> Result<TResp, ClientError>
    where
        TReq: Serialize + ?Sized,
        TResp: DeserializeOwned,
    {
        let endpoint = self.endpoint(path)?;
        tracing::debug!(%endpoint, "POST");
        let res = self.http.post(endpoint).json(body).send().await?;
        Self::read(res).await
    }

    async fn read<TResp: DeserializeOwned>(res: reqwest::Response) -> Result<TResp, ClientError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res.json::<TResp>().await?);
        }

        let message = res
            .json::<ErrorResponse>()
            .await
            .map(|err| err.error)
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(ClientError::Server { status, message })
    }

    /// Products enabled on the backend.
    pub async fn info(&self) -> Result<ProductInfo, ClientError> {
        self.post_json(INFO_PATH, &Empty::default()).await
    }

    pub async fn create_user_token(&self) -> Result<UserTokenResponse, ClientError> {
        self.post_json(USER_TOKEN_PATH, &Empty::default()).await
    }

    /// Business errors come back inside a successful response, see
    /// [`LinkTokenResponse::error`].
    pub async fn create_link_token(
        &self,
        for_payment: bool,
    ) -> Result<LinkTokenResponse, ClientError> {
        let path = if for_payment {
            PAYMENT_LINK_TOKEN_PATH
        } else {
            LINK_TOKEN_PATH
        };
        self.post_json(path, &Empty::default()).await
    }

    /// Hands transactions fetched by the linking widget to the backend and
    /// returns its acknowledgement verbatim.
    pub async fn submit_plaid_transactions(
        &self,
        payload: &SubmitTransactions,
    ) -> Result<serde_json::Value, ClientError> {
        let ack: serde_json::Value = self.post_json(SUBMIT_TRANSACTIONS_PATH, payload).await?;
        tracing::info!(
            transactions = payload.plaid_transactions.len(),
            "transactions submitted"
        );
        Ok(ack)
    }

    pub async fn auth_status(&self) -> Result<AuthStatus, ClientError> {
        let endpoint = self.endpoint(AUTH_STATUS_PATH)?;
        tracing::debug!(%endpoint, "GET");
        let res = self.http.get(endpoint).send().await?;
        Self::read(res).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_relative_to_the_base_path() {
        let client = Client::new("http://127.0.0.1:5000").unwrap();
        assert_eq!(client.base_url().as_str(), "http://127.0.0.1:5000/");
        assert_eq!(
            client.endpoint(INFO_PATH).unwrap().as_str(),
            "http://127.0.0.1:5000/api/info"
        );

        let client = Client::new("https://example.com/tracker").unwrap();
        assert_eq!(client.base_url().path(), "/tracker/");
        assert_eq!(
            client.endpoint(LINK_TOKEN_PATH).unwrap().as_str(),
            "https://example.com/tracker/api/create_link_token"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            Client::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
