use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use shared::{domain::ActivitySnapshot, error::ErrorCode, protocol::MessageResponse};
use url::Url;

use crate::error::ClientError;

/// Remote operations the controller depends on.
#[async_trait]
pub trait RosterApi: Send + Sync {
    async fn list_activities(&self) -> Result<ActivitySnapshot, ClientError>;
    async fn signup(&self, activity: &str, email: &str) -> Result<MessageResponse, ClientError>;
    async fn unregister(&self, activity: &str, email: &str)
        -> Result<MessageResponse, ClientError>;
}

#[derive(Debug, Clone)]
pub struct HttpRosterApi {
    http: Client,
    base: Url,
}

#[derive(Deserialize)]
struct RejectionBody {
    #[serde(default)]
    code: Option<ErrorCode>,
    #[serde(default)]
    detail: Option<String>,
}

impl HttpRosterApi {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self, ClientError> {
        let base = Url::parse(server_url.trim())
            .map_err(|_| ClientError::InvalidServerUrl(server_url.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidServerUrl(server_url.to_string()));
        }
        Ok(Self { http, base })
    }

    pub fn server_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidServerUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn membership_url(&self, activity: &str, action: &str, email: &str) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&["api", "activities", activity, action])?;
        url.query_pairs_mut().append_pair("email", email);
        Ok(url)
    }
}

#[async_trait]
impl RosterApi for HttpRosterApi {
    async fn list_activities(&self) -> Result<ActivitySnapshot, ClientError> {
        let url = self.endpoint(&["api", "activities"])?;
        let response = self.http.get(url).send().await?;
        decode(response).await
    }

    async fn signup(&self, activity: &str, email: &str) -> Result<MessageResponse, ClientError> {
        let url = self.membership_url(activity, "signup", email)?;
        let response = self.http.post(url).send().await?;
        decode(response).await
    }

    async fn unregister(
        &self,
        activity: &str,
        email: &str,
    ) -> Result<MessageResponse, ClientError> {
        let url = self.membership_url(activity, "unregister", email)?;
        let response = self.http.delete(url).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.bytes().await?;
    let rejection = serde_json::from_slice::<RejectionBody>(&body).ok();
    let (code, detail) = match rejection {
        Some(body) => (body.code, body.detail.filter(|detail| !detail.is_empty())),
        None => (None, None),
    };
    Err(ClientError::Rejected {
        status: status.as_u16(),
        code,
        detail,
    })
}
