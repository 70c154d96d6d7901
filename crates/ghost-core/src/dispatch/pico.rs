use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Dispatch, DispatchError, Route};
use crate::config::Endpoints;

#[derive(Serialize)]
struct PicoRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct PicoResponse {
    status: String,
    #[serde(default)]
    text: Option<String>,
}

/// Client for the hosted completion and image-generation endpoints.
#[derive(Clone)]
pub struct PicoClient {
    client: Client,
    endpoints: Endpoints,
}

impl PicoClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            client: Client::new(),
            endpoints,
        }
    }

    pub async fn query(&self, prompt: &str) -> Result<String, DispatchError> {
        let route = Route::for_prompt(prompt);
        let url = self.endpoints.url_for(route);
        debug!(route = route.as_str(), "dispatching prompt");

        let response = self
            .client
            .post(url)
            .json(&PicoRequest { prompt })
            .send()
            .await?;

        // The body decides success, not the HTTP status.
        let http_status = response.status();
        let body = response.text().await?;
        let parsed: PicoResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(%http_status, "unparseable response body");
            DispatchError::Malformed(e)
        })?;

        if parsed.status != "success" {
            return Err(DispatchError::Rejected(parsed.status));
        }

        parsed.text.ok_or(DispatchError::MissingText)
    }
}

#[async_trait]
impl Dispatch for PicoClient {
    async fn dispatch(&self, prompt: &str) -> Result<String, DispatchError> {
        self.query(prompt).await
    }
}
