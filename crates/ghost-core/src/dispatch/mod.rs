pub mod pico;

pub use pico::PicoClient;

use async_trait::async_trait;
use thiserror::Error;

/// Prompts starting with this prefix go to the image endpoint.
pub const IMAGE_PREFIX: &str = "/image";

/// Which remote service a prompt is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Text,
    Image,
}

impl Route {
    pub fn for_prompt(prompt: &str) -> Self {
        if prompt.starts_with(IMAGE_PREFIX) {
            Route::Image
        } else {
            Route::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Text => "text",
            Route::Image => "image",
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("endpoint returned status {0:?}")]
    Rejected(String),

    #[error("successful response carried no text")]
    MissingText,

    #[error("dispatch cancelled")]
    Cancelled,

    #[error("dispatch task aborted: {0}")]
    Aborted(String),
}

/// Sends a prompt somewhere and returns the response text.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, prompt: &str) -> Result<String, DispatchError>;
}
