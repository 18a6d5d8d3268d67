pub mod analysis;
pub mod notifier;
pub mod payloads;

pub use analysis::*;
pub use notifier::*;
pub use payloads::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model returned no text")]
    EmptyResponse,
}
