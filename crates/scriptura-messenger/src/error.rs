/// Errors produced by the Messenger adapter.
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Graph API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("no page access token configured")]
    NotConfigured,
}
