use thiserror::Error;

/// Failures surfaced to the page that triggered them. `Display` is the
/// inline message shown next to the form.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The backing service rejected the request; `message` is its own text.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local form validation failed before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("You must be signed in to do that.")]
    NotSignedIn,
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
