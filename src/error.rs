use thiserror::Error;

/// Failures while retrieving or parsing the rates page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// A 200 response that contains no `<table>` elements at all. The page
    /// simply has nothing published yet; callers log and exit cleanly.
    #[error("no tables in response from {url}")]
    NoTables { url: String },
}

/// A matched table did not have the shape the extractor relies on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("matched table's last row has {got} cells, expected at least {need}")]
    ShortRow { need: usize, got: usize },

    #[error("selected table has no title cell in its first row")]
    MissingTitle,
}

/// Failures while composing or transmitting the notification email.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mailbox address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("building message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp transport: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}
