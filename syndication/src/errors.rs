use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyndicationError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parsing failed or empty")]
    EmptyFeed,
}
