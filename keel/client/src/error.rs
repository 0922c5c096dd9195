use {keel_types::Pubkey, std::time::Duration, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Std(#[from] keel_types::StdError),

    #[error("rpc error! code: {code}, message: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {reason}")]
    MalformedResponse { reason: String },

    #[error("account not found: {address}")]
    AccountNotFound { address: Pubkey },

    #[error("remote call timed out after {elapsed:?}")]
    Timeout { elapsed: Duration },
}

impl Error {
    pub fn malformed_response<R>(reason: R) -> Self
    where
        R: ToString,
    {
        Self::MalformedResponse {
            reason: reason.to_string(),
        }
    }
}
