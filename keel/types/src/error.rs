use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum StdError {
    #[error("data is of incorrect length! expecting {expect}, found {found}")]
    IncorrectLength { expect: usize, found: usize },

    #[error("byte range [{start}, {end}) is out of bounds for payload of {len} bytes")]
    OutOfRange { start: usize, end: usize, len: usize },

    #[error("failed to parse {ty} from string `{input}`: {reason}")]
    Parse {
        ty: &'static str,
        input: String,
        reason: String,
    },
}

pub type StdResult<T> = Result<T, StdError>;
