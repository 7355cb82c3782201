use thiserror::Error;

/// Errors raised while constructing or parsing model values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("price tick must be positive and finite, got {0}")]
    InvalidPriceTick(f64),

    #[error("unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("malformed contract key `{0}`, expected SYMBOL.EXCHANGE")]
    InvalidContractKey(String),
}
