use thiserror::Error;

use readex_bank::BankError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("attempt not found: {0}")]
    NotFound(String),

    #[error("attempt {0} has not been submitted")]
    NotSubmitted(String),

    #[error(transparent)]
    Bank(#[from] BankError),
}
