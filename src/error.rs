use std::fmt::{self, Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The reasons raw user input can be rejected before it reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The description was empty or contained only whitespace.
    EmptyDescription,
    /// The amount could not be parsed as a number.
    InvalidAmount(String),
    /// The amount parsed, but it was below zero.
    NegativeAmount(String),
    /// The amount, or the total it would merge into, is above the largest amount accepted.
    AmountTooLarge(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyDescription => write!(f, "The description must not be empty"),
            ValidationError::InvalidAmount(s) => write!(f, "'{s}' is not a valid amount"),
            ValidationError::NegativeAmount(s) => {
                write!(f, "The amount must not be negative, got '{s}'")
            }
            ValidationError::AmountTooLarge(s) => write!(f, "The amount '{s}' is too large"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Returned when a ledger position does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexError {
    index: usize,
    len: usize,
}

impl IndexError {
    pub(crate) fn new(index: usize, len: usize) -> Self {
        Self { index, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The number of records the ledger held when the lookup failed.
    pub fn ledger_len(&self) -> usize {
        self.len
    }
}

impl Display for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            write!(f, "No expense at index {}, the ledger is empty", self.index)
        } else {
            write!(
                f,
                "No expense at index {}, valid indexes are 0 through {}",
                self.index,
                self.len - 1
            )
        }
    }
}

impl std::error::Error for IndexError {}
