//! Error types for the ledger engine and its batch driver.

use crate::money::Money;
use std::fmt;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// One side of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Source,
    Destination,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Source => write!(f, "source"),
            Leg::Destination => write!(f, "destination"),
        }
    }
}

/// Broad class of a [`LedgerError`].
///
/// Every class is recoverable: a failed operation never changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input; correct it and retry.
    Validation,
    /// Business-rule rejection.
    Policy,
    /// Not applicable to the current account or ledger state.
    State,
}

/// Errors returned by account, ledger and transfer operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Amount is malformed, non-positive, or out of representable range
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Account number is not exactly 10 ASCII digits
    #[error("Invalid account number {0:?}: expected exactly 10 digits")]
    InvalidAccountNumber(String),

    /// Transaction kind outside the fixed set
    #[error("Invalid transaction kind {0:?}")]
    InvalidTransactionKind(String),

    /// Account type outside the known tiers
    #[error("Invalid account type {0:?}")]
    InvalidAccountType(String),

    /// Holder name is empty
    #[error("Account holder name must not be empty")]
    InvalidHolder,

    /// Source and destination of a transfer are the same account
    #[error("Cannot transfer from account {0} to itself")]
    SelfTransfer(String),

    /// Debit would leave the balance below the minimum
    #[error("Insufficient funds: balance {balance}, debit {debit}, minimum balance {minimum}")]
    InsufficientFunds {
        balance: Money,
        debit: Money,
        minimum: Money,
    },

    /// Single operation above the daily limit
    #[error("Amount {amount} exceeds daily limit of {limit}")]
    DailyLimitExceeded { amount: Money, limit: Money },

    /// Per-period transaction cap reached
    #[error("Transaction limit of {limit} per period reached")]
    PeriodLimitExceeded { limit: u32 },

    /// Single deposit above the account type's deposit cap
    #[error("Deposit of {amount} exceeds deposit cap of {cap}")]
    DepositCapExceeded { amount: Money, cap: Money },

    /// Per-period transfer sub-limit reached
    #[error("Transfer limit of {limit} per period reached")]
    TransferCountExceeded { limit: u32 },

    /// Account is blocked
    #[error("Account {0} is not active")]
    InactiveAccount(String),

    /// No account with this number in the ledger
    #[error("Account {0} not found")]
    AccountNotFound(String),

    /// Account number already registered in the ledger
    #[error("Account {0} already exists")]
    DuplicateAccount(String),

    /// A transfer leg was rejected
    #[error("Transfer rejected on {leg} account: {reason}")]
    Transfer {
        leg: Leg,
        #[source]
        reason: Box<LedgerError>,
    },
}

impl LedgerError {
    pub(crate) fn on_leg(self, leg: Leg) -> Self {
        LedgerError::Transfer {
            leg,
            reason: Box::new(self),
        }
    }

    /// Returns the underlying error, looking through transfer-leg wrappers.
    pub fn root(&self) -> &LedgerError {
        match self {
            LedgerError::Transfer { reason, .. } => reason.root(),
            other => other,
        }
    }

    /// Returns the leg that triggered a transfer failure, if any.
    pub fn leg(&self) -> Option<Leg> {
        match self {
            LedgerError::Transfer { leg, .. } => Some(*leg),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            LedgerError::Transfer { reason, .. } => reason.category(),
            LedgerError::InvalidAmount(_)
            | LedgerError::InvalidAccountNumber(_)
            | LedgerError::InvalidTransactionKind(_)
            | LedgerError::InvalidAccountType(_)
            | LedgerError::InvalidHolder
            | LedgerError::SelfTransfer(_) => ErrorCategory::Validation,
            LedgerError::InsufficientFunds { .. }
            | LedgerError::DailyLimitExceeded { .. }
            | LedgerError::PeriodLimitExceeded { .. }
            | LedgerError::DepositCapExceeded { .. }
            | LedgerError::TransferCountExceeded { .. } => ErrorCategory::Policy,
            LedgerError::InactiveAccount(_)
            | LedgerError::AccountNotFound(_)
            | LedgerError::DuplicateAccount(_) => ErrorCategory::State,
        }
    }
}

/// Errors that stop the batch driver.
#[derive(Error, Debug)]
pub enum BatchError {
    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing input file argument
    #[error("Missing input file argument. Usage: bank-ledger <operations.csv>")]
    MissingArgument,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            LedgerError::InvalidAmount("x".into()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            LedgerError::PeriodLimitExceeded { limit: 10 }.category(),
            ErrorCategory::Policy
        );
        assert_eq!(
            LedgerError::AccountNotFound("1234567890".into()).category(),
            ErrorCategory::State
        );
    }

    #[test]
    fn test_transfer_wrapper_exposes_leg_and_root() {
        let err = LedgerError::InactiveAccount("1234567890".into()).on_leg(Leg::Destination);

        assert_eq!(err.leg(), Some(Leg::Destination));
        assert_eq!(
            err.root(),
            &LedgerError::InactiveAccount("1234567890".into())
        );
        assert_eq!(err.category(), ErrorCategory::State);
        assert_eq!(
            err.to_string(),
            "Transfer rejected on destination account: Account 1234567890 is not active"
        );
    }
}
