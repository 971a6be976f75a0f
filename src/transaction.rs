//! Transaction records and batch operation parsing.

use crate::error::LedgerError;
use crate::money::Money;
use crate::rules::AccountType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of events a ledger can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdrawal" => Ok(TransactionKind::Withdrawal),
            "transfer" => Ok(TransactionKind::Transfer),
            other => Err(LedgerError::InvalidTransactionKind(other.to_string())),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "deposit"),
            TransactionKind::Withdrawal => write!(f, "withdrawal"),
            TransactionKind::Transfer => write!(f, "transfer"),
        }
    }
}

/// An immutable record of one committed ledger event.
///
/// Fields are private; records are created only by the account that commits
/// them and are never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    kind: TransactionKind,
    amount: Money,
    fee: Money,
    timestamp: DateTime<Utc>,
    resulting_balance: Money,
    description: Option<String>,
}

impl TransactionRecord {
    pub(crate) fn new(
        kind: TransactionKind,
        amount: Money,
        fee: Money,
        timestamp: DateTime<Utc>,
        resulting_balance: Money,
        description: Option<String>,
    ) -> Self {
        TransactionRecord {
            kind,
            amount,
            fee,
            timestamp,
            resulting_balance,
            description,
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Amount moved, excluding any fee.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Fee debited on top of `amount` (zero unless a transfer fee applied).
    pub fn fee(&self) -> Money {
        self.fee
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Account balance immediately after this event was committed.
    pub fn resulting_balance(&self) -> Money {
        self.resulting_balance
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} - {}",
            self.kind,
            self.amount,
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Raw operation row as read from the batch CSV.
///
/// Only `type` and `account` are always required; the remaining columns
/// depend on the operation.
#[derive(Debug, Deserialize)]
pub struct OperationRecord {
    /// open, deposit, withdrawal, transfer, block, unblock, reset
    #[serde(rename = "type")]
    pub op_type: String,

    pub account: String,

    /// Destination account (transfer only)
    pub counterparty: Option<String>,

    pub amount: Option<String>,

    /// Holder name (open only)
    pub holder: Option<String>,

    /// checking or savings (open only)
    pub account_type: Option<String>,

    pub description: Option<String>,
}

/// A parsed batch operation ready to apply to a ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Open {
        account: String,
        holder: String,
        account_type: AccountType,
        initial_balance: Money,
    },
    Deposit {
        account: String,
        amount: Money,
        description: Option<String>,
    },
    Withdrawal {
        account: String,
        amount: Money,
        description: Option<String>,
    },
    Transfer {
        from: String,
        to: String,
        amount: Money,
        description: Option<String>,
    },
    Block {
        account: String,
    },
    Unblock {
        account: String,
    },
    ResetPeriod {
        account: String,
    },
}

impl OperationRecord {
    /// Parses the raw CSV row into a typed operation.
    ///
    /// Administrative operations are matched first; anything else must be a
    /// [`TransactionKind`].
    pub fn parse(&self) -> Result<Operation, LedgerError> {
        let account = self.account.trim().to_string();
        let op_type = self.op_type.trim().to_lowercase();

        match op_type.as_str() {
            "open" => {
                let holder = non_empty(&self.holder).ok_or(LedgerError::InvalidHolder)?;
                let account_type = match non_empty(&self.account_type) {
                    Some(t) => AccountType::from_str(&t)?,
                    None => AccountType::Savings,
                };
                let initial_balance = match non_empty(&self.amount) {
                    Some(a) => Money::from_str(&a)?,
                    None => Money::ZERO,
                };
                return Ok(Operation::Open {
                    account,
                    holder,
                    account_type,
                    initial_balance,
                });
            }
            "block" => return Ok(Operation::Block { account }),
            "unblock" => return Ok(Operation::Unblock { account }),
            "reset" => return Ok(Operation::ResetPeriod { account }),
            _ => {}
        }

        let description = non_empty(&self.description);
        match TransactionKind::from_str(&op_type)? {
            TransactionKind::Deposit => Ok(Operation::Deposit {
                account,
                amount: self.parse_amount()?,
                description,
            }),
            TransactionKind::Withdrawal => Ok(Operation::Withdrawal {
                account,
                amount: self.parse_amount()?,
                description,
            }),
            TransactionKind::Transfer => {
                let to = non_empty(&self.counterparty)
                    .ok_or_else(|| LedgerError::InvalidAccountNumber(String::new()))?;
                Ok(Operation::Transfer {
                    from: account,
                    to,
                    amount: self.parse_amount()?,
                    description,
                })
            }
        }
    }

    fn parse_amount(&self) -> Result<Money, LedgerError> {
        let amount = non_empty(&self.amount)
            .ok_or_else(|| LedgerError::InvalidAmount("missing amount".to_string()))?;
        Money::from_str(&amount)
    }
}

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
