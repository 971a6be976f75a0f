//! # Bank Ledger
//!
//! An account ledger that validates deposits, withdrawals and transfers
//! against per-account-type rules before committing them, plus a stateless
//! credit application evaluator.
//!
//! ## Design Principles
//!
//! - **Exact money**: 2 decimal places via `rust_decimal`; excess precision is rejected
//! - **All or nothing**: a rejected operation leaves balances, counters and history untouched
//! - **Typed failures**: every rejection is a [`LedgerError`] variant callers can match on
//! - **Append-only history**: committed records are never edited or removed
//!
//! ## Example
//!
//! ```
//! use bank_ledger::{AccountType, Ledger, Money};
//! use std::str::FromStr;
//!
//! let mut ledger = Ledger::new();
//! ledger
//!     .open_account("1234567890", "Juan Perez", AccountType::Checking, Money::from_units(5_000_000))
//!     .unwrap();
//! ledger
//!     .open_account("0987654321", "Maria Garcia", AccountType::Savings, Money::ZERO)
//!     .unwrap();
//!
//! let amount = Money::from_str("1500000").unwrap();
//! ledger.transfer("1234567890", "0987654321", amount, None).unwrap();
//! assert_eq!(ledger.account("0987654321").unwrap().balance(), amount);
//! ```

pub mod account;
pub mod credit;
pub mod error;
pub mod ledger;
pub mod money;
pub mod rules;
pub mod shared;
pub mod transaction;

pub use account::{validate_account_number, Account, AccountSnapshot, AccountStatus};
pub use credit::{CreditApplication, CreditEvaluator, CreditPolicy, Decision, DecisionReason};
pub use error::{BatchError, ErrorCategory, LedgerError, Leg, Result};
pub use ledger::Ledger;
pub use money::Money;
pub use rules::{AccountType, RuleSet};
pub use shared::SharedLedger;
pub use transaction::{Operation, OperationRecord, TransactionKind, TransactionRecord};
