//! Account model and validated operations.
//!
//! Every mutating operation runs in two steps: a `check_*` pass that
//! evaluates all rules against the current state and produces a
//! [`Posting`], then an infallible commit. A failed check leaves the account
//! untouched.

use crate::error::{LedgerError, Result};
use crate::money::Money;
use crate::rules::{AccountType, RuleSet};
use crate::transaction::{TransactionKind, TransactionRecord};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

/// Number of large transactions that, inside one window, flag an account.
const SUSPICIOUS_BURST: usize = 4;

/// Width of the rolling window used by the fraud heuristic, in minutes.
const SUSPICIOUS_WINDOW_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Blocked,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Blocked => write!(f, "blocked"),
        }
    }
}

/// A validated balance change waiting to be committed.
#[derive(Debug, Clone)]
pub(crate) struct Posting {
    kind: TransactionKind,
    amount: Money,
    fee: Money,
    resulting_balance: Money,
    outgoing_transfer: bool,
}

/// Read-only projection of an account for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountSnapshot {
    pub account_number: String,
    pub holder: String,
    pub account_type: AccountType,
    pub balance: Money,
    pub status: AccountStatus,
    pub transactions_in_period: u32,
    pub daily_limit: Money,
}

/// A single account: balance, status, period counters and history.
///
/// # Invariants
///
/// - `balance >= rules.minimum_balance` after every committed debit
/// - `transactions_in_period <= rules.max_transactions_per_period`
/// - `history` only grows; records are never edited or removed
/// - `account_number` never changes after construction
#[derive(Debug, Clone)]
pub struct Account {
    account_number: String,
    holder: String,
    account_type: AccountType,
    rules: RuleSet,
    balance: Money,
    status: AccountStatus,
    transactions_in_period: u32,
    transfers_in_period: u32,
    history: Vec<TransactionRecord>,
}

/// Checks that `number` is exactly 10 ASCII digits.
pub fn validate_account_number(number: &str) -> Result<()> {
    if number.len() == 10 && number.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(LedgerError::InvalidAccountNumber(number.to_string()))
    }
}

impl Account {
    /// Opens an account with the default rules for its type and a zero balance.
    pub fn new(
        account_number: impl Into<String>,
        holder: impl Into<String>,
        account_type: AccountType,
    ) -> Result<Self> {
        Self::with_rules(
            account_number,
            holder,
            account_type,
            RuleSet::for_type(account_type),
            Money::ZERO,
        )
    }

    /// Opens an account with explicit rules and opening balance.
    ///
    /// The opening balance is not recorded in the history and does not count
    /// towards the period cap.
    pub fn with_rules(
        account_number: impl Into<String>,
        holder: impl Into<String>,
        account_type: AccountType,
        rules: RuleSet,
        initial_balance: Money,
    ) -> Result<Self> {
        let account_number = account_number.into();
        validate_account_number(&account_number)?;

        let holder = holder.into().trim().to_string();
        if holder.is_empty() {
            return Err(LedgerError::InvalidHolder);
        }

        if initial_balance < Money::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "opening balance {} is negative",
                initial_balance
            )));
        }

        Ok(Account {
            account_number,
            holder,
            account_type,
            rules,
            balance: initial_balance,
            status: AccountStatus::Active,
            transactions_in_period: 0,
            transfers_in_period: 0,
            history: Vec::new(),
        })
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn transactions_in_period(&self) -> u32 {
        self.transactions_in_period
    }

    /// Outgoing transfers since the last period reset.
    pub fn transfers_in_period(&self) -> u32 {
        self.transfers_in_period
    }

    /// Committed records in chronological order.
    pub fn history(&self) -> &[TransactionRecord] {
        &self.history
    }

    /// Deposits `amount`, stamped with the current time.
    pub fn deposit(&mut self, amount: Money, description: Option<&str>) -> Result<TransactionRecord> {
        self.deposit_at(amount, description, Utc::now())
    }

    pub fn deposit_at(
        &mut self,
        amount: Money,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        let posting = self.check_deposit(amount)?;
        Ok(self.commit(posting, at, description.map(str::to_string)))
    }

    /// Withdraws `amount`, stamped with the current time.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// status, amount, minimum balance, daily limit, period cap.
    pub fn withdraw(&mut self, amount: Money, description: Option<&str>) -> Result<TransactionRecord> {
        self.withdraw_at(amount, description, Utc::now())
    }

    pub fn withdraw_at(
        &mut self,
        amount: Money,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        let posting = self.check_withdrawal(amount)?;
        Ok(self.commit(posting, at, description.map(str::to_string)))
    }

    /// Blocks the account. Idempotent.
    pub fn block(&mut self) {
        self.status = AccountStatus::Blocked;
    }

    /// Reactivates the account. Idempotent.
    pub fn unblock(&mut self) {
        self.status = AccountStatus::Active;
    }

    /// Starts a new period: clears the transaction and transfer counters.
    pub fn reset_period_counter(&mut self) {
        self.transactions_in_period = 0;
        self.transfers_in_period = 0;
    }

    /// Returns `true` if any 4 large transactions fall within one hour.
    ///
    /// Advisory only; it never blocks an operation.
    pub fn detect_suspicious_activity(&self) -> bool {
        let threshold = self.rules.large_transaction_threshold;
        let window = Duration::minutes(SUSPICIOUS_WINDOW_MINUTES);

        let large: Vec<DateTime<Utc>> = self
            .history
            .iter()
            .filter(|record| record.amount() > threshold)
            .map(|record| record.timestamp())
            .collect();

        large
            .windows(SUSPICIOUS_BURST)
            .any(|burst| burst[SUSPICIOUS_BURST - 1] - burst[0] < window)
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            account_number: self.account_number.clone(),
            holder: self.holder.clone(),
            account_type: self.account_type,
            balance: self.balance,
            status: self.status,
            transactions_in_period: self.transactions_in_period,
            daily_limit: self.rules.daily_limit,
        }
    }

    pub(crate) fn check_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(LedgerError::InactiveAccount(self.account_number.clone()))
        }
    }

    fn check_period_cap(&self) -> Result<()> {
        if self.transactions_in_period >= self.rules.max_transactions_per_period {
            return Err(LedgerError::PeriodLimitExceeded {
                limit: self.rules.max_transactions_per_period,
            });
        }
        Ok(())
    }

    fn check_deposit_cap(&self, amount: Money) -> Result<()> {
        match self.rules.deposit_cap {
            Some(cap) if amount > cap => Err(LedgerError::DepositCapExceeded { amount, cap }),
            _ => Ok(()),
        }
    }

    /// Balance after debiting `debit`, or `InsufficientFunds` if it would
    /// fall below the minimum.
    fn check_minimum_balance(&self, debit: Money) -> Result<Money> {
        let resulting = self.balance.checked_sub(debit)?;
        if resulting < self.rules.minimum_balance {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                debit,
                minimum: self.rules.minimum_balance,
            });
        }
        Ok(resulting)
    }

    fn check_daily_limit(&self, amount: Money) -> Result<()> {
        if amount > self.rules.daily_limit {
            return Err(LedgerError::DailyLimitExceeded {
                amount,
                limit: self.rules.daily_limit,
            });
        }
        Ok(())
    }

    pub(crate) fn check_deposit(&self, amount: Money) -> Result<Posting> {
        self.check_credit(TransactionKind::Deposit, amount)
    }

    pub(crate) fn check_transfer_in(&self, amount: Money) -> Result<Posting> {
        self.check_credit(TransactionKind::Transfer, amount)
    }

    fn check_credit(&self, kind: TransactionKind, amount: Money) -> Result<Posting> {
        self.check_active()?;
        check_positive(amount)?;
        self.check_deposit_cap(amount)?;
        self.check_period_cap()?;

        Ok(Posting {
            kind,
            amount,
            fee: Money::ZERO,
            resulting_balance: self.balance.checked_add(amount)?,
            outgoing_transfer: false,
        })
    }

    pub(crate) fn check_withdrawal(&self, amount: Money) -> Result<Posting> {
        self.check_active()?;
        check_positive(amount)?;
        let resulting_balance = self.check_minimum_balance(amount)?;
        self.check_daily_limit(amount)?;
        self.check_period_cap()?;

        Ok(Posting {
            kind: TransactionKind::Withdrawal,
            amount,
            fee: Money::ZERO,
            resulting_balance,
            outgoing_transfer: false,
        })
    }

    /// Validates the source leg of a transfer, including any fee.
    ///
    /// The transfer sub-limit is checked before the general withdrawal rules.
    pub(crate) fn check_transfer_out(&self, amount: Money) -> Result<Posting> {
        self.check_active()?;
        check_positive(amount)?;

        if let Some(limit) = self.rules.max_transfers_per_period {
            if self.transfers_in_period >= limit {
                return Err(LedgerError::TransferCountExceeded { limit });
            }
        }

        let fee = self.rules.transfer_fee(amount)?;
        let resulting_balance = self.check_minimum_balance(amount.checked_add(fee)?)?;
        self.check_daily_limit(amount)?;
        self.check_period_cap()?;

        Ok(Posting {
            kind: TransactionKind::Transfer,
            amount,
            fee,
            resulting_balance,
            outgoing_transfer: true,
        })
    }

    /// Applies a posting produced by one of the `check_*` methods. The posting
    /// must have been checked against the account's current state.
    pub(crate) fn commit(
        &mut self,
        posting: Posting,
        at: DateTime<Utc>,
        description: Option<String>,
    ) -> TransactionRecord {
        self.balance = posting.resulting_balance;
        self.transactions_in_period += 1;
        if posting.outgoing_transfer {
            self.transfers_in_period += 1;
        }

        let record = TransactionRecord::new(
            posting.kind,
            posting.amount,
            posting.fee,
            at,
            posting.resulting_balance,
            description,
        );
        self.history.push(record.clone());
        record
    }
}

fn check_positive(amount: Money) -> Result<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(format!(
            "{} must be greater than zero",
            amount
        )))
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account {} - Holder: {} - Balance: {}",
            self.account_number, self.holder, self.balance
        )
    }
}
