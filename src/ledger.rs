//! The ledger: owns every account and coordinates transfers.
//!
//! Transfers validate both legs against committed state before either
//! account is touched, so a rejected transfer leaves no trace.

use crate::account::{Account, AccountSnapshot};
use crate::error::{BatchError, LedgerError, Leg, Result};
use crate::money::Money;
use crate::rules::{AccountType, RuleSet};
use crate::transaction::{Operation, OperationRecord, TransactionRecord};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{Read, Write};

/// Collection of accounts keyed by account number.
///
/// Callers never hold an account across operations; everything goes through
/// the ledger by number.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: HashMap<String, Account>,
}

impl Ledger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Ledger {
            accounts: HashMap::new(),
        }
    }

    /// Opens an account with the default rules for `account_type`.
    pub fn open_account(
        &mut self,
        account_number: &str,
        holder: &str,
        account_type: AccountType,
        initial_balance: Money,
    ) -> Result<&Account> {
        self.open_account_with_rules(
            account_number,
            holder,
            account_type,
            RuleSet::for_type(account_type),
            initial_balance,
        )
    }

    /// Opens an account with a caller-supplied rule set.
    pub fn open_account_with_rules(
        &mut self,
        account_number: &str,
        holder: &str,
        account_type: AccountType,
        rules: RuleSet,
        initial_balance: Money,
    ) -> Result<&Account> {
        let account = Account::with_rules(
            account_number,
            holder,
            account_type,
            rules,
            initial_balance,
        )?;

        match self.accounts.entry(account_number.to_string()) {
            Entry::Occupied(entry) => {
                debug!("Rejected duplicate account {}", entry.key());
                Err(LedgerError::DuplicateAccount(entry.key().clone()))
            }
            Entry::Vacant(entry) => {
                let account = entry.insert(account);
                debug!("Opened {} {}", account_type, account);
                Ok(&*account)
            }
        }
    }

    pub fn account(&self, account_number: &str) -> Result<&Account> {
        self.accounts
            .get(account_number)
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))
    }

    fn account_mut(&mut self, account_number: &str) -> Result<&mut Account> {
        self.accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum of all account balances. Fails only if the sum overflows.
    pub fn total_balance(&self) -> Result<Money> {
        self.accounts
            .values()
            .map(Account::balance)
            .try_fold(Money::ZERO, Money::checked_add)
    }

    pub fn deposit(
        &mut self,
        account_number: &str,
        amount: Money,
        description: Option<&str>,
    ) -> Result<TransactionRecord> {
        self.deposit_at(account_number, amount, description, Utc::now())
    }

    pub fn deposit_at(
        &mut self,
        account_number: &str,
        amount: Money,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        let result = self
            .account_mut(account_number)
            .and_then(|account| account.deposit_at(amount, description, at));
        log_outcome("Deposit", account_number, amount, &result);
        result
    }

    pub fn withdraw(
        &mut self,
        account_number: &str,
        amount: Money,
        description: Option<&str>,
    ) -> Result<TransactionRecord> {
        self.withdraw_at(account_number, amount, description, Utc::now())
    }

    pub fn withdraw_at(
        &mut self,
        account_number: &str,
        amount: Money,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        let result = self
            .account_mut(account_number)
            .and_then(|account| account.withdraw_at(amount, description, at));
        log_outcome("Withdrawal", account_number, amount, &result);
        result
    }

    /// Moves `amount` from one account to another, all or nothing.
    ///
    /// Returns the source and destination records, in that order.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Money,
        description: Option<&str>,
    ) -> Result<(TransactionRecord, TransactionRecord)> {
        self.transfer_at(from, to, amount, description, Utc::now())
    }

    /// Transfer with an explicit timestamp.
    ///
    /// Checks, first failure wins: both accounts exist, both are active,
    /// amount is positive, accounts differ, then the source leg (transfer
    /// sub-limit, minimum balance including fee, daily limit, period cap) and
    /// the destination leg (deposit cap, period cap).
    pub fn transfer_at(
        &mut self,
        from: &str,
        to: &str,
        amount: Money,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(TransactionRecord, TransactionRecord)> {
        let result = self.try_transfer(from, to, amount, description, at);
        match &result {
            Ok((debit, _)) if debit.fee().is_zero() => {
                debug!("Transferred {} from {} to {}", amount, from, to)
            }
            Ok((debit, _)) => debug!(
                "Transferred {} from {} to {} (fee {})",
                amount,
                from,
                to,
                debit.fee()
            ),
            Err(e) => debug!(
                "Transfer of {} from {} to {} rejected: {}",
                amount, from, to, e
            ),
        }
        result
    }

    fn try_transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Money,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(TransactionRecord, TransactionRecord)> {
        let source = self
            .account(from)
            .map_err(|e| e.on_leg(Leg::Source))?;
        let destination = self
            .account(to)
            .map_err(|e| e.on_leg(Leg::Destination))?;

        source.check_active().map_err(|e| e.on_leg(Leg::Source))?;
        destination
            .check_active()
            .map_err(|e| e.on_leg(Leg::Destination))?;

        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "{} must be greater than zero",
                amount
            )));
        }
        if from == to {
            return Err(LedgerError::SelfTransfer(from.to_string()));
        }

        let debit = source
            .check_transfer_out(amount)
            .map_err(|e| e.on_leg(Leg::Source))?;
        let credit = destination
            .check_transfer_in(amount)
            .map_err(|e| e.on_leg(Leg::Destination))?;

        let (debit_description, credit_description) = match description {
            Some(text) => (text.to_string(), text.to_string()),
            None => (format!("transfer to {}", to), format!("transfer from {}", from)),
        };

        // Both legs validated against the same state; commits cannot fail.
        let debit_record = self
            .account_mut(from)?
            .commit(debit, at, Some(debit_description));
        let credit_record = self
            .account_mut(to)?
            .commit(credit, at, Some(credit_description));
        Ok((debit_record, credit_record))
    }

    /// Blocks an account. Idempotent.
    pub fn block(&mut self, account_number: &str) -> Result<()> {
        self.account_mut(account_number)?.block();
        debug!("Blocked account {}", account_number);
        Ok(())
    }

    /// Reactivates an account. Idempotent.
    pub fn unblock(&mut self, account_number: &str) -> Result<()> {
        self.account_mut(account_number)?.unblock();
        debug!("Unblocked account {}", account_number);
        Ok(())
    }

    pub fn reset_period_counter(&mut self, account_number: &str) -> Result<()> {
        self.account_mut(account_number)?.reset_period_counter();
        debug!("Reset period counters for account {}", account_number);
        Ok(())
    }

    /// Period rollover for every account.
    pub fn reset_all_period_counters(&mut self) {
        for account in self.accounts.values_mut() {
            account.reset_period_counter();
        }
        debug!("Reset period counters for {} accounts", self.accounts.len());
    }

    pub fn detect_suspicious_activity(&self, account_number: &str) -> Result<bool> {
        Ok(self.account(account_number)?.detect_suspicious_activity())
    }

    pub fn snapshot(&self, account_number: &str) -> Result<AccountSnapshot> {
        Ok(self.account(account_number)?.snapshot())
    }

    /// Snapshots of every account, sorted by account number.
    pub fn snapshots(&self) -> Vec<AccountSnapshot> {
        let mut snapshots: Vec<_> = self.accounts.values().map(Account::snapshot).collect();
        snapshots.sort_by(|a, b| a.account_number.cmp(&b.account_number));
        snapshots
    }

    /// Applies a single parsed batch operation.
    pub fn apply(&mut self, operation: Operation) -> Result<()> {
        match operation {
            Operation::Open {
                account,
                holder,
                account_type,
                initial_balance,
            } => {
                self.open_account(&account, &holder, account_type, initial_balance)?;
            }
            Operation::Deposit {
                account,
                amount,
                description,
            } => {
                self.deposit(&account, amount, description.as_deref())?;
            }
            Operation::Withdrawal {
                account,
                amount,
                description,
            } => {
                self.withdraw(&account, amount, description.as_deref())?;
            }
            Operation::Transfer {
                from,
                to,
                amount,
                description,
            } => {
                self.transfer(&from, &to, amount, description.as_deref())?;
            }
            Operation::Block { account } => self.block(&account)?,
            Operation::Unblock { account } => self.unblock(&account)?,
            Operation::ResetPeriod { account } => self.reset_period_counter(&account)?,
        }
        Ok(())
    }

    /// Applies operations from a CSV reader in streaming fashion.
    ///
    /// Malformed or rejected rows are logged at warn level and skipped.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> std::result::Result<(), BatchError> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<OperationRecord>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(record) => match record.parse() {
                    Ok(operation) => {
                        if let Err(e) = self.apply(operation) {
                            warn!("Row {}: {}", row_num, e);
                        }
                    }
                    Err(e) => warn!("Row {}: Failed to parse operation: {}", row_num, e),
                },
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        Ok(())
    }

    /// Writes account snapshots to CSV, sorted by account number.
    pub fn write_output<W: Write>(&self, writer: W) -> std::result::Result<(), BatchError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "account",
            "holder",
            "type",
            "status",
            "balance",
            "transactions_in_period",
            "daily_limit",
            "suspicious",
        ])?;

        for snapshot in self.snapshots() {
            let suspicious = self
                .accounts
                .get(&snapshot.account_number)
                .map(Account::detect_suspicious_activity)
                .unwrap_or(false);

            csv_writer.write_record([
                snapshot.account_number,
                snapshot.holder,
                snapshot.account_type.to_string(),
                snapshot.status.to_string(),
                snapshot.balance.to_string(),
                snapshot.transactions_in_period.to_string(),
                snapshot.daily_limit.to_string(),
                suspicious.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn log_outcome(operation: &str, account: &str, amount: Money, result: &Result<TransactionRecord>) {
    match result {
        Ok(record) => debug!(
            "Applied {} on {}, balance {}",
            record,
            account,
            record.resulting_balance()
        ),
        Err(e) => debug!("{} of {} on {} rejected: {}", operation, amount, account, e),
    }
}
