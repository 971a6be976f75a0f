//! Thread-safe handle around a [`Ledger`].
//!
//! A single lock guards the whole ledger. Each call holds it for validation
//! and commit together, so no other thread can observe a transfer with only
//! one leg applied.

use crate::account::AccountSnapshot;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::money::Money;
use crate::rules::AccountType;
use crate::transaction::TransactionRecord;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable, lock-guarded ledger for concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        SharedLedger {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Runs `f` with shared access to the ledger while holding the lock.
    pub fn with<T>(&self, f: impl FnOnce(&Ledger) -> T) -> T {
        f(&self.inner.lock())
    }

    /// Runs `f` with exclusive access to the ledger while holding the lock.
    ///
    /// Several operations inside one closure commit as a unit with respect to
    /// other handles.
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut Ledger) -> T) -> T {
        f(&mut self.inner.lock())
    }

    pub fn open_account(
        &self,
        account_number: &str,
        holder: &str,
        account_type: AccountType,
        initial_balance: Money,
    ) -> Result<AccountSnapshot> {
        self.with_mut(|ledger| {
            ledger
                .open_account(account_number, holder, account_type, initial_balance)
                .map(|account| account.snapshot())
        })
    }

    pub fn deposit(
        &self,
        account_number: &str,
        amount: Money,
        description: Option<&str>,
    ) -> Result<TransactionRecord> {
        self.with_mut(|ledger| ledger.deposit(account_number, amount, description))
    }

    pub fn withdraw(
        &self,
        account_number: &str,
        amount: Money,
        description: Option<&str>,
    ) -> Result<TransactionRecord> {
        self.with_mut(|ledger| ledger.withdraw(account_number, amount, description))
    }

    pub fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: Money,
        description: Option<&str>,
    ) -> Result<(TransactionRecord, TransactionRecord)> {
        self.with_mut(|ledger| ledger.transfer(from, to, amount, description))
    }

    pub fn snapshot(&self, account_number: &str) -> Result<AccountSnapshot> {
        self.with(|ledger| ledger.snapshot(account_number))
    }

    pub fn total_balance(&self) -> Result<Money> {
        self.with(Ledger::total_balance)
    }

    /// Unwraps the ledger if this is the last handle.
    pub fn into_inner(self) -> std::result::Result<Ledger, Self> {
        Arc::try_unwrap(self.inner)
            .map(|mutex| mutex.into_inner())
            .map_err(|inner| SharedLedger { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;
    use std::str::FromStr;
    use std::thread;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn test_concurrent_transfers_conserve_balance() {
        let mut rules = RuleSet::for_type(AccountType::Savings);
        rules.max_transactions_per_period = 1_000;
        rules.max_transfers_per_period = None;

        let mut ledger = Ledger::new();
        ledger
            .open_account_with_rules(
                "1111111111",
                "Ana",
                AccountType::Savings,
                rules.clone(),
                money("1000"),
            )
            .unwrap();
        ledger
            .open_account_with_rules(
                "2222222222",
                "Luis",
                AccountType::Savings,
                rules,
                money("1000"),
            )
            .unwrap();
        let shared = SharedLedger::new(ledger);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let (from, to) = if i % 2 == 0 {
                        ("1111111111", "2222222222")
                    } else {
                        ("2222222222", "1111111111")
                    };
                    for _ in 0..50 {
                        let _ = shared.transfer(from, to, money("7.5"), None);
                        assert_eq!(shared.total_balance().unwrap(), money("2000"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let ledger = shared.into_inner().unwrap();
        assert_eq!(ledger.total_balance().unwrap(), money("2000"));
        let records = ledger.account("1111111111").unwrap().history().len()
            + ledger.account("2222222222").unwrap().history().len();
        assert_eq!(records % 2, 0);
    }

    #[test]
    fn test_with_mut_groups_operations() {
        let shared = SharedLedger::default();
        shared
            .open_account("1234567890", "Juan", AccountType::Checking, money("50000"))
            .unwrap();

        let balance = shared.with_mut(|ledger| {
            ledger.deposit("1234567890", money("100"), None)?;
            ledger.withdraw("1234567890", money("50"), None)?;
            Ok::<_, crate::LedgerError>(ledger.account("1234567890")?.balance())
        });

        assert_eq!(balance.unwrap(), money("50050"));
        assert_eq!(
            shared.snapshot("1234567890").unwrap().transactions_in_period,
            2
        );
    }
}
