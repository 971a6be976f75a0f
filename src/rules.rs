//! Per-account-type business rules.

use crate::error::LedgerError;
use crate::money::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account tier. Determines the default [`RuleSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Savings,
    Checking,
}

impl FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "savings" => Ok(AccountType::Savings),
            "checking" => Ok(AccountType::Checking),
            other => Err(LedgerError::InvalidAccountType(other.to_string())),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Savings => write!(f, "savings"),
            AccountType::Checking => write!(f, "checking"),
        }
    }
}

/// Limits and fees applied when validating account operations.
///
/// Attached to an account when it is opened and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Largest single withdrawal or outgoing transfer.
    pub daily_limit: Money,

    /// Floor the balance may not drop below after a debit.
    pub minimum_balance: Money,

    /// Operations (of any kind) allowed between period resets.
    pub max_transactions_per_period: u32,

    /// Stricter cap on outgoing transfers per period, if any.
    pub max_transfers_per_period: Option<u32>,

    /// Largest single deposit, if capped.
    pub deposit_cap: Option<Money>,

    /// Outgoing transfers strictly above this amount pay a fee.
    pub transfer_fee_threshold: Money,

    /// Fraction of the transfer amount charged as a fee.
    pub transfer_fee_rate: Decimal,

    /// Amount above which a transaction counts towards the fraud heuristic.
    pub large_transaction_threshold: Money,
}

impl RuleSet {
    pub fn for_type(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Checking => RuleSet {
                daily_limit: Money::from_units(10_000_000),
                minimum_balance: Money::from_units(20_000),
                max_transactions_per_period: 10,
                max_transfers_per_period: None,
                deposit_cap: None,
                transfer_fee_threshold: Money::from_units(5_000_000),
                transfer_fee_rate: Decimal::new(1, 3),
                large_transaction_threshold: Money::from_units(5_000_000),
            },
            AccountType::Savings => RuleSet {
                daily_limit: Money::from_units(5_000_000),
                minimum_balance: Money::ZERO,
                max_transactions_per_period: 10,
                max_transfers_per_period: Some(5),
                deposit_cap: Some(Money::from_units(20_000_000)),
                transfer_fee_threshold: Money::from_units(5_000_000),
                transfer_fee_rate: Decimal::ZERO,
                large_transaction_threshold: Money::from_units(5_000_000),
            },
        }
    }

    /// Fee charged on an outgoing transfer of `amount`.
    pub fn transfer_fee(&self, amount: Money) -> Result<Money, LedgerError> {
        if amount > self.transfer_fee_threshold {
            amount.apply_rate(self.transfer_fee_rate)
        } else {
            Ok(Money::ZERO)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checking_defaults() {
        let rules = RuleSet::for_type(AccountType::Checking);
        assert_eq!(rules.daily_limit, Money::from_units(10_000_000));
        assert_eq!(rules.minimum_balance, Money::from_units(20_000));
        assert_eq!(rules.max_transfers_per_period, None);
        assert_eq!(rules.transfer_fee_rate.to_string(), "0.001");
    }

    #[test]
    fn test_savings_transfer_cap_is_stricter() {
        let rules = RuleSet::for_type(AccountType::Savings);
        let transfers = rules.max_transfers_per_period.unwrap();
        assert!(transfers < rules.max_transactions_per_period);
        assert_eq!(rules.deposit_cap, Some(Money::from_units(20_000_000)));
        assert_eq!(rules.minimum_balance, Money::ZERO);
    }

    #[test]
    fn test_transfer_fee_only_above_threshold() {
        let rules = RuleSet::for_type(AccountType::Checking);
        assert_eq!(
            rules.transfer_fee(Money::from_units(5_000_000)).unwrap(),
            Money::ZERO
        );
        assert_eq!(
            rules.transfer_fee(Money::from_units(6_000_000)).unwrap(),
            Money::from_units(6_000)
        );

        let savings = RuleSet::for_type(AccountType::Savings);
        assert_eq!(
            savings.transfer_fee(Money::from_units(6_000_000)).unwrap(),
            Money::ZERO
        );
    }

    #[test]
    fn test_account_type_from_str() {
        assert_eq!(
            AccountType::from_str(" Checking").unwrap(),
            AccountType::Checking
        );
        assert!(AccountType::from_str("premium").is_err());
    }
}
