use std::collections::BTreeMap;

use rush_types::{AccountId, Amount};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Where native currency can sit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pot {
    Account(AccountId),
    Treasury,
}

/// One movement of funds inside a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: Pot,
    pub to: Pot,
    pub amount: Amount,
}

impl Transfer {
    pub fn new(from: Pot, to: Pot, amount: Amount) -> Self {
        Self { from, to, amount }
    }
}

/// Balances computed by [`Bank::prepare`], applied by [`Bank::commit`].
#[derive(Debug)]
#[must_use]
pub struct Prepared {
    balances: BTreeMap<Pot, Amount>,
}

/// Native-currency balances of every account plus the ledger treasury.
///
/// `total_issued` counts every deposit ever credited; funds only move
/// between pots afterwards, so the sum of all balances and the treasury
/// always equals it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    balances: BTreeMap<AccountId, Amount>,
    treasury: Amount,
    total_issued: Amount,
}

impl Bank {
    /// Credit `amount` of new currency from the host chain. Returns the new balance.
    pub fn deposit(&mut self, account: AccountId, amount: Amount) -> LedgerResult<Amount> {
        let balance = self
            .balance(&account)
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let total_issued = self
            .total_issued
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.balances.insert(account, balance);
        self.total_issued = total_issued;
        Ok(balance)
    }

    pub fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn treasury(&self) -> Amount {
        self.treasury
    }

    pub fn total_issued(&self) -> Amount {
        self.total_issued
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Amount)> {
        self.balances.iter()
    }

    /// Fail unless `account` can cover `amount`.
    pub fn ensure_funds(&self, account: &AccountId, amount: Amount) -> LedgerResult<()> {
        let available = self.balance(account);
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *account,
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    fn pot_balance(&self, pot: Pot) -> Amount {
        match pot {
            Pot::Account(account) => self.balance(&account),
            Pot::Treasury => self.treasury,
        }
    }

    /// Work out the balances after applying `transfers` in order, without
    /// touching the bank. Fails on any overdraft or overflow.
    pub fn prepare(&self, transfers: &[Transfer]) -> LedgerResult<Prepared> {
        let mut balances: BTreeMap<Pot, Amount> = BTreeMap::new();
        for transfer in transfers {
            let from = *balances
                .entry(transfer.from)
                .or_insert_with(|| self.pot_balance(transfer.from));
            let debited = from.checked_sub(transfer.amount).ok_or(match transfer.from {
                Pot::Account(account) => LedgerError::InsufficientFunds {
                    account,
                    needed: transfer.amount,
                    available: from,
                },
                Pot::Treasury => LedgerError::InsufficientTreasury {
                    requested: transfer.amount,
                    available: from,
                },
            })?;
            balances.insert(transfer.from, debited);

            let to = *balances
                .entry(transfer.to)
                .or_insert_with(|| self.pot_balance(transfer.to));
            let credited = to
                .checked_add(transfer.amount)
                .ok_or(LedgerError::ArithmeticOverflow)?;
            balances.insert(transfer.to, credited);
        }
        Ok(Prepared { balances })
    }

    /// Apply balances produced by [`prepare`](Self::prepare) on this bank.
    pub fn commit(&mut self, prepared: Prepared) {
        for (pot, balance) in prepared.balances {
            match pot {
                Pot::Account(account) if balance == 0 => {
                    self.balances.remove(&account);
                }
                Pot::Account(account) => {
                    self.balances.insert(account, balance);
                }
                Pot::Treasury => self.treasury = balance,
            }
        }
    }

    /// Sum of every account balance and the treasury.
    pub fn circulating(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(self.treasury, |sum, balance| sum.checked_add(*balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from_label("alice")
    }

    fn bob() -> AccountId {
        AccountId::from_label("bob")
    }

    #[test]
    fn deposit_issues_currency() {
        let mut bank = Bank::default();
        assert_eq!(bank.deposit(alice(), 100).unwrap(), 100);
        assert_eq!(bank.deposit(alice(), 50).unwrap(), 150);
        assert_eq!(bank.total_issued(), 150);
        assert_eq!(bank.circulating(), Some(150));
        assert_eq!(bank.deposit(alice(), Amount::MAX).unwrap_err(), LedgerError::ArithmeticOverflow);
        assert_eq!(bank.balance(&alice()), 150);
    }

    #[test]
    fn prepared_transfers_apply_together() {
        let mut bank = Bank::default();
        bank.deposit(alice(), 100).unwrap();

        let prepared = bank
            .prepare(&[
                Transfer::new(Pot::Account(alice()), Pot::Account(bob()), 70),
                Transfer::new(Pot::Account(alice()), Pot::Treasury, 30),
            ])
            .unwrap();
        assert_eq!(bank.balance(&bob()), 0);
        bank.commit(prepared);

        assert_eq!(bank.balance(&alice()), 0);
        assert_eq!(bank.balance(&bob()), 70);
        assert_eq!(bank.treasury(), 30);
        assert_eq!(bank.accounts().count(), 1);
        assert_eq!(bank.circulating(), Some(bank.total_issued()));
    }

    #[test]
    fn overdraft_anywhere_rejects_the_batch() {
        let mut bank = Bank::default();
        bank.deposit(alice(), 100).unwrap();

        let err = bank
            .prepare(&[
                Transfer::new(Pot::Account(alice()), Pot::Account(bob()), 60),
                Transfer::new(Pot::Account(alice()), Pot::Treasury, 60),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                account: alice(),
                needed: 60,
                available: 40
            }
        );

        let err = bank
            .prepare(&[Transfer::new(Pot::Treasury, Pot::Account(bob()), 1)])
            .unwrap_err();
        assert_eq!(err, LedgerError::InsufficientTreasury { requested: 1, available: 0 });
        assert_eq!(bank.balance(&alice()), 100);
    }
}
