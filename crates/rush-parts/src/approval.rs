use std::collections::{BTreeMap, BTreeSet};

use rush_types::AccountId;
use serde::{Deserialize, Serialize};

/// Non-fungible transfer approvals for one token table.
///
/// An account may move a token if it owns it, is the single account approved
/// for that token, or is an operator approved for all of the owner's tokens.
/// Per-token approval is cleared whenever the token changes hands; operator
/// approvals belong to the owner and survive transfers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize + Ord",
    deserialize = "T: Deserialize<'de> + Ord"
))]
pub struct Approvals<T> {
    token: BTreeMap<T, AccountId>,
    operators: BTreeMap<AccountId, BTreeSet<AccountId>>,
}

impl<T> Default for Approvals<T> {
    fn default() -> Self {
        Self {
            token: BTreeMap::new(),
            operators: BTreeMap::new(),
        }
    }
}

impl<T: Ord + Copy> Approvals<T> {
    /// Set or clear the approved account for a single token.
    pub fn approve(&mut self, id: T, account: Option<AccountId>) {
        match account {
            Some(account) => {
                self.token.insert(id, account);
            }
            None => {
                self.token.remove(&id);
            }
        }
    }

    pub fn approved(&self, id: T) -> Option<AccountId> {
        self.token.get(&id).copied()
    }

    /// Grant or revoke `operator` authority over every token of `owner`.
    pub fn set_operator(&mut self, owner: AccountId, operator: AccountId, approved: bool) {
        if approved {
            self.operators.entry(owner).or_default().insert(operator);
        } else if let Some(set) = self.operators.get_mut(&owner) {
            set.remove(&operator);
            if set.is_empty() {
                self.operators.remove(&owner);
            }
        }
    }

    pub fn is_operator(&self, owner: &AccountId, operator: &AccountId) -> bool {
        self.operators
            .get(owner)
            .is_some_and(|set| set.contains(operator))
    }

    /// Whether `account` may move token `id` currently held by `owner`.
    pub fn is_authorized(&self, owner: &AccountId, id: T, account: &AccountId) -> bool {
        owner == account
            || self.approved(id).as_ref() == Some(account)
            || self.is_operator(owner, account)
    }

    /// Drop the per-token approval (called on transfer).
    pub fn clear(&mut self, id: T) {
        self.token.remove(&id);
    }
}
