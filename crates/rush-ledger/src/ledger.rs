use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rush_compose::{CarComposition, CompactCarStats, FullCarMetadata};
use rush_market::{ApprovalStatus, Listing, PurchasePlan};
use rush_parts::{OwnerPartsDetails, Part};
use rush_types::{AccountId, Amount, CarId, MintCarRequest, PartId, PartSpec, PartType, SLOT_COUNT};
use rush_workshop::{RepairReceipt, ScoreEntry};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::invariants::InvariantReport;
use crate::journal::{Authority, JournalEntry, ValidationReport};
use crate::state::LedgerState;

/// The shared, serialized ledger.
///
/// All state sits behind one `RwLock`. Every mutating operation holds the
/// write lock for its whole duration, so transactions are serialized and
/// readers never observe a half-applied operation.
pub struct Ledger {
    inner: RwLock<LedgerState>,
}

impl Ledger {
    pub fn new(operator: AccountId, config: &LedgerConfig) -> LedgerResult<Self> {
        let state = LedgerState::genesis(operator, config)?;
        tracing::info!(operator = %operator, "ledger created");
        Ok(Self {
            inner: RwLock::new(state),
        })
    }

    /// Restore a ledger from a snapshot, refusing one whose journal or
    /// cross-component invariants do not check out.
    pub fn from_snapshot(state: LedgerState) -> LedgerResult<Self> {
        let journal = state.journal().validate();
        if !journal.is_valid() {
            return Err(LedgerError::CorruptSnapshot(format!(
                "journal has {} violation(s)",
                journal.violations.len()
            )));
        }
        let invariants = state.check_invariants();
        if let Some(violation) = invariants.violations.first() {
            return Err(LedgerError::CorruptSnapshot(violation.description.clone()));
        }
        Ok(Self {
            inner: RwLock::new(state),
        })
    }

    pub fn from_json(json: &str) -> LedgerResult<Self> {
        let state: LedgerState =
            serde_json::from_str(json).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        Self::from_snapshot(state)
    }

    /// A consistent copy of the whole state.
    pub fn snapshot(&self) -> LedgerResult<LedgerState> {
        Ok(self.read()?.clone())
    }

    pub fn to_json(&self) -> LedgerResult<String> {
        let state = self.read()?;
        serde_json::to_string_pretty(&*state).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }

    /// Run a read-only closure against a consistent view of the state.
    pub fn view<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> LedgerResult<R> {
        Ok(f(&*self.read()?))
    }

    fn transact<T>(&self, op: &'static str, f: impl FnOnce(&mut LedgerState) -> LedgerResult<T>) -> LedgerResult<T> {
        let mut state = self.write()?;
        f(&mut *state).inspect_err(|e| tracing::warn!(op, error = %e, "operation rejected"))
    }

    // ---- Currency ----

    pub fn deposit(&self, account: AccountId, amount: Amount) -> LedgerResult<Amount> {
        self.transact("deposit", |s| s.deposit(account, amount))
    }

    pub fn withdraw(&self, caller: AccountId, amount: Option<Amount>) -> LedgerResult<Amount> {
        self.transact("withdraw", |s| s.withdraw(caller, amount))
    }

    pub fn balance(&self, account: &AccountId) -> LedgerResult<Amount> {
        self.view(|s| s.bank().balance(account))
    }

    pub fn treasury(&self) -> LedgerResult<Amount> {
        self.view(|s| s.bank().treasury())
    }

    // ---- Minting ----

    pub fn mint_car(&self, caller: AccountId, request: &MintCarRequest, payment: Amount) -> LedgerResult<CarId> {
        self.transact("mint_car", |s| s.mint_car(caller, request, payment))
    }

    pub fn mint_part(&self, caller: AccountId, owner: AccountId, spec: &PartSpec) -> LedgerResult<PartId> {
        self.transact("mint_part", |s| s.mint_part(caller, owner, spec))
    }

    pub fn mint_price(&self) -> LedgerResult<Amount> {
        self.view(LedgerState::mint_price)
    }

    // ---- Composition ----

    pub fn equip_part(&self, caller: AccountId, car_id: CarId, part_id: PartId, slot: usize) -> LedgerResult<()> {
        self.transact("equip_part", |s| s.equip_part(caller, car_id, part_id, slot))
    }

    pub fn unequip_part(&self, caller: AccountId, car_id: CarId, part_id: PartId) -> LedgerResult<()> {
        self.transact("unequip_part", |s| s.unequip_part(caller, car_id, part_id))
    }

    pub fn replace_part(&self, caller: AccountId, car_id: CarId, old_part: PartId, new_part: PartId) -> LedgerResult<()> {
        self.transact("replace_part", |s| s.replace_part(caller, car_id, old_part, new_part))
    }

    pub fn car_composition(&self, car_id: CarId) -> LedgerResult<CarComposition> {
        self.view(|s| s.cars().composition(car_id))?.map_err(Into::into)
    }

    pub fn compact_car_stats(&self, car_id: CarId) -> LedgerResult<CompactCarStats> {
        self.view(|s| s.cars().compact_stats(s.parts(), car_id))?
            .map_err(Into::into)
    }

    pub fn full_car_metadata(&self, car_id: CarId) -> LedgerResult<FullCarMetadata> {
        self.view(|s| s.cars().full_metadata(s.parts(), car_id))?
            .map_err(Into::into)
    }

    pub fn all_car_metadata(&self, owner: &AccountId) -> LedgerResult<Vec<FullCarMetadata>> {
        self.view(|s| s.cars().all_metadata(s.parts(), owner))?
            .map_err(Into::into)
    }

    pub fn owner_cars(&self, owner: &AccountId) -> LedgerResult<Vec<CarId>> {
        self.view(|s| s.cars().owner_cars(owner))
    }

    pub fn last_car_id(&self) -> LedgerResult<Option<CarId>> {
        self.view(|s| s.cars().last_car_id())
    }

    // ---- Parts ----

    pub fn part(&self, part_id: PartId) -> LedgerResult<Part> {
        self.view(|s| s.parts().get(part_id).cloned())?
            .map_err(Into::into)
    }

    pub fn owner_parts(&self, owner: &AccountId) -> LedgerResult<Vec<PartId>> {
        self.view(|s| s.parts().owner_parts(owner))
    }

    pub fn owner_parts_by_type(&self, owner: &AccountId, part_type: PartType) -> LedgerResult<Vec<PartId>> {
        self.view(|s| s.parts().owner_parts_by_type(owner, part_type))
    }

    pub fn owner_equipped_parts(&self, owner: &AccountId) -> LedgerResult<Vec<PartId>> {
        self.view(|s| s.parts().owner_equipped_parts(owner))
    }

    pub fn owner_unequipped_parts(&self, owner: &AccountId) -> LedgerResult<Vec<PartId>> {
        self.view(|s| s.parts().owner_unequipped_parts(owner))
    }

    pub fn owner_parts_with_details(&self, owner: &AccountId) -> LedgerResult<OwnerPartsDetails> {
        self.view(|s| s.parts().owner_parts_with_details(owner))
    }

    // ---- Ownership ----

    pub fn transfer_part(&self, caller: AccountId, part_id: PartId, to: AccountId) -> LedgerResult<()> {
        self.transact("transfer_part", |s| s.transfer_part(caller, part_id, to))
    }

    pub fn transfer_car(&self, caller: AccountId, car_id: CarId, to: AccountId) -> LedgerResult<()> {
        self.transact("transfer_car", |s| s.transfer_car(caller, car_id, to))
    }

    pub fn approve_part(&self, caller: AccountId, part_id: PartId, approved: Option<AccountId>) -> LedgerResult<()> {
        self.transact("approve_part", |s| s.approve_part(caller, part_id, approved))
    }

    pub fn approve_car(&self, caller: AccountId, car_id: CarId, approved: Option<AccountId>) -> LedgerResult<()> {
        self.transact("approve_car", |s| s.approve_car(caller, car_id, approved))
    }

    pub fn set_approval_for_all(&self, caller: AccountId, operator: AccountId, approved: bool) -> LedgerResult<()> {
        self.transact("set_approval_for_all", |s| {
            s.set_approval_for_all(caller, operator, approved)
        })
    }

    // ---- Marketplace ----

    /// The account sellers approve so purchases can move their assets.
    pub fn marketplace_account(&self) -> LedgerResult<AccountId> {
        self.view(|s| s.market().account())
    }

    pub fn list_car(&self, caller: AccountId, car_id: CarId, price: Amount, include_slots: [bool; SLOT_COUNT]) -> LedgerResult<()> {
        self.transact("list_car", |s| s.list_car(caller, car_id, price, include_slots))
    }

    pub fn cancel_listing(&self, caller: AccountId, car_id: CarId) -> LedgerResult<()> {
        self.transact("cancel_listing", |s| s.cancel_listing(caller, car_id))
    }

    pub fn buy_car(&self, buyer: AccountId, car_id: CarId, payment: Amount) -> LedgerResult<PurchasePlan> {
        self.transact("buy_car", |s| s.buy_car(buyer, car_id, payment))
    }

    pub fn listing(&self, car_id: CarId) -> LedgerResult<Option<Listing>> {
        self.view(|s| s.market().listing(car_id).cloned())
    }

    pub fn active_listings(&self) -> LedgerResult<Vec<Listing>> {
        self.view(|s| s.market().active_listings().into_iter().cloned().collect())
    }

    pub fn listing_approval_status(&self, car_id: CarId, include_slots: [bool; SLOT_COUNT]) -> LedgerResult<ApprovalStatus> {
        self.view(|s| s.market().approval_status(s.cars(), s.parts(), car_id, include_slots))?
            .map_err(Into::into)
    }

    // ---- Workshop & leaderboard ----

    pub fn repair_car(&self, caller: AccountId, car_id: CarId, payment: Amount) -> LedgerResult<RepairReceipt> {
        self.transact("repair_car", |s| s.repair_car(caller, car_id, payment))
    }

    pub fn apply_wear(&self, caller: AccountId, car_id: CarId, amount: u8) -> LedgerResult<u8> {
        self.transact("apply_wear", |s| s.apply_wear(caller, car_id, amount))
    }

    pub fn record_race_result(&self, caller: AccountId, car_id: CarId, score: u64) -> LedgerResult<bool> {
        self.transact("record_race_result", |s| s.record_race_result(caller, car_id, score))
    }

    pub fn best_score(&self, car_id: CarId) -> LedgerResult<Option<u64>> {
        self.view(|s| s.leaderboard().best_score(car_id))
    }

    pub fn leaderboard_top(&self, n: usize) -> LedgerResult<Vec<ScoreEntry>> {
        self.view(|s| s.leaderboard().top(n))
    }

    pub fn rank_of(&self, car_id: CarId) -> LedgerResult<Option<usize>> {
        self.view(|s| s.leaderboard().rank_of(car_id))
    }

    // ---- Operator controls ----

    pub fn set_mint_price(&self, caller: AccountId, price: Amount) -> LedgerResult<()> {
        self.transact("set_mint_price", |s| s.set_mint_price(caller, price))
    }

    pub fn set_repair_price(&self, caller: AccountId, price: Amount) -> LedgerResult<()> {
        self.transact("set_repair_price", |s| s.set_repair_price(caller, price))
    }

    pub fn set_protocol_fee(&self, caller: AccountId, bps: u16) -> LedgerResult<()> {
        self.transact("set_protocol_fee", |s| s.set_protocol_fee(caller, bps))
    }

    pub fn set_workshop_authority(&self, caller: AccountId, account: Option<AccountId>) -> LedgerResult<()> {
        self.transact("set_workshop_authority", |s| {
            s.set_authority(caller, Authority::Workshop, account)
        })
    }

    pub fn set_leaderboard_authority(&self, caller: AccountId, account: Option<AccountId>) -> LedgerResult<()> {
        self.transact("set_leaderboard_authority", |s| {
            s.set_authority(caller, Authority::Leaderboard, account)
        })
    }

    pub fn transfer_operator(&self, caller: AccountId, to: AccountId) -> LedgerResult<()> {
        self.transact("transfer_operator", |s| s.transfer_operator(caller, to))
    }

    pub fn operator(&self) -> LedgerResult<AccountId> {
        self.view(LedgerState::operator)
    }

    pub fn set_base_uri(&self, caller: AccountId, uri: impl Into<String>) -> LedgerResult<()> {
        let uri = uri.into();
        self.transact("set_base_uri", |s| s.set_base_uri(caller, uri))
    }

    pub fn base_uri(&self) -> LedgerResult<String> {
        self.view(|s| s.base_uri().to_string())
    }

    pub fn car_token_uri(&self, car_id: CarId) -> LedgerResult<String> {
        self.view(|s| s.car_token_uri(car_id))?
    }

    pub fn part_token_uri(&self, part_id: PartId) -> LedgerResult<String> {
        self.view(|s| s.part_token_uri(part_id))?
    }

    // ---- Integrity ----

    pub fn journal(&self) -> LedgerResult<Vec<JournalEntry>> {
        self.view(|s| s.journal().entries().to_vec())
    }

    pub fn validate_journal(&self) -> LedgerResult<ValidationReport> {
        self.view(|s| s.journal().validate())
    }

    pub fn check_invariants(&self) -> LedgerResult<InvariantReport> {
        self.view(LedgerState::check_invariants)
    }
}
