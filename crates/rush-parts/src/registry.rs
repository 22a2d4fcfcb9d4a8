use std::collections::BTreeMap;

use rush_types::{AccountId, CarId, PartId, PartSpec, PartType};
use serde::{Deserialize, Serialize};

use crate::approval::Approvals;
use crate::error::{PartsError, PartsResult};
use crate::index::OwnerParts;

/// Default upper bound for any single part stat.
pub const DEFAULT_MAX_STAT: u8 = 10;

/// A part token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub owner: AccountId,
    pub part_type: PartType,
    pub stat1: u8,
    pub stat2: u8,
    pub stat3: u8,
    pub image_uri: String,
    /// The car whose slot holds this part, if any.
    pub equipped_to: Option<CarId>,
}

impl Part {
    pub fn is_equipped(&self) -> bool {
        self.equipped_to.is_some()
    }

    pub fn stats(&self) -> [u8; 3] {
        [self.stat1, self.stat2, self.stat3]
    }

    /// The mint parameters this part was created from.
    pub fn spec(&self) -> PartSpec {
        PartSpec::new(self.part_type, self.stats(), self.image_uri.clone())
    }
}

/// Full part records for one owner, split the same way as the indices.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerPartsDetails {
    pub all_parts: Vec<Part>,
    pub equipped_parts: Vec<Part>,
    pub unequipped_parts: Vec<Part>,
}

/// Authoritative part table plus per-owner index partitions.
///
/// Every mutation that touches a part's owner or equipped flag updates the
/// matching index partitions in the same call, so the indices are never
/// stale relative to the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRegistry {
    parts: BTreeMap<PartId, Part>,
    owners: BTreeMap<AccountId, OwnerParts>,
    approvals: Approvals<PartId>,
    last_id: u64,
    max_stat: u8,
}

impl Default for PartRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STAT)
    }
}

impl PartRegistry {
    pub fn new(max_stat: u8) -> Self {
        Self {
            parts: BTreeMap::new(),
            owners: BTreeMap::new(),
            approvals: Approvals::default(),
            last_id: 0,
            max_stat,
        }
    }

    pub fn max_stat(&self) -> u8 {
        self.max_stat
    }

    // ---- Mint ----

    /// Check a spec against the stat bounds without mutating anything.
    pub fn validate_spec(&self, spec: &PartSpec) -> PartsResult<()> {
        for value in spec.stats() {
            if value > self.max_stat {
                return Err(PartsError::InvalidStat {
                    value,
                    max: self.max_stat,
                });
            }
        }
        Ok(())
    }

    /// Mint a single part for `owner`, optionally pre-equipped to `car`.
    pub fn mint(
        &mut self,
        owner: AccountId,
        spec: &PartSpec,
        equipped_to: Option<CarId>,
    ) -> PartsResult<PartId> {
        self.mint_batch(owner, &[(spec.clone(), equipped_to)])?
            .into_iter()
            .next()
            .ok_or(PartsError::IdExhausted)
    }

    /// Mint several parts for `owner`. All specs are validated before any
    /// part is created, so a bad spec leaves the registry untouched.
    pub fn mint_batch(
        &mut self,
        owner: AccountId,
        specs: &[(PartSpec, Option<CarId>)],
    ) -> PartsResult<Vec<PartId>> {
        for (spec, _) in specs {
            self.validate_spec(spec)?;
        }
        let needed = specs.len() as u64;
        if self.last_id.checked_add(needed).is_none() {
            return Err(PartsError::IdExhausted);
        }

        let mut minted = Vec::with_capacity(specs.len());
        for (spec, equipped_to) in specs {
            self.last_id += 1;
            let id = PartId(self.last_id);
            let part = Part {
                id,
                owner,
                part_type: spec.part_type,
                stat1: spec.stat1,
                stat2: spec.stat2,
                stat3: spec.stat3,
                image_uri: spec.image_uri.clone(),
                equipped_to: *equipped_to,
            };
            self.owners
                .entry(owner)
                .or_default()
                .add(id, part.part_type, part.is_equipped());
            self.parts.insert(id, part);
            tracing::debug!(part = %id, owner = %owner, part_type = %spec.part_type, "part minted");
            minted.push(id);
        }
        Ok(minted)
    }

    // ---- Equip state ----

    /// Flip a part's equipped state and move it between its owner's
    /// equipped/unequipped partitions.
    ///
    /// `Some(car)` requires the part to be unequipped; `None` requires it to
    /// be equipped. Ownership gating is the caller's job.
    pub fn set_equipped(&mut self, id: PartId, car: Option<CarId>) -> PartsResult<()> {
        let part = self.parts.get_mut(&id).ok_or(PartsError::PartNotFound(id))?;
        match (part.equipped_to, car) {
            (Some(_), Some(_)) => return Err(PartsError::AlreadyEquipped(id)),
            (None, None) => return Err(PartsError::NotEquipped(id)),
            _ => {}
        }
        part.equipped_to = car;
        let owner = part.owner;
        self.owners
            .entry(owner)
            .or_default()
            .mark_equipped(id, car.is_some());
        Ok(())
    }

    // ---- Ownership ----

    /// Move a part from `from` to `to`, re-parenting every index partition.
    ///
    /// The part keeps its equipped state: an equipped part lands in the new
    /// owner's equipped partition. Any per-token approval is cleared.
    pub fn transfer(&mut self, id: PartId, from: AccountId, to: AccountId) -> PartsResult<()> {
        let part = self.parts.get_mut(&id).ok_or(PartsError::PartNotFound(id))?;
        if part.owner != from {
            return Err(PartsError::NotOwner { part: id, account: from });
        }
        if from == to {
            return Ok(());
        }
        part.owner = to;
        let part_type = part.part_type;
        let equipped = part.is_equipped();

        if let Some(previous) = self.owners.get_mut(&from) {
            previous.remove(id, part_type);
            if previous.is_empty() {
                self.owners.remove(&from);
            }
        }
        self.owners.entry(to).or_default().add(id, part_type, equipped);
        self.approvals.clear(id);
        tracing::debug!(part = %id, from = %from, to = %to, "part transferred");
        Ok(())
    }

    /// Owner-initiated transfer of a loose part.
    ///
    /// `caller` must be authorized for the part, and the part must not be
    /// equipped: equipped parts only move together with their car.
    pub fn transfer_from(&mut self, caller: AccountId, id: PartId, to: AccountId) -> PartsResult<()> {
        let part = self.get(id)?;
        let owner = part.owner;
        if !self.approvals.is_authorized(&owner, id, &caller) {
            return Err(PartsError::NotOwner { part: id, account: caller });
        }
        if part.is_equipped() {
            return Err(PartsError::AlreadyEquipped(id));
        }
        self.transfer(id, owner, to)
    }

    /// Fail with `NotOwner` unless `account` owns the part.
    pub fn ensure_owner(&self, id: PartId, account: &AccountId) -> PartsResult<&Part> {
        let part = self.get(id)?;
        if &part.owner != account {
            return Err(PartsError::NotOwner { part: id, account: *account });
        }
        Ok(part)
    }

    // ---- Approvals ----

    /// Approve (or clear with `None`) a single account to move one part.
    pub fn approve(&mut self, caller: AccountId, id: PartId, account: Option<AccountId>) -> PartsResult<()> {
        let owner = self.get(id)?.owner;
        if caller != owner && !self.approvals.is_operator(&owner, &caller) {
            return Err(PartsError::NotOwner { part: id, account: caller });
        }
        self.approvals.approve(id, account);
        Ok(())
    }

    pub fn set_approval_for_all(&mut self, owner: AccountId, operator: AccountId, approved: bool) {
        self.approvals.set_operator(owner, operator, approved);
    }

    pub fn is_approved_for_all(&self, owner: &AccountId, operator: &AccountId) -> bool {
        self.approvals.is_operator(owner, operator)
    }

    pub fn approved(&self, id: PartId) -> Option<AccountId> {
        self.approvals.approved(id)
    }

    /// Whether `account` may move the part on its owner's behalf.
    pub fn is_authorized(&self, id: PartId, account: &AccountId) -> PartsResult<bool> {
        let owner = self.get(id)?.owner;
        Ok(self.approvals.is_authorized(&owner, id, account))
    }

    // ---- Queries ----

    pub fn get(&self, id: PartId) -> PartsResult<&Part> {
        self.parts.get(&id).ok_or(PartsError::PartNotFound(id))
    }

    pub fn owner_of(&self, id: PartId) -> PartsResult<AccountId> {
        Ok(self.get(id)?.owner)
    }

    pub fn part_type(&self, id: PartId) -> PartsResult<PartType> {
        Ok(self.get(id)?.part_type)
    }

    pub fn is_equipped(&self, id: PartId) -> PartsResult<bool> {
        Ok(self.get(id)?.is_equipped())
    }

    pub fn equipped_car(&self, id: PartId) -> PartsResult<Option<CarId>> {
        Ok(self.get(id)?.equipped_to)
    }

    pub fn last_part_id(&self) -> Option<PartId> {
        (self.last_id > 0).then_some(PartId(self.last_id))
    }

    /// The id the next minted part will receive.
    pub fn next_part_id(&self) -> PartsResult<PartId> {
        self.last_id
            .checked_add(1)
            .map(PartId)
            .ok_or(PartsError::IdExhausted)
    }

    pub fn total_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Part> {
        self.parts.values()
    }

    pub fn owners(&self) -> impl Iterator<Item = (&AccountId, &OwnerParts)> {
        self.owners.iter()
    }

    pub fn owner_index(&self, owner: &AccountId) -> Option<&OwnerParts> {
        self.owners.get(owner)
    }

    pub fn owner_parts(&self, owner: &AccountId) -> Vec<PartId> {
        self.owners
            .get(owner)
            .map(|o| o.all.to_vec())
            .unwrap_or_default()
    }

    pub fn owner_parts_by_type(&self, owner: &AccountId, part_type: PartType) -> Vec<PartId> {
        self.owners
            .get(owner)
            .map(|o| o.by_type[part_type.slot_index()].to_vec())
            .unwrap_or_default()
    }

    pub fn owner_equipped_parts(&self, owner: &AccountId) -> Vec<PartId> {
        self.owners
            .get(owner)
            .map(|o| o.equipped.to_vec())
            .unwrap_or_default()
    }

    pub fn owner_unequipped_parts(&self, owner: &AccountId) -> Vec<PartId> {
        self.owners
            .get(owner)
            .map(|o| o.unequipped.to_vec())
            .unwrap_or_default()
    }

    pub fn owner_parts_with_details(&self, owner: &AccountId) -> OwnerPartsDetails {
        let Some(index) = self.owners.get(owner) else {
            return OwnerPartsDetails::default();
        };
        let load = |ids: &[PartId]| -> Vec<Part> {
            ids.iter()
                .filter_map(|id| self.parts.get(id).cloned())
                .collect()
        };
        OwnerPartsDetails {
            all_parts: load(index.all.as_slice()),
            equipped_parts: load(index.equipped.as_slice()),
            unequipped_parts: load(index.unequipped.as_slice()),
        }
    }
}
