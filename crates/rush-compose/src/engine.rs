use std::collections::BTreeMap;

use rush_parts::{Approvals, Part, PartRegistry, TokenIndex};
use rush_types::{AccountId, CarId, PartId, PartSpec, PartType, SLOT_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::{ComposeError, ComposeResult};
use crate::stats::{CombinedStats, CompactCarStats};

/// Default (and maximum) condition of a freshly minted car.
pub const DEFAULT_MAX_CONDITION: u8 = 100;

/// A car token: an image plus a slot table indexed by [`PartType::slot_index`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    pub owner: AccountId,
    pub image_uri: String,
    pub condition: u8,
    pub slots: [Option<PartId>; SLOT_COUNT],
}

impl Car {
    /// The slot currently holding `part`, if any.
    pub fn slot_of(&self, part: PartId) -> Option<usize> {
        self.slots.iter().position(|slot| *slot == Some(part))
    }

    pub fn equipped_parts(&self) -> impl Iterator<Item = PartId> + '_ {
        self.slots.iter().flatten().copied()
    }
}

/// Read-only snapshot of a car's slot table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarComposition {
    pub part_ids: [Option<PartId>; SLOT_COUNT],
    pub image_uri: String,
    pub slot_occupied: [bool; SLOT_COUNT],
}

/// An equipped part together with the slot it occupies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPart {
    pub slot_index: usize,
    pub part: Part,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullCarMetadata {
    pub car_id: CarId,
    pub owner: AccountId,
    pub image_uri: String,
    pub parts: Vec<SlotPart>,
    pub total_stats: CompactCarStats,
}

/// Owns the car table and all slot transitions.
///
/// Every operation that changes a slot also flips the referenced part's
/// equipped state in the [`PartRegistry`] inside the same call, after all
/// preconditions have been checked. A failed call therefore leaves both
/// tables unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionEngine {
    cars: BTreeMap<CarId, Car>,
    owners: BTreeMap<AccountId, TokenIndex<CarId>>,
    approvals: Approvals<CarId>,
    last_id: u64,
    max_condition: u8,
}

impl Default for CompositionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONDITION)
    }
}

impl CompositionEngine {
    pub fn new(max_condition: u8) -> Self {
        Self {
            cars: BTreeMap::new(),
            owners: BTreeMap::new(),
            approvals: Approvals::default(),
            last_id: 0,
            max_condition,
        }
    }

    pub fn max_condition(&self) -> u8 {
        self.max_condition
    }

    // ---- Mint ----

    /// Order mint specs by slot, keyed by part type rather than position.
    ///
    /// Exactly one spec per part type is required.
    pub fn arrange_specs(specs: &[PartSpec]) -> ComposeResult<[PartSpec; SLOT_COUNT]> {
        if specs.len() != SLOT_COUNT {
            return Err(ComposeError::InvalidComposition(format!(
                "expected {SLOT_COUNT} parts, got {}",
                specs.len()
            )));
        }
        let mut arranged: [Option<PartSpec>; SLOT_COUNT] = Default::default();
        for spec in specs {
            let slot = &mut arranged[spec.part_type.slot_index()];
            if slot.is_some() {
                return Err(ComposeError::InvalidComposition(format!(
                    "duplicate {} part",
                    spec.part_type
                )));
            }
            *slot = Some(spec.clone());
        }
        let [engine, transmission, wheels] = arranged;
        match (engine, transmission, wheels) {
            (Some(e), Some(t), Some(w)) => Ok([e, t, w]),
            (e, t, _) => {
                let missing = if e.is_none() {
                    PartType::Engine
                } else if t.is_none() {
                    PartType::Transmission
                } else {
                    PartType::Wheels
                };
                Err(ComposeError::InvalidComposition(format!("missing {missing} part")))
            }
        }
    }

    /// Validate a car mint without mutating anything.
    pub fn validate_mint(&self, parts: &PartRegistry, specs: &[PartSpec]) -> ComposeResult<[PartSpec; SLOT_COUNT]> {
        let arranged = Self::arrange_specs(specs)?;
        for spec in &arranged {
            parts.validate_spec(spec)?;
        }
        self.next_car_id()?;
        Ok(arranged)
    }

    /// Mint a car with three freshly minted, pre-equipped parts.
    pub fn mint_car(
        &mut self,
        parts: &mut PartRegistry,
        owner: AccountId,
        image_uri: impl Into<String>,
        specs: &[PartSpec],
    ) -> ComposeResult<CarId> {
        let arranged = self.validate_mint(parts, specs)?;
        let car_id = self.next_car_id()?;

        let batch: Vec<(PartSpec, Option<CarId>)> = arranged
            .into_iter()
            .map(|spec| (spec, Some(car_id)))
            .collect();
        let part_ids = parts.mint_batch(owner, &batch)?;

        let mut slots = [None; SLOT_COUNT];
        for (slot, id) in slots.iter_mut().zip(part_ids) {
            *slot = Some(id);
        }

        self.last_id = car_id.0;
        self.cars.insert(
            car_id,
            Car {
                id: car_id,
                owner,
                image_uri: image_uri.into(),
                condition: self.max_condition,
                slots,
            },
        );
        self.owners.entry(owner).or_default().insert(car_id);
        tracing::info!(car = %car_id, owner = %owner, "car minted");
        Ok(car_id)
    }

    // ---- Slot transitions ----

    /// Equip an unequipped part into an empty slot of its own type.
    pub fn equip_part(
        &mut self,
        parts: &mut PartRegistry,
        caller: AccountId,
        car_id: CarId,
        part_id: PartId,
        slot: usize,
    ) -> ComposeResult<()> {
        let slot_type = PartType::from_slot(slot).map_err(|_| ComposeError::InvalidSlot(slot))?;
        let car = self.ensure_owner(car_id, &caller)?;
        let part = parts.ensure_owner(part_id, &caller)?;
        if part.is_equipped() {
            return Err(rush_parts::PartsError::AlreadyEquipped(part_id).into());
        }
        if part.part_type != slot_type {
            return Err(ComposeError::TypeMismatch {
                expected: slot_type,
                found: part.part_type,
            });
        }
        if car.slots[slot].is_some() {
            return Err(ComposeError::SlotOccupied { car: car_id, slot });
        }

        parts.set_equipped(part_id, Some(car_id))?;
        self.car_mut(car_id)?.slots[slot] = Some(part_id);
        tracing::info!(car = %car_id, part = %part_id, slot, "part equipped");
        Ok(())
    }

    /// Remove a part from the car, leaving its slot empty.
    pub fn unequip_part(
        &mut self,
        parts: &mut PartRegistry,
        caller: AccountId,
        car_id: CarId,
        part_id: PartId,
    ) -> ComposeResult<()> {
        let car = self.ensure_owner(car_id, &caller)?;
        let slot = car.slot_of(part_id).ok_or(ComposeError::NotEquipped {
            car: car_id,
            part: part_id,
        })?;
        self.release_slot(parts, car_id, slot)?;
        tracing::info!(car = %car_id, part = %part_id, slot, "part unequipped");
        Ok(())
    }

    /// Swap an equipped part for an unequipped one of the same type.
    ///
    /// Both flips and the slot write happen in one call after every check
    /// has passed, so the slot is never observed empty.
    pub fn replace_part(
        &mut self,
        parts: &mut PartRegistry,
        caller: AccountId,
        car_id: CarId,
        old_part: PartId,
        new_part: PartId,
    ) -> ComposeResult<()> {
        let car = self.ensure_owner(car_id, &caller)?;
        let slot = car.slot_of(old_part).ok_or(ComposeError::NotEquipped {
            car: car_id,
            part: old_part,
        })?;
        let old_type = parts.part_type(old_part)?;
        let incoming = parts.ensure_owner(new_part, &caller)?;
        if incoming.is_equipped() {
            return Err(rush_parts::PartsError::AlreadyEquipped(new_part).into());
        }
        if incoming.part_type != old_type {
            return Err(ComposeError::TypeMismatch {
                expected: old_type,
                found: incoming.part_type,
            });
        }

        parts.set_equipped(old_part, None)?;
        parts.set_equipped(new_part, Some(car_id))?;
        self.car_mut(car_id)?.slots[slot] = Some(new_part);
        tracing::info!(car = %car_id, old = %old_part, new = %new_part, slot, "part replaced");
        Ok(())
    }

    /// Empty a slot without an ownership check, returning the part it held.
    ///
    /// Used by settlement to hand back parts that were not sold with the car.
    pub fn release_slot(&mut self, parts: &mut PartRegistry, car_id: CarId, slot: usize) -> ComposeResult<Option<PartId>> {
        if slot >= SLOT_COUNT {
            return Err(ComposeError::InvalidSlot(slot));
        }
        let Some(part_id) = self.get(car_id)?.slots[slot] else {
            return Ok(None);
        };
        parts.set_equipped(part_id, None)?;
        self.car_mut(car_id)?.slots[slot] = None;
        Ok(Some(part_id))
    }

    // ---- Condition ----

    /// Lower the car's condition, saturating at zero. Returns the new value.
    pub fn apply_wear(&mut self, car_id: CarId, amount: u8) -> ComposeResult<u8> {
        let car = self.car_mut(car_id)?;
        car.condition = car.condition.saturating_sub(amount);
        Ok(car.condition)
    }

    /// Raise the car's condition, saturating at the maximum. Returns the new value.
    pub fn restore_condition(&mut self, car_id: CarId, amount: u8) -> ComposeResult<u8> {
        let max = self.max_condition;
        let car = self.car_mut(car_id)?;
        car.condition = car.condition.saturating_add(amount).min(max);
        Ok(car.condition)
    }

    // ---- Ownership ----

    /// Move a car between owners. Equipped parts are not touched.
    pub fn transfer(&mut self, car_id: CarId, from: AccountId, to: AccountId) -> ComposeResult<()> {
        let car = self.car_mut(car_id)?;
        if car.owner != from {
            return Err(ComposeError::NotOwner { car: car_id, account: from });
        }
        if from == to {
            return Ok(());
        }
        car.owner = to;
        if let Some(index) = self.owners.get_mut(&from) {
            index.remove(car_id);
            if index.is_empty() {
                self.owners.remove(&from);
            }
        }
        self.owners.entry(to).or_default().insert(car_id);
        self.approvals.clear(car_id);
        tracing::debug!(car = %car_id, from = %from, to = %to, "car transferred");
        Ok(())
    }

    /// Transfer initiated by the owner or an approved account.
    pub fn transfer_from(&mut self, caller: AccountId, car_id: CarId, to: AccountId) -> ComposeResult<()> {
        let owner = self.get(car_id)?.owner;
        if !self.approvals.is_authorized(&owner, car_id, &caller) {
            return Err(ComposeError::NotOwner { car: car_id, account: caller });
        }
        self.transfer(car_id, owner, to)
    }

    pub fn ensure_owner(&self, car_id: CarId, account: &AccountId) -> ComposeResult<&Car> {
        let car = self.get(car_id)?;
        if &car.owner != account {
            return Err(ComposeError::NotOwner { car: car_id, account: *account });
        }
        Ok(car)
    }

    pub fn approve(&mut self, caller: AccountId, car_id: CarId, account: Option<AccountId>) -> ComposeResult<()> {
        let owner = self.get(car_id)?.owner;
        if caller != owner && !self.approvals.is_operator(&owner, &caller) {
            return Err(ComposeError::NotOwner { car: car_id, account: caller });
        }
        self.approvals.approve(car_id, account);
        Ok(())
    }

    pub fn set_approval_for_all(&mut self, owner: AccountId, operator: AccountId, approved: bool) {
        self.approvals.set_operator(owner, operator, approved);
    }

    pub fn is_authorized(&self, car_id: CarId, account: &AccountId) -> ComposeResult<bool> {
        let owner = self.get(car_id)?.owner;
        Ok(self.approvals.is_authorized(&owner, car_id, account))
    }

    pub fn approved(&self, car_id: CarId) -> Option<AccountId> {
        self.approvals.approved(car_id)
    }

    // ---- Queries ----

    pub fn get(&self, car_id: CarId) -> ComposeResult<&Car> {
        self.cars.get(&car_id).ok_or(ComposeError::CarNotFound(car_id))
    }

    fn car_mut(&mut self, car_id: CarId) -> ComposeResult<&mut Car> {
        self.cars.get_mut(&car_id).ok_or(ComposeError::CarNotFound(car_id))
    }

    pub fn owner_of(&self, car_id: CarId) -> ComposeResult<AccountId> {
        Ok(self.get(car_id)?.owner)
    }

    pub fn composition(&self, car_id: CarId) -> ComposeResult<CarComposition> {
        let car = self.get(car_id)?;
        Ok(CarComposition {
            part_ids: car.slots,
            image_uri: car.image_uri.clone(),
            slot_occupied: car.slots.map(|slot| slot.is_some()),
        })
    }

    /// Recompute the car's stats from its current slot contents.
    pub fn compact_stats(&self, parts: &PartRegistry, car_id: CarId) -> ComposeResult<CompactCarStats> {
        let car = self.get(car_id)?;
        let equipped = self.slot_parts(parts, car)?;
        let refs = equipped.each_ref().map(Option::as_ref);
        Ok(CompactCarStats {
            image_uri: car.image_uri.clone(),
            stats: CombinedStats::compute(refs, car.condition, self.max_condition),
            condition: car.condition,
        })
    }

    pub fn full_metadata(&self, parts: &PartRegistry, car_id: CarId) -> ComposeResult<FullCarMetadata> {
        let car = self.get(car_id)?;
        let equipped = self.slot_parts(parts, car)?;
        let total_stats = self.compact_stats(parts, car_id)?;
        let slot_parts = equipped
            .into_iter()
            .enumerate()
            .filter_map(|(slot_index, part)| part.map(|part| SlotPart { slot_index, part }))
            .collect();
        Ok(FullCarMetadata {
            car_id,
            owner: car.owner,
            image_uri: car.image_uri.clone(),
            parts: slot_parts,
            total_stats,
        })
    }

    pub fn all_metadata(&self, parts: &PartRegistry, owner: &AccountId) -> ComposeResult<Vec<FullCarMetadata>> {
        self.owner_cars(owner)
            .into_iter()
            .map(|car_id| self.full_metadata(parts, car_id))
            .collect()
    }

    pub fn owner_cars(&self, owner: &AccountId) -> Vec<CarId> {
        let mut cars = self
            .owners
            .get(owner)
            .map(TokenIndex::to_vec)
            .unwrap_or_default();
        cars.sort();
        cars
    }

    pub fn last_car_id(&self) -> Option<CarId> {
        (self.last_id > 0).then_some(CarId(self.last_id))
    }

    /// The id the next successful mint will receive.
    pub fn next_car_id(&self) -> ComposeResult<CarId> {
        self.last_id
            .checked_add(1)
            .map(CarId)
            .ok_or(ComposeError::IdExhausted)
    }

    pub fn owners(&self) -> impl Iterator<Item = (&AccountId, &TokenIndex<CarId>)> {
        self.owners.iter()
    }

    pub fn total_cars(&self) -> usize {
        self.cars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Car> {
        self.cars.values()
    }

    fn slot_parts(&self, parts: &PartRegistry, car: &Car) -> ComposeResult<[Option<Part>; SLOT_COUNT]> {
        let mut out: [Option<Part>; SLOT_COUNT] = Default::default();
        for (slot, id) in car.slots.iter().enumerate() {
            if let Some(id) = id {
                out[slot] = Some(parts.get(*id)?.clone());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rush_parts::PartsError;

    fn alice() -> AccountId {
        AccountId::from_label("alice")
    }

    fn bob() -> AccountId {
        AccountId::from_label("bob")
    }

    fn specs() -> Vec<PartSpec> {
        vec![
            PartSpec::new(PartType::Engine, [8, 9, 7], "ipfs://engine"),
            PartSpec::new(PartType::Transmission, [7, 8, 8], "ipfs://transmission"),
            PartSpec::new(PartType::Wheels, [8, 7, 8], "ipfs://wheels"),
        ]
    }

    fn setup() -> (CompositionEngine, PartRegistry, CarId) {
        let mut engine = CompositionEngine::default();
        let mut parts = PartRegistry::default();
        let car = engine.mint_car(&mut parts, alice(), "ipfs://car", &specs()).unwrap();
        (engine, parts, car)
    }

    #[test]
    fn mint_car_equips_three_parts() {
        let (engine, parts, car) = setup();
        let composition = engine.composition(car).unwrap();
        assert_eq!(composition.slot_occupied, [true; 3]);
        for (slot, id) in composition.part_ids.iter().enumerate() {
            let part = parts.get(id.unwrap()).unwrap();
            assert_eq!(part.part_type.slot_index(), slot);
            assert_eq!(part.equipped_to, Some(car));
        }
        assert_eq!(engine.owner_cars(&alice()), vec![car]);
        assert_eq!(engine.get(car).unwrap().condition, DEFAULT_MAX_CONDITION);
    }

    #[test]
    fn mint_slots_by_type_not_position() {
        let mut engine = CompositionEngine::default();
        let mut parts = PartRegistry::default();
        let mut shuffled = specs();
        shuffled.reverse();
        let car = engine.mint_car(&mut parts, alice(), "ipfs://car", &shuffled).unwrap();

        let engine_part = engine.get(car).unwrap().slots[0].unwrap();
        assert_eq!(parts.part_type(engine_part).unwrap(), PartType::Engine);
    }

    #[test]
    fn mint_rejects_missing_and_duplicate_types() {
        let mut engine = CompositionEngine::default();
        let mut parts = PartRegistry::default();

        let mut duplicated = specs();
        duplicated[2] = PartSpec::new(PartType::Engine, [1, 1, 1], "ipfs://engine2");
        let err = engine.mint_car(&mut parts, alice(), "car", &duplicated).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidComposition(msg) if msg.contains("duplicate Engine")));

        let err = engine.mint_car(&mut parts, alice(), "car", &specs()[..2]).unwrap_err();
        assert!(matches!(err, ComposeError::InvalidComposition(_)));

        assert_eq!(engine.total_cars(), 0);
        assert_eq!(parts.total_parts(), 0);
    }

    #[test]
    fn mint_rejects_out_of_range_stats_without_side_effects() {
        let mut engine = CompositionEngine::default();
        let mut parts = PartRegistry::default();
        let mut bad = specs();
        bad[1].stat3 = 42;
        let err = engine.mint_car(&mut parts, alice(), "car", &bad).unwrap_err();
        assert_eq!(err, ComposeError::Parts(PartsError::InvalidStat { value: 42, max: 10 }));
        assert_eq!(parts.total_parts(), 0);
        assert_eq!(engine.last_car_id(), None);
    }

    #[test]
    fn unequip_then_equip_restores_stats() {
        let (mut engine, mut parts, car) = setup();
        let before = engine.compact_stats(&parts, car).unwrap();
        assert_eq!(before.stats.speed, 15);

        let engine_part = engine.get(car).unwrap().slots[0].unwrap();
        engine.unequip_part(&mut parts, alice(), car, engine_part).unwrap();
        let stripped = engine.compact_stats(&parts, car).unwrap();
        assert_eq!(stripped.stats.speed, 7);
        assert_eq!(stripped.stats.max_speed, 8);
        assert!(!parts.is_equipped(engine_part).unwrap());

        engine.equip_part(&mut parts, alice(), car, engine_part, 0).unwrap();
        assert_eq!(engine.compact_stats(&parts, car).unwrap(), before);
    }

    #[test]
    fn equip_checks_type_slot_and_ownership() {
        let (mut engine, mut parts, car) = setup();
        let spare_wheels = parts
            .mint(alice(), &PartSpec::new(PartType::Wheels, [1, 1, 1], "w"), None)
            .unwrap();
        let bobs_engine = parts
            .mint(bob(), &PartSpec::new(PartType::Engine, [1, 1, 1], "e"), None)
            .unwrap();

        let err = engine.equip_part(&mut parts, alice(), car, spare_wheels, 0).unwrap_err();
        assert_eq!(
            err,
            ComposeError::TypeMismatch {
                expected: PartType::Engine,
                found: PartType::Wheels
            }
        );

        let err = engine.equip_part(&mut parts, alice(), car, spare_wheels, 2).unwrap_err();
        assert_eq!(err, ComposeError::SlotOccupied { car, slot: 2 });

        let err = engine.equip_part(&mut parts, alice(), car, bobs_engine, 0).unwrap_err();
        assert!(matches!(err, ComposeError::Parts(PartsError::NotOwner { .. })));

        let err = engine.equip_part(&mut parts, bob(), car, bobs_engine, 0).unwrap_err();
        assert!(matches!(err, ComposeError::NotOwner { .. }));

        let err = engine.equip_part(&mut parts, alice(), car, spare_wheels, 3).unwrap_err();
        assert_eq!(err, ComposeError::InvalidSlot(3));
        assert!(!parts.is_equipped(spare_wheels).unwrap());
    }

    #[test]
    fn unequip_requires_part_on_this_car() {
        let (mut engine, mut parts, car) = setup();
        let loose = parts
            .mint(alice(), &PartSpec::new(PartType::Engine, [1, 1, 1], "e"), None)
            .unwrap();
        let err = engine.unequip_part(&mut parts, alice(), car, loose).unwrap_err();
        assert_eq!(err, ComposeError::NotEquipped { car, part: loose });
    }

    #[test]
    fn replace_swaps_in_one_transition() {
        let (mut engine, mut parts, car) = setup();
        let old = engine.get(car).unwrap().slots[1].unwrap();
        let new = parts
            .mint(alice(), &PartSpec::new(PartType::Transmission, [10, 10, 10], "t2"), None)
            .unwrap();

        engine.replace_part(&mut parts, alice(), car, old, new).unwrap();

        assert_eq!(engine.get(car).unwrap().slots[1], Some(new));
        assert!(!parts.is_equipped(old).unwrap());
        assert_eq!(parts.equipped_car(new).unwrap(), Some(car));
        assert_eq!(parts.owner_unequipped_parts(&alice()), vec![old]);
    }

    #[test]
    fn replace_rejects_type_mismatch_and_equipped_replacement() {
        let (mut engine, mut parts, car) = setup();
        let other_car = engine.mint_car(&mut parts, alice(), "car2", &specs()).unwrap();
        let old = engine.get(car).unwrap().slots[0].unwrap();
        let wheels = parts
            .mint(alice(), &PartSpec::new(PartType::Wheels, [1, 1, 1], "w"), None)
            .unwrap();
        let bolted_engine = engine.get(other_car).unwrap().slots[0].unwrap();

        let err = engine.replace_part(&mut parts, alice(), car, old, wheels).unwrap_err();
        assert!(matches!(err, ComposeError::TypeMismatch { .. }));

        let err = engine.replace_part(&mut parts, alice(), car, old, bolted_engine).unwrap_err();
        assert_eq!(err, ComposeError::Parts(PartsError::AlreadyEquipped(bolted_engine)));
        assert_eq!(engine.get(car).unwrap().slots[0], Some(old));
    }

    #[test]
    fn condition_saturates_both_ways() {
        let (mut engine, _, car) = setup();
        assert_eq!(engine.apply_wear(car, 30).unwrap(), 70);
        assert_eq!(engine.apply_wear(car, 200).unwrap(), 0);
        assert_eq!(engine.restore_condition(car, 60).unwrap(), 60);
        assert_eq!(engine.restore_condition(car, 250).unwrap(), 100);
    }

    #[test]
    fn transfer_moves_car_but_not_parts() {
        let (mut engine, parts, car) = setup();
        engine.transfer_from(alice(), car, bob()).unwrap();
        assert_eq!(engine.owner_of(car).unwrap(), bob());
        assert_eq!(engine.owner_cars(&bob()), vec![car]);
        assert!(engine.owner_cars(&alice()).is_empty());
        let engine_part = engine.get(car).unwrap().slots[0].unwrap();
        assert_eq!(parts.owner_of(engine_part).unwrap(), alice());

        let err = engine.transfer_from(alice(), car, alice()).unwrap_err();
        assert!(matches!(err, ComposeError::NotOwner { .. }));
    }

    #[test]
    fn full_metadata_lists_equipped_parts_by_slot() {
        let (mut engine, mut parts, car) = setup();
        let wheels = engine.get(car).unwrap().slots[2].unwrap();
        engine.unequip_part(&mut parts, alice(), car, wheels).unwrap();

        let metadata = engine.full_metadata(&parts, car).unwrap();
        let slots: Vec<usize> = metadata.parts.iter().map(|p| p.slot_index).collect();
        assert_eq!(slots, vec![0, 1]);
        assert_eq!(metadata.total_stats.stats.handling, 0);
        assert_eq!(engine.all_metadata(&parts, &alice()).unwrap().len(), 1);
    }
}
