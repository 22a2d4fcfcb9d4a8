use std::collections::{BTreeMap, BTreeSet};

use rush_compose::CompositionEngine;
use rush_parts::PartRegistry;
use rush_types::{CarId, PartId, PartType};
use serde::Serialize;

use crate::bank::Bank;

/// Cross-component consistency problems found by [`check`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvariantReport {
    pub parts_checked: usize,
    pub cars_checked: usize,
    pub violations: Vec<InvariantViolation>,
}

impl InvariantReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InvariantViolation {
    pub kind: InvariantKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum InvariantKind {
    /// A part sits in more than one slot, or in a slot of the wrong type.
    SlotExclusivity,
    /// A part's equipped flag disagrees with the slot tables.
    EquipFlag,
    /// A per-owner part partition disagrees with the part table.
    PartIndex,
    /// A per-owner car index disagrees with the car table.
    CarIndex,
    /// Balances and treasury no longer sum to the issued total.
    Conservation,
}

struct Checker {
    violations: Vec<InvariantViolation>,
}

impl Checker {
    fn fail(&mut self, kind: InvariantKind, description: String) {
        self.violations.push(InvariantViolation { kind, description });
    }
}

/// Re-derive every cross-component invariant from the authoritative tables.
pub fn check(parts: &PartRegistry, cars: &CompositionEngine, bank: &Bank) -> InvariantReport {
    let mut checker = Checker {
        violations: Vec::new(),
    };
    check_slots(&mut checker, parts, cars);
    check_part_index(&mut checker, parts);
    check_car_index(&mut checker, cars);
    check_conservation(&mut checker, bank);
    InvariantReport {
        parts_checked: parts.total_parts(),
        cars_checked: cars.total_cars(),
        violations: checker.violations,
    }
}

fn check_slots(checker: &mut Checker, parts: &PartRegistry, cars: &CompositionEngine) {
    let mut slotted: BTreeMap<PartId, CarId> = BTreeMap::new();

    for car in cars.iter() {
        for (slot, part_id) in car.slots.iter().enumerate() {
            let Some(part_id) = *part_id else { continue };
            if let Some(other) = slotted.insert(part_id, car.id) {
                checker.fail(
                    InvariantKind::SlotExclusivity,
                    format!("{part_id} is slotted in both {other} and {}", car.id),
                );
            }
            match parts.get(part_id) {
                Ok(part) => {
                    if part.part_type.slot_index() != slot {
                        checker.fail(
                            InvariantKind::SlotExclusivity,
                            format!("{part_id} ({}) sits in slot {slot} of {}", part.part_type, car.id),
                        );
                    }
                    if part.equipped_to != Some(car.id) {
                        checker.fail(
                            InvariantKind::EquipFlag,
                            format!("{part_id} is slotted in {} but equipped_to is {:?}", car.id, part.equipped_to),
                        );
                    }
                }
                Err(_) => checker.fail(
                    InvariantKind::SlotExclusivity,
                    format!("{} references missing {part_id}", car.id),
                ),
            }
        }
    }

    for part in parts.iter() {
        if part.is_equipped() && !slotted.contains_key(&part.id) {
            checker.fail(
                InvariantKind::EquipFlag,
                format!("{} is marked equipped but no slot holds it", part.id),
            );
        }
    }
}

fn check_part_index(checker: &mut Checker, parts: &PartRegistry) {
    for part in parts.iter() {
        let indexed = parts
            .owner_index(&part.owner)
            .is_some_and(|index| index.all.contains(part.id));
        if !indexed {
            checker.fail(
                InvariantKind::PartIndex,
                format!("{} is missing from its owner's index", part.id),
            );
        }
    }

    for (owner, index) in parts.owners() {
        if index.is_empty() {
            checker.fail(InvariantKind::PartIndex, format!("{owner} has an empty index entry"));
        }

        let all: BTreeSet<PartId> = index.all.iter().copied().collect();
        let equipped: BTreeSet<PartId> = index.equipped.iter().copied().collect();
        let unequipped: BTreeSet<PartId> = index.unequipped.iter().copied().collect();
        if !equipped.is_disjoint(&unequipped) {
            checker.fail(
                InvariantKind::PartIndex,
                format!("{owner} has parts in both equipped and unequipped partitions"),
            );
        }
        let union: BTreeSet<PartId> = equipped.union(&unequipped).copied().collect();
        if union != all {
            checker.fail(
                InvariantKind::PartIndex,
                format!("{owner}: equipped and unequipped do not partition all parts"),
            );
        }

        let mut by_type_total = 0;
        for part_type in PartType::ALL {
            let typed = &index.by_type[part_type.slot_index()];
            by_type_total += typed.len();
            for id in typed.iter() {
                if parts.part_type(*id).ok() != Some(part_type) {
                    checker.fail(
                        InvariantKind::PartIndex,
                        format!("{owner}: {id} is listed under {part_type}"),
                    );
                }
            }
        }
        if by_type_total != all.len() {
            checker.fail(
                InvariantKind::PartIndex,
                format!("{owner}: type partitions hold {by_type_total} parts, expected {}", all.len()),
            );
        }

        for id in &all {
            match parts.get(*id) {
                Ok(part) if part.owner != *owner => checker.fail(
                    InvariantKind::PartIndex,
                    format!("{id} is indexed under {owner} but owned by {}", part.owner),
                ),
                Ok(part) if part.is_equipped() != equipped.contains(id) => checker.fail(
                    InvariantKind::PartIndex,
                    format!("{id} is in the wrong equip partition of {owner}"),
                ),
                Ok(_) => {}
                Err(_) => checker.fail(
                    InvariantKind::PartIndex,
                    format!("{owner} indexes missing {id}"),
                ),
            }
        }
    }
}

fn check_car_index(checker: &mut Checker, cars: &CompositionEngine) {
    for car in cars.iter() {
        let indexed = cars.owners().any(|(owner, index)| *owner == car.owner && index.contains(car.id));
        if !indexed {
            checker.fail(
                InvariantKind::CarIndex,
                format!("{} is missing from its owner's index", car.id),
            );
        }
    }
    for (owner, index) in cars.owners() {
        for car_id in index.iter() {
            if cars.owner_of(*car_id).ok() != Some(*owner) {
                checker.fail(
                    InvariantKind::CarIndex,
                    format!("{car_id} is indexed under {owner} but not owned by it"),
                );
            }
        }
    }
}

fn check_conservation(checker: &mut Checker, bank: &Bank) {
    match bank.circulating() {
        Some(total) if total == bank.total_issued() => {}
        Some(total) => checker.fail(
            InvariantKind::Conservation,
            format!("balances sum to {total}, issued {}", bank.total_issued()),
        ),
        None => checker.fail(InvariantKind::Conservation, "balance sum overflows".into()),
    }
}
