use rush_compose::CompositionEngine;
use rush_market::{Marketplace, PurchasePlan};
use rush_parts::PartRegistry;
use rush_types::{AccountId, Amount, CarId, MintCarRequest, PartId, PartSpec, SLOT_COUNT};
use rush_workshop::{Leaderboard, RepairReceipt, Workshop};
use serde::{Deserialize, Serialize};

use crate::bank::{Bank, Pot, Transfer};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::invariants::{self, InvariantReport};
use crate::journal::{Authority, Journal, LedgerEvent};

/// Every component of the ledger, as one serializable value.
///
/// Each mutating method follows the same shape: run every check that can
/// fail, prepare the bank movements and the journal entry, and only then
/// mutate. Component calls made in the mutation phase are themselves
/// all-or-nothing and have already been validated, so a failing method
/// leaves the state exactly as it found it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub(crate) operator: AccountId,
    pub(crate) mint_price: Amount,
    /// Prefix for token metadata URIs. Empty means each token's own image URI.
    #[serde(default)]
    pub(crate) base_uri: String,
    pub(crate) parts: PartRegistry,
    pub(crate) cars: CompositionEngine,
    pub(crate) market: Marketplace,
    pub(crate) workshop: Workshop,
    pub(crate) leaderboard: Leaderboard,
    pub(crate) bank: Bank,
    pub(crate) journal: Journal,
}

impl LedgerState {
    pub fn genesis(operator: AccountId, config: &LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            operator,
            mint_price: Amount::from(config.mint_price),
            base_uri: String::new(),
            parts: PartRegistry::new(config.max_stat),
            cars: CompositionEngine::new(config.max_condition),
            market: Marketplace::new(config.protocol_fee_bps)?,
            workshop: Workshop::new(Amount::from(config.repair_price), config.repair_amount),
            leaderboard: Leaderboard::default(),
            bank: Bank::default(),
            journal: Journal::default(),
        })
    }

    // ---- Read access ----

    pub fn operator(&self) -> AccountId {
        self.operator
    }

    pub fn mint_price(&self) -> Amount {
        self.mint_price
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Metadata URI of a car: `base_uri` followed by the numeric id, or the
    /// car's image URI while no base is set.
    pub fn car_token_uri(&self, car_id: CarId) -> LedgerResult<String> {
        let car = self.cars.get(car_id)?;
        Ok(if self.base_uri.is_empty() {
            car.image_uri.clone()
        } else {
            format!("{}{}", self.base_uri, car_id.get())
        })
    }

    pub fn part_token_uri(&self, part_id: PartId) -> LedgerResult<String> {
        let part = self.parts.get(part_id)?;
        Ok(if self.base_uri.is_empty() {
            part.image_uri.clone()
        } else {
            format!("{}{}", self.base_uri, part_id.get())
        })
    }

    pub fn parts(&self) -> &PartRegistry {
        &self.parts
    }

    pub fn cars(&self) -> &CompositionEngine {
        &self.cars
    }

    pub fn market(&self) -> &Marketplace {
        &self.market
    }

    pub fn workshop(&self) -> &Workshop {
        &self.workshop
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn check_invariants(&self) -> InvariantReport {
        invariants::check(&self.parts, &self.cars, &self.bank)
    }

    fn ensure_operator(&self, caller: AccountId) -> LedgerResult<()> {
        if caller != self.operator {
            return Err(LedgerError::Unauthorized(caller));
        }
        Ok(())
    }

    fn record(&mut self, event: LedgerEvent, apply: impl FnOnce(&mut Self) -> LedgerResult<()>) -> LedgerResult<()> {
        let entry = self.journal.prepare(event)?;
        apply(self)?;
        self.journal.commit(entry);
        Ok(())
    }

    // ---- Currency ----

    /// Credit native currency arriving from the host chain.
    pub fn deposit(&mut self, account: AccountId, amount: Amount) -> LedgerResult<Amount> {
        let entry = self.journal.prepare(LedgerEvent::Deposited { account, amount })?;
        let balance = self.bank.deposit(account, amount)?;
        self.journal.commit(entry);
        Ok(balance)
    }

    /// Move treasury funds to the operator's balance. `None` withdraws everything.
    pub fn withdraw(&mut self, caller: AccountId, amount: Option<Amount>) -> LedgerResult<Amount> {
        self.ensure_operator(caller)?;
        let amount = amount.unwrap_or(self.bank.treasury());
        let prepared = self
            .bank
            .prepare(&[Transfer::new(Pot::Treasury, Pot::Account(caller), amount)])?;
        let entry = self.journal.prepare(LedgerEvent::Withdrawn { to: caller, amount })?;
        self.bank.commit(prepared);
        self.journal.commit(entry);
        tracing::info!(to = %caller, amount, "treasury withdrawn");
        Ok(amount)
    }

    // ---- Minting ----

    /// Mint a car with three fresh parts, paying at least the mint price.
    ///
    /// The whole attached payment goes to the treasury.
    pub fn mint_car(&mut self, caller: AccountId, request: &MintCarRequest, payment: Amount) -> LedgerResult<CarId> {
        if payment < self.mint_price {
            return Err(LedgerError::InsufficientPayment {
                required: self.mint_price,
                attached: payment,
            });
        }
        self.cars.validate_mint(&self.parts, &request.parts)?;
        let prepared = self
            .bank
            .prepare(&[Transfer::new(Pot::Account(caller), Pot::Treasury, payment)])?;
        let car_id = self.cars.next_car_id()?;
        let entry = self.journal.prepare(LedgerEvent::CarMinted {
            car_id,
            owner: caller,
            paid: payment,
        })?;

        let minted = self
            .cars
            .mint_car(&mut self.parts, caller, request.image_uri.clone(), &request.parts)?;
        self.bank.commit(prepared);
        self.journal.commit(entry);
        Ok(minted)
    }

    /// Operator-only mint of a loose part for `owner`.
    pub fn mint_part(&mut self, caller: AccountId, owner: AccountId, spec: &PartSpec) -> LedgerResult<PartId> {
        self.ensure_operator(caller)?;
        self.parts.validate_spec(spec)?;
        let part_id = self.parts.next_part_id()?;
        let entry = self.journal.prepare(LedgerEvent::PartMinted {
            part_id,
            owner,
            part_type: spec.part_type,
        })?;
        let minted = self.parts.mint(owner, spec, None)?;
        self.journal.commit(entry);
        tracing::info!(part = %minted, owner = %owner, "part minted");
        Ok(minted)
    }

    // ---- Composition ----

    pub fn equip_part(&mut self, caller: AccountId, car_id: CarId, part_id: PartId, slot: usize) -> LedgerResult<()> {
        self.record(LedgerEvent::PartEquipped { car_id, part_id, slot }, |s| {
            Ok(s.cars.equip_part(&mut s.parts, caller, car_id, part_id, slot)?)
        })
    }

    pub fn unequip_part(&mut self, caller: AccountId, car_id: CarId, part_id: PartId) -> LedgerResult<()> {
        self.record(LedgerEvent::PartUnequipped { car_id, part_id }, |s| {
            Ok(s.cars.unequip_part(&mut s.parts, caller, car_id, part_id)?)
        })
    }

    pub fn replace_part(&mut self, caller: AccountId, car_id: CarId, old_part: PartId, new_part: PartId) -> LedgerResult<()> {
        self.record(LedgerEvent::PartReplaced { car_id, old_part, new_part }, |s| {
            Ok(s.cars.replace_part(&mut s.parts, caller, car_id, old_part, new_part)?)
        })
    }

    // ---- Ownership ----

    /// Transfer a loose part. Equipped parts only move with their car.
    pub fn transfer_part(&mut self, caller: AccountId, part_id: PartId, to: AccountId) -> LedgerResult<()> {
        let from = self.parts.owner_of(part_id)?;
        self.record(LedgerEvent::PartTransferred { part_id, from, to }, |s| {
            Ok(s.parts.transfer_from(caller, part_id, to)?)
        })
    }

    /// Transfer a car without its parts. Any active listing for it is cancelled.
    pub fn transfer_car(&mut self, caller: AccountId, car_id: CarId, to: AccountId) -> LedgerResult<()> {
        let from = self.cars.owner_of(car_id)?;
        self.record(LedgerEvent::CarTransferred { car_id, from, to }, |s| {
            s.cars.transfer_from(caller, car_id, to)?;
            s.market.invalidate(car_id);
            Ok(())
        })
    }

    pub fn approve_part(&mut self, caller: AccountId, part_id: PartId, approved: Option<AccountId>) -> LedgerResult<()> {
        self.record(LedgerEvent::PartApproved { part_id, approved }, |s| {
            Ok(s.parts.approve(caller, part_id, approved)?)
        })
    }

    pub fn approve_car(&mut self, caller: AccountId, car_id: CarId, approved: Option<AccountId>) -> LedgerResult<()> {
        self.record(LedgerEvent::CarApproved { car_id, approved }, |s| {
            Ok(s.cars.approve(caller, car_id, approved)?)
        })
    }

    /// Grant or revoke `operator` authority over all of the caller's cars and parts.
    pub fn set_approval_for_all(&mut self, caller: AccountId, operator: AccountId, approved: bool) -> LedgerResult<()> {
        self.record(
            LedgerEvent::OperatorApproval {
                owner: caller,
                operator,
                approved,
            },
            |s| {
                s.parts.set_approval_for_all(caller, operator, approved);
                s.cars.set_approval_for_all(caller, operator, approved);
                Ok(())
            },
        )
    }

    // ---- Marketplace ----

    pub fn list_car(
        &mut self,
        caller: AccountId,
        car_id: CarId,
        price: Amount,
        include_slots: [bool; SLOT_COUNT],
    ) -> LedgerResult<()> {
        let event = LedgerEvent::CarListed {
            car_id,
            seller: caller,
            price,
            include_slots,
        };
        self.record(event, |s| {
            Ok(s.market.list_car(&s.cars, &s.parts, caller, car_id, price, include_slots)?)
        })
    }

    pub fn cancel_listing(&mut self, caller: AccountId, car_id: CarId) -> LedgerResult<()> {
        self.record(LedgerEvent::ListingCancelled { car_id }, |s| {
            Ok(s.market.cancel_listing(caller, car_id)?)
        })
    }

    /// Buy a listed car and its bundled parts in one step.
    ///
    /// The buyer must be able to cover the attached payment; only the listing
    /// price is taken and the rest is refunded. The seller receives the price
    /// minus the protocol fee, which goes to the treasury.
    pub fn buy_car(&mut self, buyer: AccountId, car_id: CarId, payment: Amount) -> LedgerResult<PurchasePlan> {
        let plan = self
            .market
            .plan_purchase(&self.cars, &self.parts, buyer, car_id, payment)?;
        self.bank.ensure_funds(&buyer, payment)?;
        let prepared = self.bank.prepare(&[
            Transfer::new(Pot::Account(buyer), Pot::Account(plan.seller), plan.seller_proceeds),
            Transfer::new(Pot::Account(buyer), Pot::Treasury, plan.fee),
        ])?;
        let entry = self.journal.prepare(LedgerEvent::CarSold {
            car_id,
            seller: plan.seller,
            buyer,
            price: plan.price,
            fee: plan.fee,
            parts: plan.bundled.clone(),
        })?;

        self.market.settle(&mut self.cars, &mut self.parts, &plan)?;
        self.bank.commit(prepared);
        self.journal.commit(entry);
        Ok(plan)
    }

    // ---- Workshop & leaderboard ----

    /// Repair a car owned by the caller. The whole payment goes to the treasury.
    pub fn repair_car(&mut self, caller: AccountId, car_id: CarId, payment: Amount) -> LedgerResult<RepairReceipt> {
        self.workshop.check_repair(&self.cars, caller, car_id, payment)?;
        let prepared = self
            .bank
            .prepare(&[Transfer::new(Pot::Account(caller), Pot::Treasury, payment)])?;
        let entry = self.journal.prepare(LedgerEvent::CarRepaired { car_id, paid: payment })?;

        let receipt = self.workshop.repair_car(&mut self.cars, caller, car_id, payment)?;
        self.bank.commit(prepared);
        self.journal.commit(entry);
        Ok(receipt)
    }

    pub fn apply_wear(&mut self, caller: AccountId, car_id: CarId, amount: u8) -> LedgerResult<u8> {
        let operator = self.operator;
        let mut condition = 0;
        self.record(LedgerEvent::WearApplied { car_id, amount }, |s| {
            condition = s.workshop.apply_wear(&mut s.cars, caller, operator, car_id, amount)?;
            Ok(())
        })?;
        Ok(condition)
    }

    /// Record a race result. Returns `true` if it became the car's best score.
    pub fn record_race_result(&mut self, caller: AccountId, car_id: CarId, score: u64) -> LedgerResult<bool> {
        let operator = self.operator;
        let mut improved = false;
        self.record(LedgerEvent::RaceRecorded { car_id, score }, |s| {
            improved = s.leaderboard.record(&s.cars, caller, operator, car_id, score)?;
            Ok(())
        })?;
        Ok(improved)
    }

    // ---- Operator controls ----

    pub fn set_mint_price(&mut self, caller: AccountId, price: Amount) -> LedgerResult<()> {
        self.ensure_operator(caller)?;
        self.record(LedgerEvent::MintPriceSet { price }, |s| {
            s.mint_price = price;
            Ok(())
        })?;
        tracing::info!(price, "mint price set");
        Ok(())
    }

    pub fn set_repair_price(&mut self, caller: AccountId, price: Amount) -> LedgerResult<()> {
        self.ensure_operator(caller)?;
        self.record(LedgerEvent::RepairPriceSet { price }, |s| {
            s.workshop.set_repair_price(price);
            Ok(())
        })
    }

    pub fn set_protocol_fee(&mut self, caller: AccountId, bps: u16) -> LedgerResult<()> {
        self.ensure_operator(caller)?;
        self.record(LedgerEvent::ProtocolFeeSet { bps }, |s| Ok(s.market.set_fee_bps(bps)?))
    }

    /// Hand operator rights to `to`. The previous operator keeps no privileges.
    pub fn transfer_operator(&mut self, caller: AccountId, to: AccountId) -> LedgerResult<()> {
        self.ensure_operator(caller)?;
        self.record(LedgerEvent::OperatorTransferred { from: caller, to }, |s| {
            s.operator = to;
            Ok(())
        })?;
        tracing::info!(from = %caller, to = %to, "operator transferred");
        Ok(())
    }

    pub fn set_base_uri(&mut self, caller: AccountId, uri: String) -> LedgerResult<()> {
        self.ensure_operator(caller)?;
        self.record(LedgerEvent::BaseUriSet { uri: uri.clone() }, |s| {
            s.base_uri = uri;
            Ok(())
        })
    }

    /// Wire (or unwire with `None`) the account allowed to act for a satellite.
    pub fn set_authority(&mut self, caller: AccountId, role: Authority, account: Option<AccountId>) -> LedgerResult<()> {
        self.ensure_operator(caller)?;
        self.record(LedgerEvent::AuthoritySet { role, account }, |s| {
            match role {
                Authority::Workshop => s.workshop.set_authority(account),
                Authority::Leaderboard => s.leaderboard.set_authority(account),
            }
            Ok(())
        })
    }
}
