use std::collections::BTreeMap;

use rush_compose::CompositionEngine;
use rush_parts::PartRegistry;
use rush_types::{AccountId, Amount, CarId, PartId, SLOT_COUNT};
use serde::{Deserialize, Serialize};

use crate::error::{Asset, MarketError, MarketResult};
use crate::listing::{Listing, ListingState};

/// Upper bound for the protocol fee, in basis points (100%).
pub const MAX_FEE_BPS: u16 = 10_000;

/// Whether the marketplace currently holds transfer authority over a listing's assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStatus {
    pub car_approved: bool,
    /// One entry per slot: `None` for slots not selected, otherwise whether
    /// the part in that slot is approved. A selected empty slot reports `false`.
    pub parts_approved: [Option<bool>; SLOT_COUNT],
    pub all_approved: bool,
}

/// A fully validated purchase, ready to be applied.
///
/// Produced by [`Marketplace::plan_purchase`] under the same lock that later
/// applies it, so nothing it checked can change in between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasePlan {
    pub car_id: CarId,
    pub seller: AccountId,
    pub buyer: AccountId,
    pub price: Amount,
    pub fee: Amount,
    pub seller_proceeds: Amount,
    pub refund: Amount,
    pub bundled: Vec<PartId>,
    /// Slots holding parts that stay behind and are unequipped at settlement.
    pub released: Vec<usize>,
}

/// Listing book plus the marketplace's own transfer identity and fee rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marketplace {
    account: AccountId,
    fee_bps: u16,
    listings: BTreeMap<CarId, Listing>,
}

impl Default for Marketplace {
    fn default() -> Self {
        Self {
            account: AccountId::service("marketplace"),
            fee_bps: 0,
            listings: BTreeMap::new(),
        }
    }
}

impl Marketplace {
    pub fn new(fee_bps: u16) -> MarketResult<Self> {
        let mut market = Self::default();
        market.set_fee_bps(fee_bps)?;
        Ok(market)
    }

    /// The account sellers must approve before a purchase can settle.
    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps
    }

    pub fn set_fee_bps(&mut self, fee_bps: u16) -> MarketResult<()> {
        if fee_bps > MAX_FEE_BPS {
            return Err(MarketError::InvalidFeeBps(fee_bps));
        }
        self.fee_bps = fee_bps;
        Ok(())
    }

    /// Protocol fee taken from `price`, rounded down.
    pub fn fee_for(&self, price: Amount) -> MarketResult<Amount> {
        price
            .checked_mul(Amount::from(self.fee_bps))
            .map(|scaled| scaled / Amount::from(MAX_FEE_BPS))
            .ok_or(MarketError::ArithmeticOverflow)
    }

    // ---- Listing lifecycle ----

    /// List a car for sale, bundling the equipped parts in the selected slots.
    ///
    /// A car with an active listing cannot be listed again until that listing
    /// is settled or cancelled.
    pub fn list_car(
        &mut self,
        engine: &CompositionEngine,
        parts: &PartRegistry,
        caller: AccountId,
        car_id: CarId,
        price: Amount,
        include_slots: [bool; SLOT_COUNT],
    ) -> MarketResult<()> {
        if price == 0 {
            return Err(MarketError::InvalidPrice);
        }
        let car = engine.get(car_id)?;
        if car.owner != caller {
            return Err(MarketError::NotOwner {
                asset: Asset::Car(car_id),
                account: caller,
            });
        }
        if self.listing(car_id).is_some_and(Listing::is_active) {
            return Err(MarketError::AlreadyListed(car_id));
        }

        let mut part_ids = [None; SLOT_COUNT];
        for (slot, included) in include_slots.iter().enumerate() {
            if !included {
                continue;
            }
            let part_id = car.slots[slot].ok_or(MarketError::NotEquipped { car: car_id, slot })?;
            if parts.owner_of(part_id)? != caller {
                return Err(MarketError::NotOwner {
                    asset: Asset::Part(part_id),
                    account: caller,
                });
            }
            part_ids[slot] = Some(part_id);
        }

        self.listings.insert(
            car_id,
            Listing {
                car_id,
                seller: caller,
                price,
                include_slots,
                part_ids,
                state: ListingState::Active,
            },
        );
        tracing::info!(car = %car_id, seller = %caller, price, ?include_slots, "car listed");
        Ok(())
    }

    /// Withdraw an active listing. Only the seller may cancel.
    pub fn cancel_listing(&mut self, caller: AccountId, car_id: CarId) -> MarketResult<()> {
        let listing = self
            .listings
            .get_mut(&car_id)
            .ok_or(MarketError::ListingNotFound(car_id))?;
        if !listing.is_active() {
            return Err(MarketError::ListingInactive(car_id));
        }
        if listing.seller != caller {
            return Err(MarketError::NotOwner {
                asset: Asset::Car(car_id),
                account: caller,
            });
        }
        listing.state = ListingState::Cancelled;
        tracing::info!(car = %car_id, "listing cancelled");
        Ok(())
    }

    /// Cancel any active listing for a car that changed hands outside the market.
    pub fn invalidate(&mut self, car_id: CarId) -> bool {
        match self.listings.get_mut(&car_id) {
            Some(listing) if listing.is_active() => {
                listing.state = ListingState::Cancelled;
                tracing::debug!(car = %car_id, "stale listing cancelled");
                true
            }
            _ => false,
        }
    }

    pub fn listing(&self, car_id: CarId) -> Option<&Listing> {
        self.listings.get(&car_id)
    }

    pub fn active_listings(&self) -> Vec<&Listing> {
        self.listings.values().filter(|l| l.is_active()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listing> {
        self.listings.values()
    }

    // ---- Approvals ----

    /// Report which of the car and selected parts the marketplace may move.
    pub fn approval_status(
        &self,
        engine: &CompositionEngine,
        parts: &PartRegistry,
        car_id: CarId,
        include_slots: [bool; SLOT_COUNT],
    ) -> MarketResult<ApprovalStatus> {
        let car = engine.get(car_id)?;
        let car_approved = engine.is_authorized(car_id, &self.account)?;

        let mut parts_approved = [None; SLOT_COUNT];
        for (slot, included) in include_slots.iter().enumerate() {
            if !included {
                continue;
            }
            let approved = match car.slots[slot] {
                Some(part_id) => parts.is_authorized(part_id, &self.account)?,
                None => false,
            };
            parts_approved[slot] = Some(approved);
        }

        let all_approved = car_approved && parts_approved.iter().flatten().all(|ok| *ok);
        Ok(ApprovalStatus {
            car_approved,
            parts_approved,
            all_approved,
        })
    }

    // ---- Purchase ----

    /// Check every precondition of buying `car_id` against current state.
    ///
    /// Nothing recorded at listing time is trusted except the price and the
    /// bundled part ids: ownership, slot contents, and approvals are read
    /// fresh.
    pub fn plan_purchase(
        &self,
        engine: &CompositionEngine,
        parts: &PartRegistry,
        buyer: AccountId,
        car_id: CarId,
        payment: Amount,
    ) -> MarketResult<PurchasePlan> {
        let listing = self
            .listing(car_id)
            .ok_or(MarketError::ListingNotFound(car_id))?;
        if !listing.is_active() {
            return Err(MarketError::ListingInactive(car_id));
        }
        if payment < listing.price {
            return Err(MarketError::InsufficientPayment {
                required: listing.price,
                attached: payment,
            });
        }

        let seller = listing.seller;
        let car = engine.get(car_id)?;
        if car.owner != seller {
            return Err(MarketError::NotOwner {
                asset: Asset::Car(car_id),
                account: seller,
            });
        }
        if !engine.is_authorized(car_id, &self.account)? {
            return Err(MarketError::TransferNotApproved(Asset::Car(car_id)));
        }

        let mut bundled = Vec::new();
        for (slot, part_id) in listing.bundled() {
            match car.slots[slot] {
                None => return Err(MarketError::NotEquipped { car: car_id, slot }),
                Some(current) if current != part_id => {
                    return Err(MarketError::BundleChanged { car: car_id, slot })
                }
                Some(_) => {}
            }
            if parts.owner_of(part_id)? != seller {
                return Err(MarketError::NotOwner {
                    asset: Asset::Part(part_id),
                    account: seller,
                });
            }
            if !parts.is_authorized(part_id, &self.account)? {
                return Err(MarketError::TransferNotApproved(Asset::Part(part_id)));
            }
            bundled.push(part_id);
        }

        let released = (0..SLOT_COUNT)
            .filter(|slot| !listing.include_slots[*slot] && car.slots[*slot].is_some())
            .collect();

        let fee = self.fee_for(listing.price)?;
        Ok(PurchasePlan {
            car_id,
            seller,
            buyer,
            price: listing.price,
            fee,
            seller_proceeds: listing.price - fee,
            refund: payment - listing.price,
            bundled,
            released,
        })
    }

    /// Apply a plan produced by [`plan_purchase`](Self::plan_purchase) against
    /// unchanged state: release unbundled parts, move bundled parts and the
    /// car to the buyer, and mark the listing settled. Payment is the
    /// caller's concern.
    pub fn settle(
        &mut self,
        engine: &mut CompositionEngine,
        parts: &mut PartRegistry,
        plan: &PurchasePlan,
    ) -> MarketResult<()> {
        for slot in &plan.released {
            engine.release_slot(parts, plan.car_id, *slot)?;
        }
        for part_id in &plan.bundled {
            parts.transfer(*part_id, plan.seller, plan.buyer)?;
        }
        engine.transfer(plan.car_id, plan.seller, plan.buyer)?;

        if let Some(listing) = self.listings.get_mut(&plan.car_id) {
            listing.state = ListingState::Settled { buyer: plan.buyer };
        }
        tracing::info!(
            car = %plan.car_id,
            seller = %plan.seller,
            buyer = %plan.buyer,
            price = plan.price,
            fee = plan.fee,
            bundled = plan.bundled.len(),
            "car sold"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rush_types::{PartSpec, PartType};

    struct World {
        engine: CompositionEngine,
        parts: PartRegistry,
        market: Marketplace,
        car: CarId,
    }

    fn alice() -> AccountId {
        AccountId::from_label("alice")
    }

    fn bob() -> AccountId {
        AccountId::from_label("bob")
    }

    fn world() -> World {
        let mut engine = CompositionEngine::default();
        let mut parts = PartRegistry::default();
        let specs = [
            PartSpec::new(PartType::Engine, [8, 9, 7], "e"),
            PartSpec::new(PartType::Transmission, [7, 8, 8], "t"),
            PartSpec::new(PartType::Wheels, [8, 7, 8], "w"),
        ];
        let car = engine.mint_car(&mut parts, alice(), "car", &specs).unwrap();
        World {
            engine,
            parts,
            market: Marketplace::default(),
            car,
        }
    }

    fn approve_all(w: &mut World) {
        let market = w.market.account();
        w.engine.set_approval_for_all(alice(), market, true);
        w.parts.set_approval_for_all(alice(), market, true);
    }

    fn slot(w: &World, slot: usize) -> PartId {
        w.engine.get(w.car).unwrap().slots[slot].unwrap()
    }

    #[test]
    fn relisting_an_active_car_is_rejected() {
        let mut w = world();
        w.market
            .list_car(&w.engine, &w.parts, alice(), w.car, 500, [true; 3])
            .unwrap();
        let err = w
            .market
            .list_car(&w.engine, &w.parts, alice(), w.car, 900, [false; 3])
            .unwrap_err();
        assert_eq!(err, MarketError::AlreadyListed(w.car));

        w.market.cancel_listing(alice(), w.car).unwrap();
        w.market
            .list_car(&w.engine, &w.parts, alice(), w.car, 900, [false; 3])
            .unwrap();
        assert_eq!(w.market.listing(w.car).unwrap().price, 900);
    }

    #[test]
    fn listing_requires_ownership_and_equipped_parts() {
        let mut w = world();
        let err = w
            .market
            .list_car(&w.engine, &w.parts, bob(), w.car, 10, [false; 3])
            .unwrap_err();
        assert!(matches!(err, MarketError::NotOwner { asset: Asset::Car(_), .. }));

        let wheels = slot(&w, 2);
        w.engine.unequip_part(&mut w.parts, alice(), w.car, wheels).unwrap();
        let err = w
            .market
            .list_car(&w.engine, &w.parts, alice(), w.car, 10, [false, false, true])
            .unwrap_err();
        assert_eq!(err, MarketError::NotEquipped { car: w.car, slot: 2 });

        let err = w
            .market
            .list_car(&w.engine, &w.parts, alice(), w.car, 0, [false; 3])
            .unwrap_err();
        assert_eq!(err, MarketError::InvalidPrice);
    }

    #[test]
    fn approval_status_reports_each_selected_part() {
        let mut w = world();
        let market = w.market.account();
        w.engine.approve(alice(), w.car, Some(market)).unwrap();
        let engine_part = slot(&w, 0);
        w.parts.approve(alice(), engine_part, Some(market)).unwrap();

        let status = w
            .market
            .approval_status(&w.engine, &w.parts, w.car, [true, true, false])
            .unwrap();
        assert!(status.car_approved);
        assert_eq!(status.parts_approved, [Some(true), Some(false), None]);
        assert!(!status.all_approved);

        approve_all(&mut w);
        let status = w
            .market
            .approval_status(&w.engine, &w.parts, w.car, [true; 3])
            .unwrap();
        assert!(status.all_approved);
    }

    #[test]
    fn purchase_moves_car_and_bundle_and_releases_the_rest() {
        let mut w = world();
        approve_all(&mut w);
        w.market.set_fee_bps(250).unwrap();
        w.market
            .list_car(&w.engine, &w.parts, alice(), w.car, 1_000, [true, true, false])
            .unwrap();
        let (engine_part, trans_part, wheels_part) = (slot(&w, 0), slot(&w, 1), slot(&w, 2));

        let plan = w
            .market
            .plan_purchase(&w.engine, &w.parts, bob(), w.car, 1_200)
            .unwrap();
        assert_eq!(plan.fee, 25);
        assert_eq!(plan.seller_proceeds, 975);
        assert_eq!(plan.refund, 200);
        assert_eq!(plan.bundled, vec![engine_part, trans_part]);
        assert_eq!(plan.released, vec![2]);

        w.market.settle(&mut w.engine, &mut w.parts, &plan).unwrap();

        assert_eq!(w.engine.owner_of(w.car).unwrap(), bob());
        assert_eq!(w.parts.owner_equipped_parts(&bob()).len(), 2);
        assert_eq!(w.parts.owner_of(wheels_part).unwrap(), alice());
        assert!(!w.parts.is_equipped(wheels_part).unwrap());
        assert_eq!(w.parts.owner_unequipped_parts(&alice()), vec![wheels_part]);
        assert_eq!(
            w.market.listing(w.car).unwrap().state,
            ListingState::Settled { buyer: bob() }
        );
        assert!(w.market.active_listings().is_empty());
    }

    #[test]
    fn purchase_revalidates_state_at_buy_time() {
        let mut w = world();
        approve_all(&mut w);
        w.market
            .list_car(&w.engine, &w.parts, alice(), w.car, 100, [true; 3])
            .unwrap();

        let err = w
            .market
            .plan_purchase(&w.engine, &w.parts, bob(), w.car, 99)
            .unwrap_err();
        assert_eq!(err, MarketError::InsufficientPayment { required: 100, attached: 99 });

        let wheels = slot(&w, 2);
        let market = w.market.account();
        w.parts.set_approval_for_all(alice(), market, false);
        let err = w
            .market
            .plan_purchase(&w.engine, &w.parts, bob(), w.car, 100)
            .unwrap_err();
        assert!(matches!(err, MarketError::TransferNotApproved(Asset::Part(_))));
        w.parts.set_approval_for_all(alice(), market, true);

        let spare = w
            .parts
            .mint(alice(), &PartSpec::new(PartType::Wheels, [1, 1, 1], "w2"), None)
            .unwrap();
        w.engine
            .replace_part(&mut w.parts, alice(), w.car, wheels, spare)
            .unwrap();
        let err = w
            .market
            .plan_purchase(&w.engine, &w.parts, bob(), w.car, 100)
            .unwrap_err();
        assert_eq!(err, MarketError::BundleChanged { car: w.car, slot: 2 });
    }

    #[test]
    fn inactive_listings_cannot_be_bought_or_cancelled() {
        let mut w = world();
        w.market
            .list_car(&w.engine, &w.parts, alice(), w.car, 100, [false; 3])
            .unwrap();
        assert!(w.market.invalidate(w.car));
        assert!(!w.market.invalidate(w.car));

        let err = w
            .market
            .plan_purchase(&w.engine, &w.parts, bob(), w.car, 100)
            .unwrap_err();
        assert_eq!(err, MarketError::ListingInactive(w.car));
        assert_eq!(
            w.market.cancel_listing(alice(), w.car).unwrap_err(),
            MarketError::ListingInactive(w.car)
        );
        assert_eq!(
            w.market.cancel_listing(alice(), CarId(99)).unwrap_err(),
            MarketError::ListingNotFound(CarId(99))
        );
    }

    #[test]
    fn fee_is_bounded_and_floored() {
        let mut market = Marketplace::default();
        assert_eq!(market.set_fee_bps(10_001).unwrap_err(), MarketError::InvalidFeeBps(10_001));
        market.set_fee_bps(333).unwrap();
        assert_eq!(market.fee_for(100).unwrap(), 3);
        assert_eq!(market.fee_for(Amount::MAX).unwrap_err(), MarketError::ArithmeticOverflow);
        market.set_fee_bps(MAX_FEE_BPS).unwrap();
        assert_eq!(market.fee_for(42).unwrap(), 42);
    }
}
