use rush_compose::ComposeError;
use rush_ledger::{Ledger, LedgerConfig, LedgerError};
use rush_market::{Asset, ListingState, MarketError};
use rush_parts::PartsError;
use rush_types::{AccountId, CarId, MintCarRequest, PartId, PartSpec, PartType};

fn operator() -> AccountId {
    AccountId::from_label("operator")
}

fn alice() -> AccountId {
    AccountId::from_label("alice")
}

fn bob() -> AccountId {
    AccountId::from_label("bob")
}

fn ledger() -> Ledger {
    let config = LedgerConfig {
        mint_price: 1_000,
        repair_price: 100,
        repair_amount: 40,
        protocol_fee_bps: 500,
        ..LedgerConfig::default()
    };
    let ledger = Ledger::new(operator(), &config).unwrap();
    ledger.deposit(alice(), 10_000).unwrap();
    ledger.deposit(bob(), 10_000).unwrap();
    ledger
}

fn request() -> MintCarRequest {
    MintCarRequest {
        image_uri: "ipfs://car".into(),
        parts: vec![
            PartSpec::new(PartType::Engine, [8, 9, 7], "ipfs://engine"),
            PartSpec::new(PartType::Transmission, [7, 8, 8], "ipfs://transmission"),
            PartSpec::new(PartType::Wheels, [8, 7, 8], "ipfs://wheels"),
        ],
    }
}

fn slot(ledger: &Ledger, car: CarId, slot: usize) -> PartId {
    ledger.car_composition(car).unwrap().part_ids[slot].unwrap()
}

fn assert_consistent(ledger: &Ledger) {
    let report = ledger.check_invariants().unwrap();
    assert!(report.is_valid(), "{:?}", report.violations);
    assert!(ledger.validate_journal().unwrap().is_valid());
}

#[test]
fn stats_follow_equipped_parts() {
    let ledger = ledger();
    let car = ledger.mint_car(alice(), &request(), 1_000).unwrap();

    let stats = ledger.compact_car_stats(car).unwrap();
    assert_eq!(stats.stats.speed, 15);
    assert_eq!(stats.stats.max_speed, 17);
    assert_eq!(stats.stats.acceleration, 15);
    assert_eq!(stats.stats.handling, 8);
    assert_eq!(stats.stats.drift_factor, 7);
    assert_eq!(stats.stats.turn_factor, 8);
    assert_eq!(ledger.compact_car_stats(car).unwrap(), stats);

    let engine = slot(&ledger, car, 0);
    ledger.unequip_part(alice(), car, engine).unwrap();
    let stripped = ledger.compact_car_stats(car).unwrap();
    assert_eq!(stripped.stats.speed, stats.stats.speed - 8);
    assert_eq!(stripped.stats.handling, stats.stats.handling);

    ledger.equip_part(alice(), car, engine, 0).unwrap();
    assert_eq!(ledger.compact_car_stats(car).unwrap(), stats);
    assert_consistent(&ledger);
}

#[test]
fn out_of_order_specs_land_in_typed_slots() {
    let ledger = ledger();
    let mut shuffled = request();
    shuffled.parts.rotate_left(1);
    let car = ledger.mint_car(alice(), &shuffled, 1_000).unwrap();

    for (index, part_type) in PartType::ALL.into_iter().enumerate() {
        let part = ledger.part(slot(&ledger, car, index)).unwrap();
        assert_eq!(part.part_type, part_type);
    }
    assert_eq!(ledger.compact_car_stats(car).unwrap().stats.speed, 15);
}

#[test]
fn replace_is_a_single_transition() {
    let ledger = ledger();
    let car = ledger.mint_car(alice(), &request(), 1_000).unwrap();
    let old = slot(&ledger, car, 0);
    let new = ledger
        .mint_part(operator(), alice(), &PartSpec::new(PartType::Engine, [10, 10, 10], "e2"))
        .unwrap();

    ledger.replace_part(alice(), car, old, new).unwrap();

    let old_part = ledger.part(old).unwrap();
    let new_part = ledger.part(new).unwrap();
    assert!(!old_part.is_equipped());
    assert_eq!(new_part.equipped_to, Some(car));
    assert_eq!(ledger.car_composition(car).unwrap().slot_occupied, [true; 3]);
    assert_eq!(ledger.owner_unequipped_parts(&alice()).unwrap(), vec![old]);
    assert_consistent(&ledger);
}

#[test]
fn equip_never_replaces_silently() {
    let ledger = ledger();
    let car = ledger.mint_car(alice(), &request(), 1_000).unwrap();
    let spare = ledger
        .mint_part(operator(), alice(), &PartSpec::new(PartType::Wheels, [1, 1, 1], "w2"))
        .unwrap();

    let err = ledger.equip_part(alice(), car, spare, 2).unwrap_err();
    assert_eq!(err, LedgerError::Compose(ComposeError::SlotOccupied { car, slot: 2 }));
    let err = ledger.equip_part(alice(), car, spare, 1).unwrap_err();
    assert!(matches!(err, LedgerError::Compose(ComposeError::TypeMismatch { .. })));
    assert_eq!(ledger.owner_unequipped_parts(&alice()).unwrap(), vec![spare]);
}

#[test]
fn equipped_parts_do_not_transfer_alone() {
    let ledger = ledger();
    let car = ledger.mint_car(alice(), &request(), 1_000).unwrap();
    let engine = slot(&ledger, car, 0);

    let err = ledger.transfer_part(alice(), engine, bob()).unwrap_err();
    assert_eq!(err, LedgerError::Parts(PartsError::AlreadyEquipped(engine)));

    ledger.unequip_part(alice(), car, engine).unwrap();
    ledger.transfer_part(alice(), engine, bob()).unwrap();
    assert_eq!(ledger.owner_unequipped_parts(&bob()).unwrap(), vec![engine]);
    assert_eq!(
        ledger.owner_parts_by_type(&alice(), PartType::Engine).unwrap(),
        Vec::<PartId>::new()
    );
    assert_consistent(&ledger);
}

#[test]
fn purchase_settles_assets_and_payment_together() {
    let ledger = ledger();
    let car = ledger.mint_car(alice(), &request(), 1_000).unwrap();
    let market = ledger.marketplace_account().unwrap();
    let wheels = slot(&ledger, car, 2);

    ledger.list_car(alice(), car, 2_000, [true, true, false]).unwrap();
    let status = ledger.listing_approval_status(car, [true, true, false]).unwrap();
    assert!(!status.all_approved);

    ledger.set_approval_for_all(alice(), market, true).unwrap();
    assert!(ledger.listing_approval_status(car, [true, true, false]).unwrap().all_approved);

    let plan = ledger.buy_car(bob(), car, 2_500).unwrap();
    assert_eq!(plan.fee, 100);

    assert_eq!(ledger.owner_cars(&bob()).unwrap(), vec![car]);
    assert_eq!(ledger.owner_equipped_parts(&bob()).unwrap().len(), 2);
    assert_eq!(ledger.owner_unequipped_parts(&alice()).unwrap(), vec![wheels]);
    assert!(!ledger.car_composition(car).unwrap().slot_occupied[2]);

    assert_eq!(ledger.balance(&bob()).unwrap(), 8_000);
    assert_eq!(ledger.balance(&alice()).unwrap(), 9_000 + 1_900);
    assert_eq!(ledger.treasury().unwrap(), 1_000 + 100);
    assert_eq!(
        ledger.listing(car).unwrap().unwrap().state,
        ListingState::Settled { buyer: bob() }
    );
    assert_consistent(&ledger);
}

#[test]
fn revoked_part_approval_aborts_the_whole_purchase() {
    let ledger = ledger();
    let car = ledger.mint_car(alice(), &request(), 1_000).unwrap();
    let market = ledger.marketplace_account().unwrap();
    let (engine, transmission) = (slot(&ledger, car, 0), slot(&ledger, car, 1));

    ledger.approve_car(alice(), car, Some(market)).unwrap();
    ledger.approve_part(alice(), engine, Some(market)).unwrap();
    ledger.list_car(alice(), car, 2_000, [true, true, false]).unwrap();
    let before = ledger.snapshot().unwrap();

    let err = ledger.buy_car(bob(), car, 2_000).unwrap_err();
    assert_eq!(
        err,
        LedgerError::Market(MarketError::TransferNotApproved(Asset::Part(transmission)))
    );
    assert_eq!(ledger.snapshot().unwrap(), before);
    assert!(ledger.listing(car).unwrap().unwrap().is_active());

    ledger.approve_part(alice(), transmission, Some(market)).unwrap();
    ledger.buy_car(bob(), car, 2_000).unwrap();
    assert_eq!(ledger.part(transmission).unwrap().owner, bob());
}

#[test]
fn buyer_must_cover_attached_payment() {
    let ledger = ledger();
    let car = ledger.mint_car(alice(), &request(), 1_000).unwrap();
    let market = ledger.marketplace_account().unwrap();
    ledger.set_approval_for_all(alice(), market, true).unwrap();
    ledger.list_car(alice(), car, 500, [false; 3]).unwrap();

    let err = ledger.buy_car(bob(), car, 20_000).unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    let err = ledger.buy_car(bob(), car, 400).unwrap_err();
    assert_eq!(
        err,
        LedgerError::Market(MarketError::InsufficientPayment { required: 500, attached: 400 })
    );
    assert_eq!(ledger.owner_cars(&alice()).unwrap(), vec![car]);
}

#[test]
fn transferring_a_listed_car_cancels_the_listing() {
    let ledger = ledger();
    let car = ledger.mint_car(alice(), &request(), 1_000).unwrap();
    ledger.list_car(alice(), car, 500, [false; 3]).unwrap();
    ledger.transfer_car(alice(), car, bob()).unwrap();

    assert_eq!(ledger.listing(car).unwrap().unwrap().state, ListingState::Cancelled);
    assert!(ledger.active_listings().unwrap().is_empty());
    ledger.list_car(bob(), car, 700, [false; 3]).unwrap();
    assert_consistent(&ledger);
}

#[test]
fn repair_wear_and_leaderboard() {
    let ledger = ledger();
    let race = AccountId::service("race");
    let a = ledger.mint_car(alice(), &request(), 1_000).unwrap();
    let b = ledger.mint_car(bob(), &request(), 1_000).unwrap();

    assert!(ledger.apply_wear(race, a, 10).is_err());
    ledger.set_workshop_authority(operator(), Some(race)).unwrap();
    assert_eq!(ledger.apply_wear(race, a, 70).unwrap(), 30);
    assert_eq!(ledger.compact_car_stats(a).unwrap().stats.speed, 4);

    let receipt = ledger.repair_car(alice(), a, 100).unwrap();
    assert_eq!(receipt.condition_after, 70);
    let err = ledger.repair_car(alice(), a, 99).unwrap_err();
    assert!(matches!(err, LedgerError::Workshop(_)));
    assert_eq!(ledger.treasury().unwrap(), 2_100);

    ledger.set_leaderboard_authority(operator(), Some(race)).unwrap();
    assert!(ledger.record_race_result(race, b, 300).unwrap());
    assert!(ledger.record_race_result(race, a, 300).unwrap());
    assert!(!ledger.record_race_result(operator(), a, 120).unwrap());
    assert!(ledger.record_race_result(alice(), a, 999).is_err());

    let top = ledger.leaderboard_top(10).unwrap();
    assert_eq!(top.iter().map(|e| e.car_id).collect::<Vec<_>>(), vec![b, a]);
    assert_eq!(ledger.rank_of(a).unwrap(), Some(2));
    assert_eq!(ledger.best_score(a).unwrap(), Some(300));
    assert_consistent(&ledger);
}
