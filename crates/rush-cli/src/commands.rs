use anyhow::Context;
use colored::Colorize;
use rush_compose::FullCarMetadata;
use rush_generator::{GenerationRequest, HttpPartGenerator, PartGenerator};
use rush_ledger::Ledger;
use rush_parts::Part;
use rush_types::{AccountId, Amount, CarId, MintCarRequest, PartId, PartSpec, PartType, SLOT_COUNT};
use serde::Serialize;

use crate::cli::*;
use crate::config::RushConfig;
use crate::store::Store;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = RushConfig::load(&cli.config)?;
    let store = Store::new(cli.state);
    let out = Output(cli.format);
    match cli.command {
        Command::Init(args) => cmd_init(&store, &config, args),
        Command::Deposit(args) => cmd_deposit(&store, out, args),
        Command::Balance(args) => cmd_balance(&store, out, args),
        Command::MintCar(args) => cmd_mint_car(&store, out, args),
        Command::Generate(args) => cmd_generate(&store, &config, out, args),
        Command::MintPart(args) => cmd_mint_part(&store, out, args),
        Command::Equip(args) => cmd_equip(&store, args),
        Command::Unequip(args) => cmd_unequip(&store, args),
        Command::Replace(args) => cmd_replace(&store, args),
        Command::TransferPart(args) => cmd_transfer_part(&store, args),
        Command::TransferCar(args) => cmd_transfer_car(&store, args),
        Command::Approve(args) => cmd_approve(&store, args),
        Command::List(args) => cmd_list(&store, args),
        Command::Cancel(args) => cmd_cancel(&store, args),
        Command::Buy(args) => cmd_buy(&store, out, args),
        Command::Listings(_) => cmd_listings(&store, out),
        Command::ApprovalStatus(args) => cmd_approval_status(&store, out, args),
        Command::Repair(args) => cmd_repair(&store, out, args),
        Command::Wear(args) => cmd_wear(&store, args),
        Command::Race(args) => cmd_race(&store, args),
        Command::Leaderboard(args) => cmd_leaderboard(&store, out, args),
        Command::Car(args) => cmd_car(&store, out, args),
        Command::Cars(args) => cmd_cars(&store, out, args),
        Command::Parts(args) => cmd_parts(&store, out, args),
        Command::SetMintPrice(args) => cmd_set_mint_price(&store, args),
        Command::SetRepairPrice(args) => cmd_set_repair_price(&store, args),
        Command::SetFee(args) => cmd_set_fee(&store, args),
        Command::SetAuthority(args) => cmd_set_authority(&store, args),
        Command::Withdraw(args) => cmd_withdraw(&store, out, args),
        Command::TransferOperator(args) => cmd_transfer_operator(&store, args),
        Command::SetBaseUri(args) => cmd_set_base_uri(&store, args),
        Command::TokenUri(args) => cmd_token_uri(&store, out, args),
        Command::Log(args) => cmd_log(&store, out, args),
        Command::Verify(_) => cmd_verify(&store, out),
    }
}

// ---- Output ----

#[derive(Clone, Copy)]
struct Output(OutputFormat);

impl Output {
    /// JSON mode prints `value`; text mode runs `text`.
    fn emit<T: Serialize>(self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        match self.0 {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(value),
        }
        Ok(())
    }
}

fn ok(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green().bold(), message);
}

fn slots_from(include: &[PartType]) -> [bool; SLOT_COUNT] {
    let mut slots = [false; SLOT_COUNT];
    for part_type in include {
        slots[part_type.slot_index()] = true;
    }
    slots
}

fn part_row(part: &Part) -> String {
    format!(
        "{:<10} {:<12} {:>3} {:>3} {:>3}",
        part.id.to_string(),
        part.part_type.name(),
        part.stat1,
        part.stat2,
        part.stat3
    )
}

fn equipped_message(part: PartId, slot: usize, car: CarId) -> String {
    format!("Equipped {part} into slot {slot} of {car}")
}

fn replaced_message(old: PartId, new: PartId, car: CarId) -> String {
    format!("Replaced {old} with {new} on {car}")
}

fn slot_label(slot: Option<PartId>) -> String {
    slot.map_or_else(|| "(empty)".dimmed().to_string(), |id| id.to_string())
}

// ---- Setup and balances ----

fn cmd_init(store: &Store, config: &RushConfig, args: InitArgs) -> anyhow::Result<()> {
    if store.exists() && !args.force {
        anyhow::bail!("{} already exists (use --force to overwrite)", store.path().display());
    }
    let ledger = Ledger::new(args.operator, &config.ledger)?;
    store.save(&ledger)?;
    ok(format!("Initialized ledger in {}", store.path().display().to_string().bold()));
    println!("  Operator: {}", args.operator.to_string().cyan());
    println!("  Mint price: {}", config.ledger.mint_price);
    println!("  Marketplace fee: {} bps", config.ledger.protocol_fee_bps);
    Ok(())
}

#[derive(Serialize)]
struct BalanceView {
    account: Option<AccountId>,
    balance: Amount,
}

fn cmd_deposit(store: &Store, out: Output, args: DepositArgs) -> anyhow::Result<()> {
    let balance = store.update(|ledger| Ok(ledger.deposit(args.account, args.amount)?))?;
    let view = BalanceView {
        account: Some(args.account),
        balance,
    };
    out.emit(&view, |v| ok(format!("Deposited {} (balance {})", args.amount, v.balance)))
}

fn cmd_balance(store: &Store, out: Output, args: BalanceArgs) -> anyhow::Result<()> {
    let ledger = store.load()?;
    let balance = match &args.account {
        Some(account) => ledger.balance(account)?,
        None => ledger.treasury()?,
    };
    let view = BalanceView {
        account: args.account,
        balance,
    };
    out.emit(&view, |v| match v.account {
        Some(account) => println!("{}: {}", account.to_string().cyan(), v.balance.to_string().bold()),
        None => println!("Treasury: {}", v.balance.to_string().bold()),
    })
}

#[derive(Serialize)]
struct Withdrawal {
    to: AccountId,
    amount: Amount,
}

fn cmd_withdraw(store: &Store, out: Output, args: WithdrawArgs) -> anyhow::Result<()> {
    let amount = store.update(|ledger| Ok(ledger.withdraw(args.caller, args.amount)?))?;
    let view = Withdrawal {
        to: args.caller,
        amount,
    };
    out.emit(&view, |v| ok(format!("Withdrew {} to {}", v.amount, v.to)))
}

// ---- Minting ----

fn mint_request(args: &MintCarArgs) -> anyhow::Result<MintCarRequest> {
    if let Some(path) = &args.request {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        return serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()));
    }
    let image = args
        .image
        .clone()
        .context("--image is required without --request")?;
    let mut parts = Vec::with_capacity(SLOT_COUNT);
    for (part_type, stats) in [
        (PartType::Engine, args.engine),
        (PartType::Transmission, args.transmission),
        (PartType::Wheels, args.wheels),
    ] {
        let flag = part_type.name().to_ascii_lowercase();
        let stats = stats.with_context(|| format!("--{flag} is required without --request"))?;
        parts.push(PartSpec::new(part_type, stats, format!("{image}#{flag}")));
    }
    Ok(MintCarRequest {
        image_uri: image,
        parts,
    })
}

#[derive(Serialize)]
struct Minted {
    car_id: CarId,
    part_ids: [Option<PartId>; SLOT_COUNT],
    paid: Amount,
}

fn mint_and_report(
    store: &Store,
    out: Output,
    caller: AccountId,
    request: &MintCarRequest,
    payment: Option<Amount>,
) -> anyhow::Result<()> {
    let minted = store.update(|ledger| {
        let paid = match payment {
            Some(payment) => payment,
            None => ledger.mint_price()?,
        };
        let car_id = ledger.mint_car(caller, request, paid)?;
        let part_ids = ledger.car_composition(car_id)?.part_ids;
        Ok(Minted {
            car_id,
            part_ids,
            paid,
        })
    })?;
    out.emit(&minted, |m| {
        ok(format!("Minted {} for {}", m.car_id.to_string().yellow().bold(), m.paid));
        for (part_type, slot) in PartType::ALL.iter().zip(m.part_ids) {
            println!("  {:<12} {}", part_type.name(), slot_label(slot));
        }
    })
}

fn cmd_mint_car(store: &Store, out: Output, args: MintCarArgs) -> anyhow::Result<()> {
    let request = mint_request(&args)?;
    mint_and_report(store, out, args.caller, &request, args.payment)
}

fn cmd_generate(store: &Store, config: &RushConfig, out: Output, args: GenerateArgs) -> anyhow::Result<()> {
    let generator = HttpPartGenerator::new(&config.generator)?;
    let mut request = GenerationRequest::new(args.prompt);
    if let Some(style) = args.style {
        request = request.style(style);
    }
    let runtime = tokio::runtime::Runtime::new()?;
    let descriptor = runtime
        .block_on(generator.generate(&request))
        .with_context(|| format!("generating from {}", generator.url()))?;

    if args.dry_run {
        return out.emit(&descriptor, |d| {
            println!("Image: {}", d.car_image_uri.blue());
            for spec in &d.parts {
                println!(
                    "  {:<12} {:>3} {:>3} {:>3}  {}",
                    spec.part_type.name(),
                    spec.stat1,
                    spec.stat2,
                    spec.stat3,
                    spec.image_uri.dimmed()
                );
            }
        });
    }
    let mint = MintCarRequest::from(descriptor);
    mint_and_report(store, out, args.caller, &mint, args.payment)
}

fn cmd_mint_part(store: &Store, out: Output, args: MintPartArgs) -> anyhow::Result<()> {
    let spec = PartSpec::new(args.part_type, args.stats, args.image);
    let part_id = store.update(|ledger| Ok(ledger.mint_part(args.caller, args.owner, &spec)?))?;
    out.emit(&part_id, |id| {
        ok(format!("Minted {} {} for {}", spec.part_type.name(), id, args.owner))
    })
}

// ---- Composition ----

fn cmd_equip(store: &Store, args: EquipArgs) -> anyhow::Result<()> {
    let (car, part) = (CarId(args.car), PartId(args.part));
    let slot = store.update(|ledger| {
        let slot = match args.slot {
            Some(slot) => slot,
            None => ledger.part(part)?.part_type.slot_index(),
        };
        ledger.equip_part(args.caller, car, part, slot)?;
        Ok(slot)
    })?;
    ok(equipped_message(part, slot, car));
    Ok(())
}

fn cmd_unequip(store: &Store, args: UnequipArgs) -> anyhow::Result<()> {
    let (car, part) = (CarId(args.car), PartId(args.part));
    store.update(|ledger| Ok(ledger.unequip_part(args.caller, car, part)?))?;
    ok(format!("Unequipped {part} from {car}"));
    Ok(())
}

fn cmd_replace(store: &Store, args: ReplaceArgs) -> anyhow::Result<()> {
    let car = CarId(args.car);
    let (old, new) = (PartId(args.old), PartId(args.new));
    store.update(|ledger| Ok(ledger.replace_part(args.caller, car, old, new)?))?;
    ok(replaced_message(old, new, car));
    Ok(())
}

// ---- Ownership ----

fn cmd_transfer_part(store: &Store, args: TransferPartArgs) -> anyhow::Result<()> {
    let part = PartId(args.part);
    store.update(|ledger| Ok(ledger.transfer_part(args.caller, part, args.to)?))?;
    ok(format!("Transferred {part} to {}", args.to));
    Ok(())
}

fn cmd_transfer_car(store: &Store, args: TransferCarArgs) -> anyhow::Result<()> {
    let car = CarId(args.car);
    store.update(|ledger| Ok(ledger.transfer_car(args.caller, car, args.to)?))?;
    ok(format!("Transferred {car} to {}", args.to));
    Ok(())
}

fn cmd_approve(store: &Store, args: ApproveArgs) -> anyhow::Result<()> {
    let spender = store.update(|ledger| {
        let spender = match args.spender {
            Some(spender) => spender,
            None => ledger.marketplace_account()?,
        };
        let approved = (!args.revoke).then_some(spender);
        match (args.car, args.part) {
            (Some(car), _) => ledger.approve_car(args.caller, CarId(car), approved)?,
            (None, Some(part)) => ledger.approve_part(args.caller, PartId(part), approved)?,
            (None, None) => ledger.set_approval_for_all(args.caller, spender, !args.revoke)?,
        }
        Ok(spender)
    })?;
    let target = match (args.car, args.part) {
        (Some(car), _) => CarId(car).to_string(),
        (None, Some(part)) => PartId(part).to_string(),
        (None, None) => "all assets".to_string(),
    };
    let verb = if args.revoke { "Revoked" } else { "Approved" };
    ok(format!("{verb} {spender} for {target}"));
    Ok(())
}

// ---- Marketplace ----

fn cmd_list(store: &Store, args: ListArgs) -> anyhow::Result<()> {
    let car = CarId(args.car);
    let slots = slots_from(&args.include);
    store.update(|ledger| Ok(ledger.list_car(args.caller, car, args.price, slots)?))?;
    ok(format!("Listed {car} for {}", args.price.to_string().bold()));
    Ok(())
}

fn cmd_cancel(store: &Store, args: CancelArgs) -> anyhow::Result<()> {
    let car = CarId(args.car);
    store.update(|ledger| Ok(ledger.cancel_listing(args.caller, car)?))?;
    ok(format!("Cancelled listing for {car}"));
    Ok(())
}

fn cmd_buy(store: &Store, out: Output, args: BuyArgs) -> anyhow::Result<()> {
    let car = CarId(args.car);
    let plan = store.update(|ledger| {
        let payment = match args.payment {
            Some(payment) => payment,
            None => {
                ledger
                    .listing(car)?
                    .with_context(|| format!("{car} is not listed"))?
                    .price
            }
        };
        Ok(ledger.buy_car(args.caller, car, payment)?)
    })?;
    out.emit(&plan, |p| {
        ok(format!("Bought {} from {}", p.car_id, p.seller));
        println!("  Price: {} (fee {}, seller receives {})", p.price, p.fee, p.seller_proceeds);
        if p.refund > 0 {
            println!("  Refunded: {}", p.refund);
        }
        if !p.bundled.is_empty() {
            let ids: Vec<String> = p.bundled.iter().map(|id| id.to_string()).collect();
            println!("  Parts included: {}", ids.join(", "));
        }
    })
}

fn cmd_listings(store: &Store, out: Output) -> anyhow::Result<()> {
    let listings = store.load()?.active_listings()?;
    out.emit(&listings, |listings| {
        if listings.is_empty() {
            println!("No active listings.");
        }
        for listing in listings {
            let bundled: Vec<&str> = PartType::ALL
                .iter()
                .filter(|t| listing.include_slots[t.slot_index()])
                .map(|t| t.name())
                .collect();
            println!(
                "{}  {}  seller {}  parts [{}]",
                listing.car_id.to_string().yellow().bold(),
                listing.price.to_string().bold(),
                listing.seller,
                bundled.join(", ")
            );
        }
    })
}

fn cmd_approval_status(store: &Store, out: Output, args: ApprovalStatusArgs) -> anyhow::Result<()> {
    let status = store
        .load()?
        .listing_approval_status(CarId(args.car), slots_from(&args.include))?;
    out.emit(&status, |s| {
        let mark = |approved: bool| if approved { "✓".green() } else { "✗".red() };
        println!("Car: {}", mark(s.car_approved));
        for (part_type, approved) in PartType::ALL.iter().zip(s.parts_approved) {
            if let Some(approved) = approved {
                println!("{:<13} {}", format!("{}:", part_type.name()), mark(approved));
            }
        }
        if s.all_approved {
            println!("{}", "Ready for sale".green().bold());
        } else {
            println!("{}", "Marketplace approval missing".yellow());
        }
    })
}

// ---- Workshop and racing ----

fn cmd_repair(store: &Store, out: Output, args: RepairArgs) -> anyhow::Result<()> {
    let car = CarId(args.car);
    let receipt = store.update(|ledger| {
        let payment = match args.payment {
            Some(payment) => payment,
            None => ledger.view(|state| state.workshop().repair_price())?,
        };
        Ok(ledger.repair_car(args.caller, car, payment)?)
    })?;
    out.emit(&receipt, |r| {
        ok(format!(
            "Repaired {}: condition {} -> {} (paid {})",
            r.car_id, r.condition_before, r.condition_after, r.charged
        ))
    })
}

fn cmd_wear(store: &Store, args: WearArgs) -> anyhow::Result<()> {
    let car = CarId(args.car);
    let condition = store.update(|ledger| Ok(ledger.apply_wear(args.caller, car, args.amount)?))?;
    ok(format!("{car} condition now {condition}"));
    Ok(())
}

fn cmd_race(store: &Store, args: RaceArgs) -> anyhow::Result<()> {
    let car = CarId(args.car);
    let improved = store.update(|ledger| Ok(ledger.record_race_result(args.caller, car, args.score)?))?;
    if improved {
        ok(format!("New best for {car}: {}", args.score.to_string().bold()));
    } else {
        println!("Recorded {} for {car} (best unchanged)", args.score);
    }
    Ok(())
}

fn cmd_leaderboard(store: &Store, out: Output, args: LeaderboardArgs) -> anyhow::Result<()> {
    let top = store.load()?.leaderboard_top(args.limit)?;
    out.emit(&top, |top| {
        if top.is_empty() {
            println!("No results recorded.");
        }
        for (rank, entry) in top.iter().enumerate() {
            println!(
                "{:>3}. {}  {}",
                rank + 1,
                entry.car_id.to_string().yellow(),
                entry.score.to_string().bold()
            );
        }
    })
}

// ---- Queries ----

fn print_car(meta: &FullCarMetadata) {
    println!("{}  owner {}", meta.car_id.to_string().yellow().bold(), meta.owner);
    println!("  Image: {}", meta.image_uri.blue());
    println!("  Condition: {}", meta.total_stats.condition);
    for slot_part in &meta.parts {
        println!("  [{}] {}", slot_part.slot_index, part_row(&slot_part.part));
    }
    let stats = &meta.total_stats.stats;
    println!(
        "  Speed {}  Max speed {}  Acceleration {}  Handling {}  Drift {}  Turn {}",
        stats.speed, stats.max_speed, stats.acceleration, stats.handling, stats.drift_factor, stats.turn_factor
    );
}

fn cmd_car(store: &Store, out: Output, args: CarArgs) -> anyhow::Result<()> {
    let meta = store.load()?.full_car_metadata(CarId(args.car))?;
    out.emit(&meta, print_car)
}

fn cmd_cars(store: &Store, out: Output, args: CarsArgs) -> anyhow::Result<()> {
    let cars = store.load()?.all_car_metadata(&args.owner)?;
    out.emit(&cars, |cars| {
        if cars.is_empty() {
            println!("{} owns no cars.", args.owner);
        }
        for meta in cars {
            print_car(meta);
        }
    })
}

fn cmd_parts(store: &Store, out: Output, args: PartsArgs) -> anyhow::Result<()> {
    let ledger = store.load()?;
    let details = ledger.owner_parts_with_details(&args.owner)?;
    let source = if args.equipped {
        details.equipped_parts
    } else if args.unequipped {
        details.unequipped_parts
    } else {
        details.all_parts
    };
    let parts: Vec<_> = source
        .into_iter()
        .filter(|part| args.part_type.map_or(true, |t| part.part_type == t))
        .collect();
    out.emit(&parts, |parts| {
        if parts.is_empty() {
            println!("No parts.");
        }
        for part in parts {
            let location = match part.equipped_to {
                Some(car) => format!("on {car}").green().to_string(),
                None => "spare".dimmed().to_string(),
            };
            println!("{}  {}", part_row(part), location);
        }
    })
}

// ---- Administration ----

fn cmd_set_mint_price(store: &Store, args: SetPriceArgs) -> anyhow::Result<()> {
    store.update(|ledger| Ok(ledger.set_mint_price(args.caller, args.price)?))?;
    ok(format!("Mint price set to {}", args.price));
    Ok(())
}

fn cmd_set_repair_price(store: &Store, args: SetPriceArgs) -> anyhow::Result<()> {
    store.update(|ledger| Ok(ledger.set_repair_price(args.caller, args.price)?))?;
    ok(format!("Repair price set to {}", args.price));
    Ok(())
}

fn cmd_set_fee(store: &Store, args: SetFeeArgs) -> anyhow::Result<()> {
    store.update(|ledger| Ok(ledger.set_protocol_fee(args.caller, args.bps)?))?;
    ok(format!("Marketplace fee set to {} bps", args.bps));
    Ok(())
}

fn cmd_set_authority(store: &Store, args: SetAuthorityArgs) -> anyhow::Result<()> {
    store.update(|ledger| {
        match args.role {
            Role::Workshop => ledger.set_workshop_authority(args.caller, args.account)?,
            Role::Leaderboard => ledger.set_leaderboard_authority(args.caller, args.account)?,
        }
        Ok(())
    })?;
    let role = match args.role {
        Role::Workshop => "Workshop",
        Role::Leaderboard => "Leaderboard",
    };
    match args.account {
        Some(account) => ok(format!("{role} authority set to {account}")),
        None => ok(format!("{role} authority cleared")),
    }
    Ok(())
}

fn cmd_transfer_operator(store: &Store, args: TransferOperatorArgs) -> anyhow::Result<()> {
    store.update(|ledger| Ok(ledger.transfer_operator(args.caller, args.to)?))?;
    ok(format!("Operator is now {}", args.to.to_string().cyan()));
    Ok(())
}

fn cmd_set_base_uri(store: &Store, args: SetBaseUriArgs) -> anyhow::Result<()> {
    store.update(|ledger| Ok(ledger.set_base_uri(args.caller, args.uri.as_str())?))?;
    ok(format!("Base URI set to {}", args.uri.blue()));
    Ok(())
}

fn cmd_token_uri(store: &Store, out: Output, args: TokenUriArgs) -> anyhow::Result<()> {
    let ledger = store.load()?;
    let uri = match (args.car, args.part) {
        (Some(car), _) => ledger.car_token_uri(CarId(car))?,
        (None, Some(part)) => ledger.part_token_uri(PartId(part))?,
        (None, None) => ledger.base_uri()?,
    };
    out.emit(&uri, |uri| println!("{uri}"))
}

// ---- Audit ----

fn cmd_log(store: &Store, out: Output, args: LogArgs) -> anyhow::Result<()> {
    let entries = store.load()?.journal()?;
    let skip = entries.len().saturating_sub(args.limit);
    let recent = &entries[skip..];
    out.emit(&recent, |recent| {
        for entry in recent.iter().rev() {
            let event = serde_json::to_string(&entry.event).unwrap_or_default();
            println!(
                "{}  {}  {}",
                format!("#{}", entry.seq).yellow(),
                entry.hash_hex()[..12].dimmed(),
                event
            );
        }
    })
}

#[derive(Serialize)]
struct VerifyView {
    journal: rush_ledger::ValidationReport,
    invariants: rush_ledger::InvariantReport,
}

fn cmd_verify(store: &Store, out: Output) -> anyhow::Result<()> {
    let ledger = store.load()?;
    let view = VerifyView {
        journal: ledger.validate_journal()?,
        invariants: ledger.check_invariants()?,
    };
    out.emit(&view, |v| {
        let mark = |valid: bool| if valid { "valid".green() } else { "BROKEN".red().bold() };
        println!("Journal: {} entries", v.journal.entry_count.to_string().bold());
        println!("  Hash chain: {}", mark(v.journal.hash_chain_valid));
        println!("  Sequences: {}", mark(v.journal.sequence_monotonic));
        println!(
            "Invariants: {} parts, {} cars, {}",
            v.invariants.parts_checked,
            v.invariants.cars_checked,
            mark(v.invariants.is_valid())
        );
        for violation in &v.journal.violations {
            println!("  {} #{}: {}", "✗".red(), violation.seq, violation.description);
        }
        for violation in &v.invariants.violations {
            println!("  {} {:?}: {}", "✗".red(), violation.kind, violation.description);
        }
    })?;
    if !view.journal.is_valid() || !view.invariants.is_valid() {
        anyhow::bail!("ledger verification failed");
    }
    Ok(())
}
