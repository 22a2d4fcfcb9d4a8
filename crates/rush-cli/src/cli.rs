use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rush_types::{AccountId, Amount, PartType};

#[derive(Parser)]
#[command(
    name = "rush",
    about = "Speed Rush: composable car and part ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Ledger state file
    #[arg(long, global = true, default_value = "rush-state.json")]
    pub state: PathBuf,

    /// Configuration file with [ledger] and [generator] tables
    #[arg(long, global = true, default_value = "rush.toml")]
    pub config: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a fresh ledger state file
    Init(InitArgs),
    /// Credit native currency to an account
    Deposit(DepositArgs),
    /// Show an account balance, or the treasury
    Balance(BalanceArgs),
    /// Mint a car with its three parts
    MintCar(MintCarArgs),
    /// Request a car from the generator service and mint it
    Generate(GenerateArgs),
    /// Mint a standalone part (operator only)
    MintPart(MintPartArgs),
    /// Equip an owned part into an empty slot
    Equip(EquipArgs),
    /// Remove a part from a car
    Unequip(UnequipArgs),
    /// Swap an equipped part for a spare of the same type
    Replace(ReplaceArgs),
    /// Transfer an unequipped part
    TransferPart(TransferPartArgs),
    /// Transfer a car; its equipped parts keep their owner
    TransferCar(TransferCarArgs),
    /// Approve a spender for a car, a part, or everything
    Approve(ApproveArgs),
    /// List a car for sale
    List(ListArgs),
    /// Cancel an active listing
    Cancel(CancelArgs),
    /// Buy a listed car
    Buy(BuyArgs),
    /// Show active listings
    Listings(ListingsArgs),
    /// Check marketplace approvals for a listing
    ApprovalStatus(ApprovalStatusArgs),
    /// Repair a car's condition
    Repair(RepairArgs),
    /// Reduce a car's condition
    Wear(WearArgs),
    /// Record a race score
    Race(RaceArgs),
    /// Show the leaderboard
    Leaderboard(LeaderboardArgs),
    /// Show a car with its parts and stats
    Car(CarArgs),
    /// List cars owned by an account
    Cars(CarsArgs),
    /// List parts owned by an account
    Parts(PartsArgs),
    /// Set the car mint price (operator only)
    SetMintPrice(SetPriceArgs),
    /// Set the repair price (operator only)
    SetRepairPrice(SetPriceArgs),
    /// Set the marketplace fee in basis points (operator only)
    SetFee(SetFeeArgs),
    /// Set or clear the workshop or leaderboard authority (operator only)
    SetAuthority(SetAuthorityArgs),
    /// Withdraw treasury funds (operator only)
    Withdraw(WithdrawArgs),
    /// Hand operator rights to another account (operator only)
    TransferOperator(TransferOperatorArgs),
    /// Set the metadata base URI (operator only)
    SetBaseUri(SetBaseUriArgs),
    /// Show the metadata URI of a car or part, or the base URI
    TokenUri(TokenUriArgs),
    /// Show the operation journal
    Log(LogArgs),
    /// Verify journal integrity and ledger invariants
    Verify(VerifyArgs),
}

/// Accepts a 64-character hex id (optionally `acct:`-prefixed) or a label.
pub fn parse_account(s: &str) -> Result<AccountId, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("account must not be empty".into());
    }
    let hex = trimmed.strip_prefix("acct:").unwrap_or(trimmed);
    if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return AccountId::from_hex(hex).map_err(|e| e.to_string());
    }
    if trimmed.starts_with("acct:") {
        return Err(format!("invalid account id: {trimmed}"));
    }
    Ok(AccountId::from_label(trimmed))
}

/// Parses `s1,s2,s3`.
pub fn parse_stats(s: &str) -> Result<[u8; 3], String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<u8>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    values
        .try_into()
        .map_err(|v: Vec<u8>| format!("expected 3 stats, got {}", v.len()))
}

#[derive(Args)]
pub struct InitArgs {
    /// Operator account
    #[arg(long, value_parser = parse_account)]
    pub operator: AccountId,
    /// Overwrite an existing state file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct DepositArgs {
    #[arg(value_parser = parse_account)]
    pub account: AccountId,
    pub amount: Amount,
}

#[derive(Args)]
pub struct BalanceArgs {
    #[arg(value_parser = parse_account)]
    pub account: Option<AccountId>,
}

#[derive(Args)]
pub struct MintCarArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    /// JSON file holding `carImageURI` and `parts`
    #[arg(long, conflicts_with_all = ["image", "engine", "transmission", "wheels"])]
    pub request: Option<PathBuf>,
    #[arg(long)]
    pub image: Option<String>,
    #[arg(long, value_parser = parse_stats)]
    pub engine: Option<[u8; 3]>,
    #[arg(long, value_parser = parse_stats)]
    pub transmission: Option<[u8; 3]>,
    #[arg(long, value_parser = parse_stats)]
    pub wheels: Option<[u8; 3]>,
    /// Defaults to the current mint price
    #[arg(long)]
    pub payment: Option<Amount>,
}

#[derive(Args)]
pub struct GenerateArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub prompt: String,
    #[arg(long)]
    pub style: Option<String>,
    #[arg(long)]
    pub payment: Option<Amount>,
    /// Print the generated descriptor without minting
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct MintPartArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    #[arg(value_parser = parse_account)]
    pub owner: AccountId,
    pub part_type: PartType,
    #[arg(value_parser = parse_stats)]
    pub stats: [u8; 3],
    #[arg(long, default_value = "")]
    pub image: String,
}

#[derive(Args)]
pub struct EquipArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
    pub part: u64,
    /// Defaults to the slot matching the part's type
    #[arg(long)]
    pub slot: Option<usize>,
}

#[derive(Args)]
pub struct UnequipArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
    pub part: u64,
}

#[derive(Args)]
pub struct ReplaceArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
    pub old: u64,
    pub new: u64,
}

#[derive(Args)]
pub struct TransferPartArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub part: u64,
    #[arg(value_parser = parse_account)]
    pub to: AccountId,
}

#[derive(Args)]
pub struct TransferCarArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
    #[arg(value_parser = parse_account)]
    pub to: AccountId,
}

#[derive(Args)]
pub struct ApproveArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    /// Spender; defaults to the marketplace
    #[arg(long, value_parser = parse_account)]
    pub spender: Option<AccountId>,
    #[arg(long, conflicts_with = "part")]
    pub car: Option<u64>,
    #[arg(long)]
    pub part: Option<u64>,
    /// Clear the approval instead of granting it
    #[arg(long)]
    pub revoke: bool,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
    pub price: Amount,
    /// Equipped part types sold with the car, e.g. `engine,wheels`
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<PartType>,
}

#[derive(Args)]
pub struct CancelArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
}

#[derive(Args)]
pub struct BuyArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
    /// Defaults to the listing price
    #[arg(long)]
    pub payment: Option<Amount>,
}

#[derive(Args)]
pub struct ListingsArgs {}

#[derive(Args)]
pub struct ApprovalStatusArgs {
    pub car: u64,
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<PartType>,
}

#[derive(Args)]
pub struct RepairArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
    /// Defaults to the repair price
    #[arg(long)]
    pub payment: Option<Amount>,
}

#[derive(Args)]
pub struct WearArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
    pub amount: u8,
}

#[derive(Args)]
pub struct RaceArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub car: u64,
    pub score: u64,
}

#[derive(Args)]
pub struct LeaderboardArgs {
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,
}

#[derive(Args)]
pub struct CarArgs {
    pub car: u64,
}

#[derive(Args)]
pub struct CarsArgs {
    #[arg(value_parser = parse_account)]
    pub owner: AccountId,
}

#[derive(Args)]
pub struct PartsArgs {
    #[arg(value_parser = parse_account)]
    pub owner: AccountId,
    #[arg(long = "type")]
    pub part_type: Option<PartType>,
    #[arg(long, conflicts_with = "unequipped")]
    pub equipped: bool,
    #[arg(long)]
    pub unequipped: bool,
}

#[derive(Args)]
pub struct SetPriceArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub price: Amount,
}

#[derive(Args)]
pub struct SetFeeArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub bps: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Role {
    Workshop,
    Leaderboard,
}

#[derive(Args)]
pub struct SetAuthorityArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub role: Role,
    /// New authority; omit to clear it
    #[arg(value_parser = parse_account)]
    pub account: Option<AccountId>,
}

#[derive(Args)]
pub struct WithdrawArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    /// Defaults to the whole treasury
    #[arg(long)]
    pub amount: Option<Amount>,
}

#[derive(Args)]
pub struct TransferOperatorArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    #[arg(value_parser = parse_account)]
    pub to: AccountId,
}

#[derive(Args)]
pub struct SetBaseUriArgs {
    #[arg(long = "as", value_parser = parse_account)]
    pub caller: AccountId,
    pub uri: String,
}

#[derive(Args)]
pub struct TokenUriArgs {
    #[arg(long, conflicts_with = "part")]
    pub car: Option<u64>,
    #[arg(long)]
    pub part: Option<u64>,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
}

#[derive(Args)]
pub struct VerifyArgs {}
