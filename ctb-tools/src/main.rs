use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use ctb_balance_state::{
    apply_with_retry, to_message, AccountBalanceState, ApplyPendingBalance, BalanceLedger,
    BalanceStateConfig, InMemoryLedger,
};
use ctb_common::{
    address::{is_valid_account_address, truncate_address},
    codec, CiphertextAlgebra, ElGamalCiphertext, ElGamalKeypair, ElGamalPubkey, ElGamalSecretKey,
    WireCiphertext, DEFAULT_ACCOUNT_HRP,
};
use rand::rngs::OsRng;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_STATE_PATH: &str = "ctb-state.json";
const DEFAULT_DENOM: &str = "usei";
const DEFAULT_DECRYPT_BOUND: u64 = 1 << 20;

type Ledger = InMemoryLedger<ElGamalCiphertext>;

#[derive(Parser)]
#[command(
    name = "ctb",
    about = "Utility commands for confidential token balances"
)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an ElGamal keypair.
    Keygen(KeygenArgs),
    /// Encrypt an amount under a public key.
    Encrypt(EncryptArgs),
    /// Decrypt a ciphertext with a secret key.
    Decrypt(DecryptArgs),
    /// Decode a wire ciphertext and print its components.
    Inspect(InspectArgs),
    /// Credit an encrypted amount to an account's pending balance.
    Credit(CreditArgs),
    /// Apply an account's pending balance and print the resulting message.
    Apply(ApplyArgs),
}

/// Overrides for values otherwise read from the environment.
#[derive(Args)]
struct ConfigArgs {
    /// Maximum unapplied credits per account.
    #[arg(long, global = true)]
    max_pending_credits: Option<u32>,
    /// Attempts before giving up on a stale counter.
    #[arg(long, global = true)]
    max_apply_attempts: Option<u32>,
}

#[derive(Args)]
struct KeygenArgs {
    /// Derive the key from this seed instead of sampling one.
    #[arg(long)]
    seed: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct EncryptArgs {
    /// Hex-encoded public key.
    #[arg(long)]
    pubkey: String,
    #[arg(long)]
    amount: u64,
}

#[derive(Args)]
struct DecryptArgs {
    /// Hex-encoded secret key.
    #[arg(long)]
    secret: String,
    /// Hex-encoded wire ciphertext.
    #[arg(long)]
    ciphertext: String,
    /// Largest amount the search will try.
    #[arg(long, default_value_t = DEFAULT_DECRYPT_BOUND)]
    bound: u64,
}

#[derive(Args)]
struct InspectArgs {
    /// Hex-encoded wire ciphertext.
    #[arg(long)]
    ciphertext: String,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AccountArgs {
    /// JSON file holding the account snapshots.
    #[arg(long, default_value = DEFAULT_STATE_PATH)]
    state: PathBuf,
    #[arg(long)]
    address: String,
    #[arg(long, default_value = DEFAULT_DENOM)]
    denom: String,
}

#[derive(Args)]
struct CreditArgs {
    #[command(flatten)]
    account: AccountArgs,
    /// Hex-encoded wire ciphertext of the incoming amount.
    #[arg(long)]
    ciphertext: String,
}

#[derive(Args)]
struct ApplyArgs {
    #[command(flatten)]
    account: AccountArgs,
    /// Decryptable available balance hint, passed through verbatim.
    #[arg(long, default_value = "")]
    hint: String,
    /// Secret key used to report the new available balance.
    #[arg(long)]
    secret: Option<String>,
    /// Print the protobuf encoding (hex) instead of JSON.
    #[arg(long)]
    proto: bool,
}

#[derive(Serialize)]
struct KeygenOutput {
    secret: String,
    pubkey: String,
}

#[derive(Serialize)]
struct InspectOutput {
    commitment: String,
    handle: String,
    is_zero: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ctb_balance_state=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config);

    match cli.command {
        Commands::Keygen(args) => keygen(args),
        Commands::Encrypt(args) => encrypt(args),
        Commands::Decrypt(args) => decrypt(args),
        Commands::Inspect(args) => inspect(args),
        Commands::Credit(args) => credit(args, &config),
        Commands::Apply(args) => apply(args, &config),
    }
}

fn load_config(args: &ConfigArgs) -> BalanceStateConfig {
    let mut config = BalanceStateConfig::from_env();
    if let Some(limit) = args.max_pending_credits {
        config.max_pending_credits = limit;
    }
    if let Some(attempts) = args.max_apply_attempts {
        config.max_apply_attempts = attempts;
    }
    tracing::debug!(?config, "balance state config");
    config
}

fn keygen(args: KeygenArgs) -> Result<()> {
    let keypair = match args.seed {
        Some(seed) => ElGamalKeypair::from_seed(seed.as_bytes()).context("derive keypair from seed")?,
        None => ElGamalKeypair::new_rand(&mut OsRng),
    };

    let output = KeygenOutput {
        secret: hex::encode(keypair.secret.to_bytes()),
        pubkey: keypair.public.to_hex(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("secret: {}", output.secret);
        println!("pubkey: {}", output.pubkey);
    }
    Ok(())
}

fn encrypt(args: EncryptArgs) -> Result<()> {
    let pubkey = ElGamalPubkey::from_hex(&args.pubkey).context("parse pubkey")?;
    let ciphertext = pubkey.encrypt(args.amount, &mut OsRng);
    println!("{}", codec::encode(&ciphertext));
    Ok(())
}

fn decrypt(args: DecryptArgs) -> Result<()> {
    let secret = ElGamalSecretKey::from_hex(&args.secret).context("parse secret key")?;
    let ciphertext = parse_ciphertext(&args.ciphertext)?;

    match secret.decrypt_u64(&ciphertext, args.bound) {
        Some(amount) => println!("{amount}"),
        None => bail!("amount exceeds search bound {}", args.bound),
    }
    Ok(())
}

fn inspect(args: InspectArgs) -> Result<()> {
    let ciphertext = parse_ciphertext(&args.ciphertext)?;
    let output = InspectOutput {
        commitment: hex::encode(ciphertext.commitment_bytes()),
        handle: hex::encode(ciphertext.handle_bytes()),
        is_zero: ciphertext.is_zero(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("commitment: {}", output.commitment);
        println!("handle:     {}", output.handle);
        println!("zero:       {}", output.is_zero);
    }
    Ok(())
}

fn credit(args: CreditArgs, config: &BalanceStateConfig) -> Result<()> {
    let account = &args.account;
    warn_on_unrecognized_address(&account.address);

    let incoming = parse_ciphertext(&args.ciphertext)?;
    let ledger = load_ledger(&account.state)?;
    let state = ledger.credit(&account.address, &account.denom, &incoming, config)?;
    save_ledger(&account.state, &ledger)?;

    tracing::info!(
        account = %truncate_address(&account.address, DEFAULT_ACCOUNT_HRP),
        denom = %account.denom,
        pending_credits = state.pending_credit_count,
        "credited"
    );
    Ok(())
}

fn apply(args: ApplyArgs, config: &BalanceStateConfig) -> Result<()> {
    let account = &args.account;
    warn_on_unrecognized_address(&account.address);

    let secret = args
        .secret
        .as_deref()
        .map(ElGamalSecretKey::from_hex)
        .transpose()
        .context("parse secret key")?;

    let ledger = load_ledger(&account.state)?;
    let applied = apply_with_retry(&ledger, &account.address, &account.denom, config, |snapshot| {
        ApplyPendingBalance::for_account(snapshot, args.hint.clone())
    })?;
    save_ledger(&account.state, &ledger)?;

    if let Some(secret) = secret {
        match secret.decrypt_u64(&applied.state_next.available_balance, DEFAULT_DECRYPT_BOUND) {
            Some(amount) => tracing::info!(amount, "new available balance"),
            None => tracing::warn!("new available balance exceeds search bound"),
        }
    }

    if args.proto {
        println!("{}", hex::encode(applied.request.encode_proto()));
    } else {
        println!("{}", serde_json::to_string_pretty(&to_message(&applied.request))?);
    }
    Ok(())
}

fn parse_ciphertext(s: &str) -> Result<ElGamalCiphertext> {
    let wire = WireCiphertext::from_hex(s.trim()).context("ciphertext is not hex")?;
    codec::decode(wire.as_bytes()).context("decode ciphertext")
}

fn warn_on_unrecognized_address(address: &str) {
    if !is_valid_account_address(address, DEFAULT_ACCOUNT_HRP) {
        tracing::warn!(address, hrp = DEFAULT_ACCOUNT_HRP, "address is not a recognized bech32 account");
    }
}

fn load_ledger(path: &Path) -> Result<Ledger> {
    if !path.exists() {
        return Ok(Ledger::new());
    }
    let data = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let accounts: Vec<AccountBalanceState<ElGamalCiphertext>> =
        serde_json::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Ledger::with_accounts(accounts))
}

fn save_ledger(path: &Path, ledger: &Ledger) -> Result<()> {
    let data = serde_json::to_string_pretty(&ledger.accounts())?;
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ciphertext_accepts_prefixed_and_bare_hex() {
        let zero = "00".repeat(64);
        let bare = parse_ciphertext(&zero).unwrap();
        let prefixed = parse_ciphertext(&format!(" 0x{zero}\n")).unwrap();
        assert!(bare.is_zero());
        assert_eq!(bare, prefixed);
    }

    #[test]
    fn short_ciphertext_is_rejected() {
        assert!(parse_ciphertext(&"00".repeat(63)).is_err());
        assert!(parse_ciphertext("0xnothex").is_err());
    }
}
