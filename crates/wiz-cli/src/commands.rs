use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wiz_gate::{
    ApprovalValidator, Decision, RejectCause, SignatureTemplate, SignatureValidator, StateChange,
};
use wiz_ledger::{
    InMemoryLedger, LedgerConfig, LedgerReader, LedgerWriter, MembershipDeployment,
};
use wiz_types::{Address, Amount, AppId, AssetId, GlobalState, LedgerSnapshot, TransactionGroup};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Evaluate(args) => cmd_evaluate(args, &cli.format),
        Command::Demo(args) => cmd_demo(args, &cli.format),
        Command::Config(args) => cmd_config(args, &cli.format),
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<LedgerConfig> {
    let Some(path) = path else {
        return Ok(LedgerConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    LedgerConfig::from_toml_str(&raw).with_context(|| format!("loading {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// evaluate
// ---------------------------------------------------------------------------

fn evaluate(args: &EvaluateArgs) -> anyhow::Result<Decision> {
    let config = load_config(args.config.as_deref())?;
    let group: TransactionGroup = load_json(&args.group)?;
    let view = match &args.view {
        Some(path) => load_json(path)?,
        None => LedgerSnapshot::new(),
    };

    let decision = match &args.template {
        Some(path) => {
            let template: SignatureTemplate = load_json(path)?;
            let accounts = group
                .application_call(0)
                .ok()
                .map(|call| call.referenced_accounts.clone())
                .unwrap_or_default();
            SignatureValidator::with_terms(template, config.terms)
                .evaluate(&group, &accounts, &view)
        }
        None => {
            let state = args
                .state
                .as_deref()
                .map(load_json::<GlobalState>)
                .transpose()?;
            ApprovalValidator::new(config.terms).evaluate(
                state.as_ref(),
                &group,
                args.caller,
                &view,
            )
        }
    };
    tracing::debug!(group = %args.group.display(), decision = %decision, "group evaluated");
    Ok(decision)
}

fn cmd_evaluate(args: EvaluateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let decision = evaluate(&args)?;
    if let OutputFormat::Json = format {
        return print_json(&decision);
    }

    match &decision {
        Decision::Approve {
            new_state,
            emitted_transfers,
        } => {
            println!("{} Approve", "✓".green().bold());
            match new_state {
                Some(StateChange::Create(state)) => println!(
                    "  State: manager {} tracking {}",
                    state.manager.short_id().cyan(),
                    state.tracked_asset_id.to_string().yellow()
                ),
                Some(StateChange::Destroy) => println!("  State: {}", "destroyed".red()),
                None => {}
            }
            for transfer in emitted_transfers {
                println!("  Emit: {}", transfer.to_string().yellow());
            }
        }
        Decision::Reject { cause } => {
            println!("{} Reject: {}", "✗".red().bold(), cause.to_string().red());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// demo
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct DemoReport {
    app_id: AppId,
    asset_id: AssetId,
    contract: Address,
    members: Vec<MemberReport>,
    /// Cause of rejecting a second join by the first member.
    repeat_join: Option<RejectCause>,
    relinquished: Amount,
    torn_down: bool,
}

#[derive(Debug, Serialize)]
struct MemberReport {
    address: Address,
    multisig: bool,
    holding: Option<Amount>,
}

fn demo_member(index: usize) -> (Address, bool) {
    if index % 2 == 1 {
        let owners = [
            Address::labeled(format!("signer-{index}-a")),
            Address::labeled(format!("signer-{index}-b")),
        ];
        (Address::multisig(1, 2, &owners), true)
    } else {
        (Address::labeled(format!("member-{index}")), false)
    }
}

fn run_demo(args: &DemoArgs) -> anyhow::Result<DemoReport> {
    let config = load_config(args.config.as_deref())?;
    let member_funds = config
        .terms
        .registration_amount
        .saturating_mul(2)
        .saturating_add(config.min_balance(1));
    let ledger = InMemoryLedger::new(config);

    let owner = Address::labeled("manager");
    ledger.fund(&owner, 10_000_000)?;
    let deployment = MembershipDeployment::deploy(&ledger, owner, args.supply)
        .context("deploying the membership contract")?;
    tracing::debug!(members = args.members, supply = args.supply, "running demo");

    let mut members = Vec::with_capacity(args.members);
    for index in 0..args.members {
        let (address, multisig) = demo_member(index);
        ledger.fund(&address, member_funds)?;
        deployment.register(&ledger, &address)?;
        deployment
            .join(&ledger, address)
            .with_context(|| format!("joining {}", address.short_id()))?;
        members.push(MemberReport {
            address,
            multisig,
            holding: ledger.asset_holding(&address, deployment.asset_id)?,
        });
    }

    let repeat_join = match members.first() {
        Some(first) => deployment
            .join(&ledger, first.address)
            .err()
            .and_then(|err| err.reject_cause()),
        None => None,
    };

    let relinquished = deployment
        .relinquish(&ledger)?
        .inner_transfers
        .first()
        .map(|transfer| transfer.amount)
        .unwrap_or(0);

    for member in &members {
        deployment.leave(&ledger, member.address)?;
    }
    let report = DemoReport {
        app_id: deployment.app_id,
        asset_id: deployment.asset_id,
        contract: deployment.contract,
        members,
        repeat_join,
        relinquished,
        torn_down: false,
    };
    deployment.teardown(&ledger)?;

    Ok(DemoReport {
        torn_down: true,
        ..report
    })
}

fn cmd_demo(args: DemoArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let report = run_demo(&args)?;
    if let OutputFormat::Json = format {
        return print_json(&report);
    }

    println!(
        "{} Deployed {} issuing {} from {}",
        "✓".green().bold(),
        report.app_id.to_string().bold(),
        report.asset_id.to_string().yellow(),
        report.contract.short_id().cyan()
    );
    for member in &report.members {
        let kind = if member.multisig { " (multisig)" } else { "" };
        println!(
            "  {} joined{} holding {}",
            member.address.short_id().cyan(),
            kind,
            member.holding.unwrap_or(0)
        );
    }
    if let Some(cause) = report.repeat_join {
        println!("  Repeat join: {}", cause.to_string().red());
    }
    println!("  Relinquished {} unissued tokens", report.relinquished.to_string().bold());
    if report.torn_down {
        println!("{} Torn down", "✓".green().bold());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config(args: ConfigArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.path.as_deref())?;
    if let OutputFormat::Json = format {
        return print_json(&config);
    }

    let source = args
        .path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".into());
    println!("Configuration ({})", source.dimmed());
    println!("  min_fee = {}", config.min_fee);
    println!("  base_min_balance = {}", config.base_min_balance);
    println!("  terms.registration_amount = {}", config.terms.registration_amount);
    println!("  terms.min_fee = {}", config.terms.min_fee);
    println!("  terms.join_fee_floor = {}", config.terms.join_fee_floor);
    println!("  terms.signature_fee_ceiling = {}", config.terms.signature_fee_ceiling);
    Ok(())
}
