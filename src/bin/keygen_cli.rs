//! One-shot command runner over a JSON key ledger.

use anyhow::{Context, anyhow};
use dna_keygen::{
    about, init_logging,
    keygen_shell::{execute_shell_command, parse_shell_tokens, shell_help_text},
    ledger::KeyLedger,
    session::KeygenSession,
};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use std::env;

const DEFAULT_LEDGER_PATH: &str = ".keygen_ledger.json";

#[derive(Debug)]
struct CliArgs {
    ledger_path: String,
    config_path: Option<String>,
    seed: Option<u64>,
    debug: bool,
    command: Vec<String>,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
keygen_cli --version\n  \
keygen_cli [--ledger PATH] [--config PATH] [--seed N] [--debug] <command>\n\n\
{}",
        shell_help_text()
    );
}

fn parse_cli_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs {
        ledger_path: DEFAULT_LEDGER_PATH.to_string(),
        config_path: None,
        seed: None,
        debug: false,
        command: vec![],
    };
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--ledger" | "--config" | "--seed" => {
                let flag = args[idx].as_str();
                let value = args
                    .get(idx + 1)
                    .ok_or_else(|| format!("Missing value after {flag}"))?;
                match flag {
                    "--ledger" => parsed.ledger_path = value.clone(),
                    "--config" => parsed.config_path = Some(value.clone()),
                    _ => {
                        parsed.seed = Some(
                            value
                                .parse()
                                .map_err(|_| format!("Invalid seed '{value}'"))?,
                        )
                    }
                }
                idx += 2;
            }
            "--debug" => {
                parsed.debug = true;
                idx += 1;
            }
            _ => {
                parsed.command = args[idx..].to_vec();
                break;
            }
        }
    }
    if parsed.command.is_empty() {
        return Err("Missing command".to_string());
    }
    Ok(parsed)
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    let cli = parse_cli_args(&args).map_err(|e| {
        usage();
        anyhow!(e)
    })?;
    init_logging();

    let mut session = match &cli.config_path {
        Some(path) => KeygenSession::load_from_path(path)?,
        None => KeygenSession::default(),
    };
    session.settings.debug |= cli.debug;

    let mut ledger = KeyLedger::load_or_default(&cli.ledger_path)?;
    let command = parse_shell_tokens(&cli.command).map_err(|e| anyhow!(e))?;
    let mut rng: Box<dyn RngCore> = match cli.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::rng()),
    };

    let result = execute_shell_command(&mut session, &mut ledger, &command, rng.as_mut())
        .map_err(|e| anyhow!(e))?;
    if result.ledger_changed {
        ledger.save_to_path(&cli.ledger_path)?;
    }
    let text = serde_json::to_string_pretty(&result.output)
        .context("Could not serialize JSON output")?;
    println!("{text}");
    match result.error {
        Some(message) => Err(anyhow!(message)),
        None => Ok(()),
    }
}
