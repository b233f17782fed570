//! Interactive key generator shell over a JSON key ledger.

use dna_keygen::{
    about, init_logging,
    keygen_shell::{execute_shell_command, parse_shell_line, shell_help_text},
    ledger::KeyLedger,
    session::KeygenSession,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::{env, error::Error};

const DEFAULT_LEDGER_PATH: &str = ".keygen_ledger.json";

#[derive(Debug, Default)]
struct CliArgs {
    show_help: bool,
    show_version: bool,
    ledger_path: Option<String>,
    config_path: Option<String>,
}

fn print_help() {
    println!(
        "Usage:\n  \
keygen_shell [--help|-h] [--version|-V]\n  \
keygen_shell [--config PATH] [LEDGER_PATH]\n\n  \
Issued keys are saved to LEDGER_PATH (default {DEFAULT_LEDGER_PATH}) after every generation."
    );
}

fn parse_cli_args(args: &[String]) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--help" | "-h" => {
                parsed.show_help = true;
                idx += 1;
            }
            "--version" | "-V" => {
                parsed.show_version = true;
                idx += 1;
            }
            "--config" => {
                if idx + 1 >= args.len() {
                    return Err("Missing PATH after --config".to_string());
                }
                parsed.config_path = Some(args[idx + 1].clone());
                idx += 2;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option '{arg}'"));
            }
            path => {
                if parsed.ledger_path.is_some() {
                    return Err(format!(
                        "Multiple ledger paths provided ('{}' and '{}')",
                        parsed.ledger_path.as_deref().unwrap_or_default(),
                        path
                    ));
                }
                parsed.ledger_path = Some(path.to_string());
                idx += 1;
            }
        }
    }
    Ok(parsed)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match parse_cli_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}");
            print_help();
            return Ok(());
        }
    };
    if cli.show_help {
        print_help();
        return Ok(());
    }
    if cli.show_version {
        println!("{}", about::version_cli_text());
        return Ok(());
    }
    init_logging();

    let ledger_path = cli
        .ledger_path
        .unwrap_or_else(|| DEFAULT_LEDGER_PATH.to_string());
    let mut ledger = KeyLedger::load_or_default(&ledger_path)?;
    let mut session = match &cli.config_path {
        Some(path) => KeygenSession::load_from_path(path)?,
        None => KeygenSession::default(),
    };
    let mut rng = rand::rng();

    let mut rl = DefaultEditor::new()?;
    println!("{}", shell_help_text());

    loop {
        match rl.readline("keygen> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if matches!(trimmed, "q" | "quit" | "exit") {
                    break;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_shell_line(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("Error: {e}");
                        continue;
                    }
                };
                log::debug!("{}", command.preview());
                match execute_shell_command(&mut session, &mut ledger, &command, &mut rng) {
                    Ok(result) => {
                        if result.ledger_changed {
                            ledger.save_to_path(&ledger_path)?;
                        }
                        println!("{}", serde_json::to_string_pretty(&result.output)?);
                        if let Some(message) = result.error {
                            println!("Error: {message}");
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {err}");
            }
        }
    }

    Ok(())
}
