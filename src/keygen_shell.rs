use crate::{
    candidate::BaseSource,
    ledger::KeyLedger,
    parameters::{PARAMETER_NAMES, parse_flag},
    session::KeygenSession,
};
use keygen_protocol::KeySpace;
use serde_json::{Value, json};

pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Summary,
    Settings,
    Debug { enabled: Option<bool> },
    Distance { value: usize },
    Set { name: String, value: String },
    Generate { space: KeySpace, count: usize },
    Validate { key: String },
    Retrieve { space: KeySpace },
    SaveConfig { path: String },
    Link { codec_id: u64, vendor_id: u64 },
}

#[derive(Debug, Clone)]
pub struct ShellRunResult {
    pub ledger_changed: bool,
    pub output: Value,
    /// Set when the command stopped partway; `output` still describes what
    /// was done and the ledger must still be saved if it changed.
    pub error: Option<String>,
}

impl ShellCommand {
    pub fn preview(&self) -> String {
        match self {
            Self::Help => "show shell command help".to_string(),
            Self::Summary => "count issued keys per key space".to_string(),
            Self::Settings => "show session settings and constraint parameters".to_string(),
            Self::Debug { enabled: None } => "toggle debug tracing".to_string(),
            Self::Debug {
                enabled: Some(enabled),
            } => format!("set debug tracing to {enabled}"),
            Self::Distance { value } => format!("set minimum edit distance to {value}"),
            Self::Set { name, value } => format!("set parameter '{name}' to '{value}'"),
            Self::Generate { space, count } => format!("generate {count} {space} key(s)"),
            Self::Validate { key } => format!("validate key '{key}'"),
            Self::Retrieve { space } => format!("list issued {space} keys"),
            Self::SaveConfig { path } => format!("write session config to '{path}'"),
            Self::Link {
                codec_id,
                vendor_id,
            } => format!("link codec #{codec_id} to vendor #{vendor_id}"),
        }
    }
}

pub fn shell_help_text() -> String {
    format!(
        "Key generator commands:\n\
help\n\
summary\n\
settings\n\
debug [on|off]\n\
distance N\n\
set NAME VALUE\n\
gen vendor|codec [COUNT]\n\
validate KEY\n\
retrieve vendor|codec\n\
save-config PATH\n\
link CODEC_ID VENDOR_ID\n\
NAME is one of: {}",
        PARAMETER_NAMES.join(", ")
    )
}

fn token_error(command: &str) -> String {
    format!("Invalid '{command}' usage. Try: help")
}

fn parse_space(raw: &str) -> Result<KeySpace, String> {
    raw.parse()
}

fn parse_count(raw: &str) -> Result<usize, String> {
    raw.parse::<usize>()
        .map_err(|_| format!("Expected a non-negative number, got '{raw}'"))
}

fn parse_id(raw: &str) -> Result<u64, String> {
    raw.parse::<u64>()
        .map_err(|_| format!("Expected a record id, got '{raw}'"))
}

pub fn parse_shell_tokens(tokens: &[String]) -> Result<ShellCommand, String> {
    if tokens.is_empty() {
        return Err("Missing shell command".to_string());
    }
    let cmd = tokens[0].as_str();
    match cmd {
        "help" | "?" | "-h" | "--help" => Ok(ShellCommand::Help),
        "summary" | "state-summary" => {
            if tokens.len() == 1 {
                Ok(ShellCommand::Summary)
            } else {
                Err(token_error(cmd))
            }
        }
        "settings" => {
            if tokens.len() == 1 {
                Ok(ShellCommand::Settings)
            } else {
                Err(token_error(cmd))
            }
        }
        "debug" => match tokens.len() {
            1 => Ok(ShellCommand::Debug { enabled: None }),
            2 => parse_flag(&tokens[1])
                .map(|enabled| ShellCommand::Debug {
                    enabled: Some(enabled),
                })
                .ok_or_else(|| format!("Expected on or off, got '{}'", tokens[1])),
            _ => Err(token_error(cmd)),
        },
        "distance" => {
            if tokens.len() == 2 {
                Ok(ShellCommand::Distance {
                    value: parse_count(&tokens[1])?,
                })
            } else {
                Err(token_error(cmd))
            }
        }
        "set" => {
            if tokens.len() == 3 {
                Ok(ShellCommand::Set {
                    name: tokens[1].clone(),
                    value: tokens[2].clone(),
                })
            } else {
                Err(token_error(cmd))
            }
        }
        "gen" | "generate" => {
            if tokens.len() < 2 || tokens.len() > 3 {
                return Err(token_error(cmd));
            }
            let count = match tokens.get(2) {
                Some(raw) => parse_count(raw)?,
                None => DEFAULT_BATCH_SIZE,
            };
            Ok(ShellCommand::Generate {
                space: parse_space(&tokens[1])?,
                count,
            })
        }
        "validate" | "check" => {
            if tokens.len() == 2 {
                Ok(ShellCommand::Validate {
                    key: tokens[1].clone(),
                })
            } else {
                Err(token_error(cmd))
            }
        }
        "retrieve" | "list" => {
            if tokens.len() == 2 {
                Ok(ShellCommand::Retrieve {
                    space: parse_space(&tokens[1])?,
                })
            } else {
                Err(token_error(cmd))
            }
        }
        "save-config" => {
            if tokens.len() == 2 {
                Ok(ShellCommand::SaveConfig {
                    path: tokens[1].clone(),
                })
            } else {
                Err(token_error(cmd))
            }
        }
        "link" => {
            if tokens.len() == 3 {
                Ok(ShellCommand::Link {
                    codec_id: parse_id(&tokens[1])?,
                    vendor_id: parse_id(&tokens[2])?,
                })
            } else {
                Err(token_error(cmd))
            }
        }
        other => Err(format!("Unknown shell command '{other}'. Try: help")),
    }
}

pub fn parse_shell_line(line: &str) -> Result<ShellCommand, String> {
    let tokens = split_shell_words(line)?;
    parse_shell_tokens(&tokens)
}

/// Splits on whitespace. A single- or double-quoted run is taken literally,
/// so paths with spaces survive; there are no escapes.
pub fn split_shell_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut word: Option<String> = None;
    let mut quote: Option<char> = None;
    for ch in line.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => word.get_or_insert_default().push(ch),
            None if ch == '\'' || ch == '"' => {
                quote = Some(ch);
                word.get_or_insert_default();
            }
            None if ch.is_whitespace() => words.extend(word.take()),
            None => word.get_or_insert_default().push(ch),
        }
    }
    if quote.is_some() {
        return Err("Unterminated quoted string in shell command".to_string());
    }
    words.extend(word);
    if words.is_empty() {
        return Err("Empty shell command".to_string());
    }
    Ok(words)
}

fn to_json<T: serde::Serialize>(value: &T, what: &str) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| format!("Could not serialize {what}: {e}"))
}

pub fn execute_shell_command<S: BaseSource + ?Sized>(
    session: &mut KeygenSession,
    ledger: &mut KeyLedger,
    command: &ShellCommand,
    source: &mut S,
) -> Result<ShellRunResult, String> {
    let output = match command {
        ShellCommand::Help => json!({ "help": shell_help_text() }),
        ShellCommand::Summary => to_json(&ledger.summary(), "ledger summary")?,
        ShellCommand::Settings => to_json(&*session, "settings")?,
        ShellCommand::Debug { enabled } => {
            session.settings.debug = enabled.unwrap_or(!session.settings.debug);
            json!({ "debug": session.settings.debug })
        }
        ShellCommand::Distance { value } => {
            session.settings.min_edit_distance = *value;
            json!({ "min_edit_distance": value })
        }
        ShellCommand::Set { name, value } => {
            session
                .parameters
                .set(name, value)
                .map_err(|e| e.to_string())?;
            json!({ "parameters": to_json(&session.parameters, "parameters")? })
        }
        ShellCommand::Generate { space, count } => {
            let batch = session.issue_keys(ledger, *space, *count, source);
            let mut output = json!({ "issued": to_json(&batch.issued, "issued keys")? });
            let error = batch.error.map(|e| e.to_string());
            if let Some(message) = &error {
                output["error"] = json!(message);
            }
            return Ok(ShellRunResult {
                ledger_changed: !batch.issued.is_empty(),
                output,
                error,
            });
        }
        ShellCommand::Validate { key } => {
            let check = session.check_key(ledger, key).map_err(|e| e.to_string())?;
            to_json(&check, "key check")?
        }
        ShellCommand::Retrieve { space } => {
            let keys = ledger.corpus(*space);
            json!({ "space": space, "count": keys.len(), "keys": keys })
        }
        ShellCommand::Link {
            codec_id,
            vendor_id,
        } => {
            let record = ledger
                .link_codec(*codec_id, *vendor_id)
                .map_err(|e| e.to_string())?;
            return Ok(ShellRunResult {
                ledger_changed: true,
                output: json!({ "codec": to_json(record, "codec record")? }),
                error: None,
            });
        }
        ShellCommand::SaveConfig { path } => {
            session.save_to_path(path).map_err(|e| e.to_string())?;
            json!({ "saved_config": path })
        }
    };
    Ok(ShellRunResult {
        ledger_changed: false,
        output,
        error: None,
    })
}
