//! Line commands driving the funnel.

use crate::error::AppResult;
use funnel_core::{AdvanceOutcome, Field, FieldValue, StepId, StepSequencer};
use std::str::FromStr;

pub const HELP: &str = "\
Commands:
  set <field> <value>   assign a field (e.g. set email maria@example.com)
  province <id>         select a province and load its cities
  next                  validate and continue
  back                  previous step
  confirm               check email verification
  resend                resend the verification email
  jump <step>           return to an earlier step
  show                  print the funnel state
  help                  this text
  quit                  exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set { field: Field, value: FieldValue },
    Province(String),
    Next,
    Back,
    Confirm,
    Resend,
    Jump(StepId),
    Show,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));

        match verb.to_lowercase().as_str() {
            "set" => {
                let (name, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(name, value)| (name, value.trim()))
                    .unwrap_or((rest, ""));
                let field: Field = name.parse()?;
                let value = match field {
                    Field::MarketingOptIn => FieldValue::Flag(parse_flag(value)?),
                    _ => FieldValue::Text(value.to_string()),
                };
                Ok(Command::Set { field, value })
            }
            "province" if !rest.is_empty() => Ok(Command::Province(rest.to_string())),
            "province" => Err("Usage: province <id>".into()),
            "next" => Ok(Command::Next),
            "back" => Ok(Command::Back),
            "confirm" => Ok(Command::Confirm),
            "resend" => Ok(Command::Resend),
            "jump" => Ok(Command::Jump(rest.parse()?)),
            "show" => Ok(Command::Show),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" | "" => Ok(false),
        other => Err(format!("Not a yes/no value: {}", other)),
    }
}

/// Run one command and render its result.
pub async fn execute(sequencer: &StepSequencer, command: Command) -> AppResult<String> {
    let output = match command {
        Command::Set { field, value } => {
            sequencer.set_field(field, value).await;
            format!("{} updated", field)
        }
        Command::Province(id) => {
            sequencer.select_province(&id).await;
            let snapshot = sequencer.snapshot().await;
            let cities = snapshot.catalog.cities(&id).unwrap_or_default();
            let names: Vec<_> = cities.iter().map(|c| format!("{} ({})", c.name, c.id)).collect();
            format!("Cities: {}", names.join(", "))
        }
        Command::Next => match sequencer.advance().await? {
            AdvanceOutcome::Advanced { from, to } => format!("{} -> {}", from, to),
            AdvanceOutcome::Blocked { errors } => errors
                .iter()
                .map(|(field, message)| format!("{}: {}", field, message))
                .collect::<Vec<_>>()
                .join("\n"),
            AdvanceOutcome::Submitted(outcome) => serde_json::to_string_pretty(&outcome)?,
        },
        Command::Back => format!("Now on {}", sequencer.retreat().await?),
        Command::Confirm => serde_json::to_string(&sequencer.confirm_verification().await?)?,
        Command::Resend => serde_json::to_string(&sequencer.resend_verification().await?)?,
        Command::Jump(step) => format!("Now on {}", sequencer.jump_to(step).await?),
        Command::Show => serde_json::to_string_pretty(&sequencer.snapshot().await)?,
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(output)
}
