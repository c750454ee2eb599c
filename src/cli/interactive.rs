//! Line-driven converter session.
//!
//! Rates are fetched once when the session starts. Each line of input changes
//! the amount or one of the currencies, and the result is recomputed at once
//! against the most recently published snapshot.

use super::ui;
use crate::core::{
    ConversionRequest, ConversionResult, CurrencyCode, RateProvider, RateSession, RateSnapshot,
    RatesState,
};
use anyhow::{Result, anyhow, bail};
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const HELP: &str = "\
Commands:
  <amount> <FROM> <TO>   convert, e.g. `10 EUR USD`
  amount <x>             change the amount
  from <CODE>            change the source currency
  to <CODE>              change the target currency
  swap                   swap source and target
  show                   show the current conversion
  rates                  list the loaded rates
  refresh                fetch rates again
  help                   show this help
  quit                   leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum InputCommand {
    Amount(f64),
    From(CurrencyCode),
    To(CurrencyCode),
    Set(ConversionRequest),
    Swap,
    Show,
    Rates,
    Refresh,
    Help,
    Quit,
}

fn parse_amount(s: &str) -> Result<f64> {
    let amount: f64 = s
        .parse()
        .map_err(|_| anyhow!("Amount must be a number: {}", s))?;
    if !amount.is_finite() || amount < 0.0 {
        bail!("Amount must be a non-negative number: {}", s);
    }
    Ok(amount)
}

impl FromStr for InputCommand {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = s.split_whitespace().collect();
        match words.as_slice() {
            [cmd] => match cmd.to_lowercase().as_str() {
                "swap" => Ok(InputCommand::Swap),
                "show" => Ok(InputCommand::Show),
                "rates" => Ok(InputCommand::Rates),
                "refresh" => Ok(InputCommand::Refresh),
                "help" | "?" => Ok(InputCommand::Help),
                "quit" | "exit" | "q" => Ok(InputCommand::Quit),
                other if other.parse::<f64>().is_ok() => {
                    parse_amount(cmd).map(InputCommand::Amount)
                }
                _ => Err(anyhow!("Unknown command: {}", s)),
            },
            [cmd, value] => match cmd.to_lowercase().as_str() {
                "amount" => parse_amount(value).map(InputCommand::Amount),
                "from" => value.parse().map(InputCommand::From),
                "to" => value.parse().map(InputCommand::To),
                _ => Err(anyhow!("Unknown command: {}", s)),
            },
            [amount, from, to] => Ok(InputCommand::Set(ConversionRequest::new(
                parse_amount(amount)?,
                from.parse()?,
                to.parse()?,
            ))),
            _ => Err(anyhow!("Unknown command: {}", s)),
        }
    }
}

impl InputCommand {
    /// Applies an input change. Returns `false` for commands that leave the
    /// request untouched.
    pub fn apply(&self, request: &mut ConversionRequest) -> bool {
        match self {
            InputCommand::Amount(amount) => request.amount = *amount,
            InputCommand::From(code) => request.source = code.clone(),
            InputCommand::To(code) => request.target = code.clone(),
            InputCommand::Set(new_request) => *request = new_request.clone(),
            InputCommand::Swap => *request = request.swapped(),
            _ => return false,
        }
        true
    }
}

/// One line summary of a conversion. Undefined results never show a number.
pub fn render_line(
    request: &ConversionRequest,
    result: &ConversionResult,
    snapshot: Option<&RateSnapshot>,
) -> String {
    match result {
        Ok(value) => {
            let date = snapshot.map_or(String::new(), |s| format!(" (rates of {})", s.date));
            format!(
                "{} {} = {} {}{}",
                request.amount,
                request.source,
                ui::style_text(&ui::format_amount(*value), ui::StyleType::Value),
                request.target,
                ui::style_text(&date, ui::StyleType::Subtle)
            )
        }
        Err(reason) => format!(
            "{} {} = -- {} {}",
            request.amount,
            request.source,
            request.target,
            ui::style_text(&format!("({reason})"), ui::StyleType::Error)
        ),
    }
}

async fn refresh<W: Write>(
    session: &RateSession,
    provider: &(dyn RateProvider + Send + Sync),
    output: &mut W,
) -> Result<()> {
    match session.refresh(provider).await {
        Ok(RatesState::Loaded { date, currencies }) => {
            writeln!(output, "Loaded {currencies} exchange rates for {date}")?
        }
        Ok(RatesState::NotLoaded) => writeln!(
            output,
            "{}",
            ui::style_text("Provider returned no exchange rates", ui::StyleType::Error)
        )?,
        Err(e) => writeln!(
            output,
            "{}",
            ui::style_text(
                &format!("Could not fetch exchange rates: {e}"),
                ui::StyleType::Error
            )
        )?,
    }
    Ok(())
}

pub async fn run<R, W>(
    session: &RateSession,
    provider: &(dyn RateProvider + Send + Sync),
    mut request: ConversionRequest,
    input: R,
    output: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        output,
        "{}",
        ui::style_text("Type `help` for a list of commands.", ui::StyleType::Subtle)
    )?;
    refresh(session, provider, output).await?;
    writeln!(
        output,
        "{}",
        render_line(&request, &session.evaluate(&request), session.snapshot().as_deref())
    )?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match line.parse::<InputCommand>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "{}", ui::style_text(&e.to_string(), ui::StyleType::Error))?;
                continue;
            }
        };

        match &command {
            InputCommand::Quit => break,
            InputCommand::Help => {
                writeln!(output, "{HELP}")?;
                continue;
            }
            InputCommand::Rates => {
                match session.snapshot() {
                    Some(snapshot) if !snapshot.table.is_empty() => {
                        writeln!(output, "{}", snapshot.display_as_table())?
                    }
                    _ => writeln!(output, "Exchange rates are not loaded. Try `refresh`.")?,
                }
                continue;
            }
            InputCommand::Refresh => refresh(session, provider, output).await?,
            _ => {
                command.apply(&mut request);
            }
        }

        writeln!(
            output,
            "{}",
            render_line(&request, &session.evaluate(&request), session.snapshot().as_deref())
        )?;
        output.flush()?;
    }
    Ok(())
}
