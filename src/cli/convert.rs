use super::ui;
use crate::core::{
    ConversionRequest, ConversionResult, RateProvider, RateSession, RateSnapshot, convert,
};
use anyhow::Result;
use comfy_table::Cell;
use std::io::Write;

/// Renders a conversion and the rate date it was computed against.
pub fn render_conversion(
    request: &ConversionRequest,
    result: &ConversionResult,
    snapshot: Option<&RateSnapshot>,
) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Conversion"), ui::header_cell("Value")]);

    table.add_row(vec![
        Cell::new("Original amount"),
        Cell::new(format!("{} {}", request.amount, request.source)),
    ]);
    table.add_row(vec![
        Cell::new(format!("Converted amount ({})", request.target)),
        ui::result_cell(result),
    ]);

    if let Some(snapshot) = snapshot {
        if let Ok(rate) = convert(&snapshot.table, 1.0, &request.source, &request.target) {
            table.add_row(vec![
                Cell::new("Exchange rate"),
                Cell::new(format!(
                    "1 {} = {} {}",
                    request.source,
                    ui::format_rate(rate),
                    request.target
                )),
            ]);
        }
        table.add_row(vec![
            Cell::new("Exchange rate date"),
            Cell::new(snapshot.date.to_string()),
        ]);
    }

    let mut output = table.to_string();
    if let Err(reason) = result {
        output.push_str(&format!(
            "\n{}",
            ui::style_text(&format!("Conversion unavailable: {reason}"), ui::StyleType::Error)
        ));
    }
    output
}

pub async fn run<W: Write>(
    provider: &(dyn RateProvider + Send + Sync),
    request: &ConversionRequest,
    output: &mut W,
) -> Result<()> {
    let session = RateSession::new();

    let pb = ui::new_spinner("Fetching exchange rates...");
    let refreshed = session.refresh(provider).await;
    pb.finish_and_clear();
    refreshed?;

    let result = session.evaluate(request);
    let snapshot = session.snapshot();
    writeln!(output, "{}", render_conversion(request, &result, snapshot.as_deref()))?;
    Ok(())
}
