use super::ui;
use crate::core::{RateProvider, RateSession, RateSnapshot};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};
use std::io::Write;

impl RateSnapshot {
    pub fn display_as_table(&self) -> String {
        let anchor = self
            .base
            .as_ref()
            .map_or("anchor".to_string(), |b| b.to_string());

        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Currency"),
            ui::header_cell(&format!("Rate (per 1 {anchor})")),
        ]);

        for (code, rate) in self.table.iter() {
            table.add_row(vec![
                Cell::new(code),
                Cell::new(ui::format_rate(rate)).set_alignment(CellAlignment::Right),
            ]);
        }

        let mut output = format!(
            "Exchange rates: {}\n\n",
            ui::style_text(&self.date.to_string(), ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\n{}",
            ui::style_text(
                &format!("{} currencies", self.table.len()),
                ui::StyleType::Subtle
            )
        ));
        output
    }
}

pub async fn run<W: Write>(
    provider: &(dyn RateProvider + Send + Sync),
    output: &mut W,
) -> Result<()> {
    let session = RateSession::new();

    let pb = ui::new_spinner("Fetching exchange rates...");
    let refreshed = session.refresh(provider).await;
    pb.finish_and_clear();
    refreshed?;

    match session.snapshot() {
        Some(snapshot) => writeln!(output, "{}", snapshot.display_as_table())?,
        None => writeln!(output, "No exchange rates available.")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CurrencyCode, RateTable};
    use chrono::NaiveDate;

    fn strip(output: String) -> String {
        console::strip_ansi_codes(&output).into_owned()
    }

    fn code(s: &str) -> CurrencyCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_display_lists_every_currency() {
        let snapshot = RateSnapshot {
            table: RateTable::new([(code("USD"), 1.0866), (code("EUR"), 1.0), (code("JPY"), 169.33)])
                .unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            base: Some(code("EUR")),
        };

        let output = strip(snapshot.display_as_table());
        assert!(output.contains("2024-05-17"));
        assert!(output.contains("Rate (per 1 EUR)"));
        assert!(output.contains("1.0866"));
        assert!(output.contains("169.3300"));
        assert!(output.contains("3 currencies"));

        let jpy = output.find("JPY").unwrap();
        let usd = output.find("USD").unwrap();
        assert!(jpy < usd, "currencies should be listed alphabetically");
    }

    #[test]
    fn test_display_keeps_tiny_rates_visible() {
        let snapshot = RateSnapshot {
            table: RateTable::new([(code("EUR"), 1.0), (code("XAU"), 0.0004)]).unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 5, 17).unwrap(),
            base: Some(code("EUR")),
        };

        let output = strip(snapshot.display_as_table());
        assert!(output.contains("0.0004000"));
        assert!(output.contains("1.0000"));
    }
}
