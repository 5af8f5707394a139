use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::stats::DashboardStats;
use crate::models::transaction::Transaction;
use crate::models::user::UserProfile;
use crate::services::aggregation_service::AggregationService;

/// Currency symbol printed in front of every amount.
pub const CURRENCY_SYMBOL: &str = "৳";

const REPORT_TITLE: &str = "POCKET LEDGER";
const REPORT_SUBTITLE: &str = "WALLET STATEMENT";
const COLUMNS: [&str; 5] = ["DATE", "ITEM DESCRIPTION", "METHOD", "TYPE", "TOTAL"];
const DESCRIPTION_WIDTH: usize = 32;

/// Builds the exported statement: a fixed header block followed by one
/// row per transaction.
#[derive(Debug)]
pub struct ReportService {
    aggregation: AggregationService,
}

impl ReportService {
    pub fn new() -> Self {
        Self {
            aggregation: AggregationService::new(),
        }
    }

    /// `Wallet_Report_<display name>.<ext>`, whitespace runs replaced by `_`.
    pub fn filename(&self, profile: &UserProfile, ext: &str) -> String {
        let name = profile.name.split_whitespace().collect::<Vec<_>>().join("_");
        let name = if name.is_empty() { "User".to_string() } else { name };
        format!("Wallet_Report_{name}.{ext}")
    }

    /// `৳1234.50`
    pub fn format_amount(amount: f64) -> String {
        format!("{CURRENCY_SYMBOL}{amount:.2}")
    }

    /// One row of cells in column order.
    fn row(tx: &Transaction) -> [String; 5] {
        [
            tx.date.format("%Y-%m-%d").to_string(),
            tx.description.clone(),
            tx.method.to_string(),
            tx.kind.to_string(),
            Self::format_amount(tx.amount),
        ]
    }

    /// Plain-text statement.
    pub fn render_text(
        &self,
        profile: &UserProfile,
        txs: &[Transaction],
        generated_on: NaiveDate,
    ) -> String {
        let mut out = String::new();
        let rule = "=".repeat(84);

        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("{REPORT_TITLE:<50}{:>34}\n", format!("User: {}", profile.name)));
        out.push_str(&format!("{REPORT_SUBTITLE:<50}{:>34}\n", format!("Date: {generated_on}")));
        out.push_str(&rule);
        out.push_str("\n\n");

        out.push_str(&format!(
            "{:<10}  {:<w$}  {:<6}  {:<7}  {:>16}\n",
            COLUMNS[0],
            COLUMNS[1],
            COLUMNS[2],
            COLUMNS[3],
            COLUMNS[4],
            w = DESCRIPTION_WIDTH
        ));
        out.push_str(&"-".repeat(84));
        out.push('\n');

        for tx in txs {
            let [date, description, method, kind, total] = Self::row(tx);
            out.push_str(&format!(
                "{date:<10}  {:<w$}  {method:<6}  {kind:<7}  {total:>16}\n",
                truncate(&description, DESCRIPTION_WIDTH),
                w = DESCRIPTION_WIDTH
            ));
        }

        let DashboardStats {
            total_balance,
            total_income,
            total_expenses,
        } = self.aggregation.dashboard(txs);
        out.push_str(&"-".repeat(84));
        out.push('\n');
        for (label, value) in [
            ("Total income", total_income),
            ("Total expenses", total_expenses),
            ("Net balance", total_balance),
        ] {
            out.push_str(&format!("{label:<66}{:>18}\n", Self::format_amount(value)));
        }
        out
    }

    /// CSV with the same columns as the text statement.
    pub fn render_csv(&self, txs: &[Transaction]) -> Result<String, CoreError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(COLUMNS)?;
        for tx in txs {
            wtr.write_record(Self::row(tx))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| CoreError::Serialization(format!("Failed to finish CSV: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| CoreError::Serialization(format!("CSV is not valid UTF-8: {e}")))
    }
}

impl Default for ReportService {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut to `max` characters, marking the cut with `…`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
