//! Text rendering of an insight bundle.

use salescope_core::{Forecast, InsightBundle, ModelSpec, RankTable, UnavailableReason};
use std::fmt::Write;

fn model_label(model: ModelSpec) -> &'static str {
    match model {
        ModelSpec::Unavailable => "none",
        ModelSpec::Trend => "additive trend",
        ModelSpec::TrendSeasonal { .. } => "additive trend + 12-month seasonality",
    }
}

fn write_rank(out: &mut String, title: &str, table: &RankTable, limit: usize, shares: bool) {
    let _ = writeln!(out, "{title}:");
    if table.is_empty() {
        let _ = writeln!(out, "  (none)\n");
        return;
    }

    let grand: f64 = table.entries().iter().map(|e| e.total).sum();
    let width = table
        .entries()
        .iter()
        .take(limit)
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0);

    for e in table.entries().iter().take(limit) {
        let _ = write!(out, "  {:<width$}  {:>12.2}", e.label, e.total);
        if shares && grand != 0.0 {
            let _ = write!(out, "  ({:>5.1}%)", e.total / grand * 100.0);
        }
        out.push('\n');
    }
    if table.len() > limit {
        let _ = writeln!(out, "  ... {} more", table.len() - limit);
    }
    out.push('\n');
}

fn write_forecast(out: &mut String, forecast: &Forecast) {
    match forecast {
        Forecast::Available { model, points, .. } => {
            let _ = writeln!(out, "Forecast for Next 6 Months ({}):", model_label(*model));
            for p in points {
                let _ = writeln!(out, "  {}  {:>12.2}", p.month, p.value);
            }
        }
        Forecast::Unavailable { reason, .. } => match reason {
            UnavailableReason::InsufficientHistory { .. } => {
                let _ = writeln!(out, "Forecast: Not enough data (need at least 2 months).");
            }
            UnavailableReason::FitFailed { .. } => {
                let _ = writeln!(out, "Forecast: unavailable ({reason}).");
            }
        },
    }
}

/// Render the "Key Insights" report, showing at most `limit` rows per ranking.
pub fn render_report(bundle: &InsightBundle, limit: usize) -> String {
    let mut out = String::new();
    let stats = bundle.stats();

    let _ = writeln!(out, "--- Key Insights ---\n");
    let _ = writeln!(
        out,
        "Rows: {} read, {} processed ({} duplicates, {} bad dates, {} bad amounts)\n",
        stats.input_rows, stats.kept, stats.duplicates, stats.invalid_dates, stats.invalid_amounts
    );

    let _ = writeln!(out, "Monthly Sales:");
    if bundle.series().is_empty() {
        let _ = writeln!(out, "  (none)");
    }
    for p in bundle.series().points() {
        let _ = writeln!(out, "  {}  {:>12.2}", p.month, p.total);
    }
    out.push('\n');

    write_rank(&mut out, "Top Products", bundle.products(), limit, false);
    write_rank(&mut out, "Sales by Region", bundle.regions(), limit, true);
    write_rank(&mut out, "Top Customers", bundle.customers(), limit, false);
    write_forecast(&mut out, bundle.forecast());

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use salescope_core::{AnalysisOptions, RawRow, analyze, analyze_rows};
    use salescope_ingest::sample_table;

    #[test]
    fn test_sample_report_sections() {
        let bundle = analyze(&sample_table().unwrap(), &AnalysisOptions::default()).unwrap();
        let text = render_report(&bundle, 3);

        assert!(text.starts_with("--- Key Insights ---"));
        assert!(text.contains("Rows: 36 read, 36 processed"));
        assert!(text.contains("  2023-01       2950.00"));
        assert!(text.contains("Top Products:\n  Product C"));
        assert!(text.contains("  ... 2 more"));
        assert!(text.contains("%)"));
        assert!(text.contains("Forecast for Next 6 Months (additive trend):"));
        assert!(text.contains("  2024-06"));
    }

    #[test]
    fn test_short_history_message() {
        let rows = vec![RawRow::new("2023-05-01", "10", "A", "North", "1")];
        let bundle = analyze_rows(&rows, &AnalysisOptions::default()).unwrap();
        let text = render_report(&bundle, 10);
        assert!(text.contains("Forecast: Not enough data (need at least 2 months)."));
    }
}
