/*!
 * Reporting functionality for code-extractor
 *
 * Renders the console summary printed after a scan, using the tabled
 * library for consistent table rendering.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::scanner::ScanOutcome;
use crate::types::ScanStatistics;

/// Statistics for a finished scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Output file path
    pub output_file: String,
    /// Project type label
    pub project_type: String,
    /// Time taken to scan and write
    pub duration: Duration,
    /// Traversal counters
    pub statistics: ScanStatistics,
}

impl ScanReport {
    pub fn new(outcome: &ScanOutcome, duration: Duration) -> Self {
        Self {
            output_file: outcome.output_path.display().to_string(),
            project_type: outcome.project_type.clone(),
            duration,
            statistics: outcome.statistics.clone(),
        }
    }
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for scan results
pub struct Reporter {
    format: ReportFormat,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Metric")]
    key: String,

    #[tabled(rename = "Value")]
    value: String,
}

impl SummaryRow {
    fn new(key: &str, value: impl ToString) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Generate a report string based on scan statistics
    pub fn generate_report(&self, report: &ScanReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &ScanReport) {
        println!("\n{}", self.generate_report(report));
    }

    fn create_summary_table(&self, report: &ScanReport) -> String {
        let stats = &report.statistics;
        let mut rows = vec![
            SummaryRow::new("📂 Output File", &report.output_file),
            SummaryRow::new("🏷️ Project Type", &report.project_type),
            SummaryRow::new("⏱️ Process Time", format!("{:.4?}", report.duration)),
            SummaryRow::new("📁 Directories", stats.directories),
            SummaryRow::new("📄 Files Processed", stats.files_processed),
            SummaryRow::new("📝 Full Content", stats.raw_files),
            SummaryRow::new("✂️ Truncated", stats.truncated_files),
            SummaryRow::new("🧩 Pruned JSON", stats.pruned_json_files),
            SummaryRow::new("📦 Binary Skipped", stats.binary_files),
            SummaryRow::new("🖼️ Media Items", stats.media_items),
        ];

        if stats.pruned_directories > 0 {
            rows.push(SummaryRow::new("🗜️ Pruned Directories", stats.pruned_directories));
        }
        if stats.failed_files + stats.unreadable_directories > 0 {
            rows.push(SummaryRow::new(
                "⚠️ Read Failures",
                format!(
                    "{} files, {} directories",
                    stats.failed_files, stats.unreadable_directories
                ),
            ));
        }

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn generate_console_report(&self, report: &ScanReport) -> String {
        format!(
            "{}\n{}",
            "✅  SNAPSHOT COMPLETE",
            self.create_summary_table(report)
        )
    }
}
