use crate::errors::Result;
use crate::pipeline::BatchResult;
use serde::Serialize;
use std::io::Write;

/// How many failures the text report lists before summarizing the rest.
pub const MAX_LISTED_ERRORS: usize = 5;

/// Defines the possible output formats for a batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// A simple, human-readable summary.
    #[default]
    Text,
    /// JSON format, suitable for machine processing.
    Json,
    /// One CSV row per failed file.
    Csv,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    tool: &'a str,
    version: &'a str,
    dry_run: bool,
    #[serde(flatten)]
    result: &'a BatchResult,
}

/// Renders a finished [`BatchResult`].
pub struct ReportFormatter {
    format: ReportFormat,
    dry_run: bool,
}

impl ReportFormatter {
    /// Creates a new `ReportFormatter`.
    ///
    /// `dry_run` only changes wording: nothing was written, so rewritten files
    /// are reported as files that would be stripped.
    pub fn new(format: ReportFormat, dry_run: bool) -> Self {
        Self { format, dry_run }
    }

    /// Writes the report for `result` to `writer`.
    pub fn write_report<W: Write>(&self, writer: &mut W, result: &BatchResult) -> Result<()> {
        match self.format {
            ReportFormat::Text => self.write_text(writer, result),
            ReportFormat::Json => self.write_json(writer, result),
            ReportFormat::Csv => self.write_csv(writer, result),
        }
    }

    fn write_text<W: Write>(&self, writer: &mut W, result: &BatchResult) -> Result<()> {
        let stripped_label = if self.dry_run { "Would strip" } else { "Files stripped" };
        let status = if result.cancelled {
            format!("cancelled ({} files not processed)", result.skipped_count())
        } else {
            "completed".to_string()
        };

        writeln!(writer, "{}", "-".repeat(50))?;
        writeln!(writer, "Files found     : {}", result.total_files)?;
        writeln!(writer, "Files processed : {}", result.processed_count)?;
        writeln!(writer, "{stripped_label:<16}: {}", result.rewritten_count)?;
        writeln!(writer, "Errors          : {}", result.errors.len())?;
        writeln!(writer, "Status          : {status}")?;

        for failure in result.errors.iter().take(MAX_LISTED_ERRORS) {
            writeln!(writer, "  {}: {}", failure.path.display(), failure.message)?;
        }
        if result.errors.len() > MAX_LISTED_ERRORS {
            writeln!(writer, "  ... and {} more", result.errors.len() - MAX_LISTED_ERRORS)?;
        }
        Ok(())
    }

    fn write_json<W: Write>(&self, writer: &mut W, result: &BatchResult) -> Result<()> {
        let report = JsonReport {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            dry_run: self.dry_run,
            result,
        };
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_csv<W: Write>(&self, writer: &mut W, result: &BatchResult) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["path", "message"])?;
        for failure in &result.errors {
            csv_writer.write_record([failure.path.display().to_string().as_str(), failure.message.as_str()])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FileFailure;
    use std::path::PathBuf;

    fn failing_result(failures: usize) -> BatchResult {
        BatchResult {
            total_files: 10,
            processed_count: 10,
            rewritten_count: 10 - failures,
            errors: (0..failures)
                .map(|i| FileFailure {
                    path: PathBuf::from(format!("src/f{i}.c")),
                    message: "Permission denied".to_string(),
                })
                .collect(),
            cancelled: false,
        }
    }

    fn render(format: ReportFormat, dry_run: bool, result: &BatchResult) -> String {
        let mut out = Vec::new();
        ReportFormatter::new(format, dry_run).write_report(&mut out, result).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_lists_first_five_errors() {
        let text = render(ReportFormat::Text, false, &failing_result(7));
        assert!(text.contains("Files processed : 10"));
        assert!(text.contains("Files stripped  : 3"));
        assert!(text.contains("Errors          : 7"));
        assert!(text.contains("src/f4.c: Permission denied"));
        assert!(!text.contains("src/f5.c"));
        assert!(text.contains("... and 2 more"));
    }

    #[test]
    fn test_text_reports_cancellation() {
        let result = BatchResult {
            total_files: 3,
            processed_count: 1,
            rewritten_count: 1,
            errors: vec![],
            cancelled: true,
        };
        let text = render(ReportFormat::Text, true, &result);
        assert!(text.contains("Would strip     : 1"));
        assert!(text.contains("cancelled (2 files not processed)"));
    }

    #[test]
    fn test_json_flattens_result() {
        let json: serde_json::Value =
            serde_json::from_str(&render(ReportFormat::Json, true, &failing_result(1))).unwrap();
        assert_eq!(json["tool"], "decomment");
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["processed_count"], 10);
        assert_eq!(json["errors"][0]["path"], "src/f0.c");
    }

    #[test]
    fn test_csv_one_row_per_failure() {
        let csv = render(ReportFormat::Csv, false, &failing_result(2));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec!["path,message", "src/f0.c,Permission denied", "src/f1.c,Permission denied"]);
    }
}
