// Result lines, summaries and report files

use crate::error::ReportError;
use burrow_scanner::result::ScanResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: [&str; 6] = [
    "URL",
    "Status Code",
    "CMS",
    "Login",
    "Default Creds",
    "Hidden Forms",
];

pub const DEFAULT_REPORT_PATH: &str = "found_paths.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub found: usize,
    pub login_pages: usize,
    pub credential_hits: usize,
    pub cms_detected: usize,
}

pub fn summarize(results: &[ScanResult]) -> ScanSummary {
    ScanSummary {
        total: results.len(),
        found: results.iter().filter(|r| r.is_found()).count(),
        login_pages: results.iter().filter(|r| r.is_login_page).count(),
        credential_hits: results
            .iter()
            .map(|r| r.credentials.as_ref().map_or(0, Vec::len))
            .sum(),
        cms_detected: results.iter().filter(|r| r.cms.is_some()).count(),
    }
}

/// One console line per completed result.
pub fn format_result_line(result: &ScanResult) -> String {
    let mut line = format!("[+] [{}] {}", result.status_code, result.url);
    if let Some(ref cms) = result.cms {
        line.push_str(&format!(" | CMS: {}", cms));
    }
    if result.is_login_page {
        line.push_str(" | LOGIN");
    }
    let creds = result.credential_strings();
    if !creds.is_empty() {
        line.push_str(&format!(" | DEFAULT CREDS: {}", creds.join(",")));
    }
    if !result.hidden_forms.is_empty() {
        line.push_str(&format!(" | Hidden forms: {}", result.hidden_forms.len()));
    }
    line
}

/// Results worth reporting: status 200, 301 or 302, in scan order.
pub fn found_results(results: &[ScanResult]) -> Vec<&ScanResult> {
    results.iter().filter(|r| r.is_found()).collect()
}

/// Write the CSV report and return the number of data rows.
pub fn write_csv<W: Write>(results: &[ScanResult], writer: W) -> Result<usize, ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    let rows = found_results(results);
    for result in &rows {
        csv_writer.write_record([
            result.url.clone(),
            result.status_code.to_string(),
            result.cms.clone().unwrap_or_default(),
            result.is_login_page.to_string(),
            result.credential_strings().join(","),
            result.hidden_forms.len().to_string(),
        ])?;
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(rows.len())
}

pub fn write_json<W: Write>(results: &[ScanResult], writer: W) -> Result<usize, ReportError> {
    let rows = found_results(results);
    serde_json::to_writer_pretty(writer, &rows)?;
    Ok(rows.len())
}

/// Save the report to `path`, returning the number of rows written.
pub fn save_report(
    results: &[ScanResult],
    path: &Path,
    format: ReportFormat,
) -> Result<usize, ReportError> {
    let file = File::create(path).map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    let rows = match format {
        ReportFormat::Csv => write_csv(results, &mut writer)?,
        ReportFormat::Json => write_json(results, &mut writer)?,
    };

    writer.flush().map_err(|e| ReportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(rows)
}
