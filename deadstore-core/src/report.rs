//! Output formatting - plaintext and JSON.
//!
//! Plain findings go to stderr, one line each. JSON goes to stdout so it
//! can be piped.

use serde_json::json;

use crate::detect::UnusedReport;
use crate::occurrence::Finding;

/// Count the unused findings and decide the run outcome.
///
/// Returns `(count, failed)`; the run fails iff `count > 0`.
pub fn report(findings: &[Finding]) -> (usize, bool) {
    let count = findings.iter().filter(|f| f.unused).count();
    (count, count > 0)
}

/// One line per unused finding.
pub fn plain_lines(findings: &[Finding]) -> Vec<String> {
    findings
        .iter()
        .filter(|f| f.unused)
        .map(ToString::to_string)
        .collect()
}

/// Prints findings in plain text format to stderr.
pub fn print_plain(findings: &[Finding]) {
    for line in plain_lines(findings) {
        eprintln!("{}", line);
    }
}

pub fn to_json(report: &UnusedReport) -> serde_json::Value {
    let findings: Vec<_> = report
        .findings
        .iter()
        .filter(|f| f.unused)
        .map(|f| {
            json!({
                "name": f.name,
                "file": f.position.file.display().to_string(),
                "line": f.position.line,
                "column": f.position.column,
            })
        })
        .collect();
    json!({ "count": findings.len(), "findings": findings })
}

/// Prints the report in JSON format to stdout.
pub fn print_json(report: &UnusedReport) {
    match serde_json::to_string_pretty(&to_json(report)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"count\": {}}}", report.count);
        }
    }
}

/// Skip tallies and totals, for `--verbose`.
pub fn summary_lines(report: &UnusedReport, files: usize, functions: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "Examined {} occurrences in {} functions across {} files",
        report.examined, functions, files
    )];
    for (reason, n) in report.skipped.iter() {
        lines.push(format!("  skipped ({}): {}", reason, n));
    }
    lines.push(format!("Unused assignments: {}", report.count));
    lines
}

pub fn print_summary(report: &UnusedReport, files: usize, functions: usize) {
    for line in summary_lines(report, files, functions) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SkipReason;
    use crate::occurrence::Position;

    fn finding(name: &str, line: usize, unused: bool) -> Finding {
        Finding {
            name: name.to_string(),
            position: Position::new("src/main.rs", line, 9),
            unused,
        }
    }

    #[test]
    fn test_report_counts_only_unused() {
        let findings = vec![finding("a", 1, true), finding("b", 2, false), finding("a", 3, true)];
        assert_eq!(report(&findings), (2, true));
        assert_eq!(report(&[finding("b", 2, false)]), (0, false));
        assert_eq!(report(&[]), (0, false));
    }

    #[test]
    fn test_plain_line_format() {
        let lines = plain_lines(&[finding("err", 7, true), finding("ok", 8, false)]);
        assert_eq!(lines, vec!["Unused assignment for 'err' src/main.rs:7:9"]);
    }

    #[test]
    fn test_json_shape() {
        let mut report = UnusedReport::default();
        report.findings.push(finding("err", 7, true));
        report.count = 1;

        let value = to_json(&report);
        assert_eq!(value["count"], 1);
        assert_eq!(value["findings"][0]["name"], "err");
        assert_eq!(value["findings"][0]["file"], "src/main.rs");
        assert_eq!(value["findings"][0]["line"], 7);
        assert_eq!(value["findings"][0]["column"], 9);
    }

    #[test]
    fn test_summary_lists_skips() {
        let mut report = UnusedReport::default();
        report.skipped.record(SkipReason::Global);
        report.skipped.record(SkipReason::Global);
        report.examined = 5;

        let lines = summary_lines(&report, 1, 2);
        assert_eq!(lines[0], "Examined 5 occurrences in 2 functions across 1 files");
        assert_eq!(lines[1], "  skipped (global storage): 2");
        assert_eq!(lines.last().unwrap(), "Unused assignments: 0");
    }
}
