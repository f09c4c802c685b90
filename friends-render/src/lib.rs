//! Rendering helpers (terminal text and markdown) for human-readable reports.

use friends_types::diagnostic::Diagnostic;
use friends_types::report::{FriendsReport, ReportStatus, ReportSummary};

/// Compiler-style listing: one block per diagnostic, then a summary line.
pub fn render_text(report: &FriendsReport) -> String {
    let mut out = String::new();
    for d in &report.diagnostics {
        out.push_str(&render_diagnostic(d));
        out.push('\n');
    }
    out.push_str(&summary_line(&report.summary));
    out.push('\n');
    out
}

pub fn render_diagnostic(d: &Diagnostic) -> String {
    format!(
        "{}[{}]: {}\n  --> {}\n",
        d.severity.label(),
        d.rule_id,
        d.message,
        d.location
    )
}

fn summary_line(s: &ReportSummary) -> String {
    let mut line = format!(
        "{} call sites: {} allowed, {} denied, {} inconclusive",
        s.call_sites, s.allowed, s.denied, s.inconclusive
    );
    if s.skipped > 0 {
        line.push_str(&format!(", {} skipped", s.skipped));
    }
    line
}

pub fn render_report_md(report: &FriendsReport) -> String {
    let mut out = String::new();
    out.push_str("# friends check\n\n");
    out.push_str(&format!("- Status: `{}`\n", status_label(report.status)));
    out.push_str(&format!(
        "- Call sites: {} (allowed {}, denied {}, inconclusive {}, skipped {})\n\n",
        report.summary.call_sites,
        report.summary.allowed,
        report.summary.denied,
        report.summary.inconclusive,
        report.summary.skipped
    ));

    out.push_str("## Diagnostics\n\n");
    if report.diagnostics.is_empty() {
        out.push_str("_No diagnostics._\n");
        return out;
    }

    for (i, d) in report.diagnostics.iter().enumerate() {
        out.push_str(&format!("### {}. {}\n\n", i + 1, d.rule_id));
        out.push_str(&format!("- Severity: `{}`\n", d.severity.label()));
        out.push_str(&format!("- Location: `{}`\n", d.location));
        out.push_str(&format!("- Message: {}\n", d.message));
        if let Some(fp) = &d.fingerprint {
            out.push_str(&format!("- Fingerprint: `{}`\n", fp));
        }
        out.push('\n');
    }

    out
}

fn status_label(s: ReportStatus) -> &'static str {
    match s {
        ReportStatus::Pass => "pass",
        ReportStatus::Warn => "warn",
        ReportStatus::Fail => "fail",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use friends_types::diagnostic::{Location, Severity, TextSpan};
    use friends_types::report::ToolInfo;
    use pretty_assertions::assert_eq;

    fn report(diagnostics: Vec<Diagnostic>) -> FriendsReport {
        let summary = ReportSummary {
            call_sites: 3,
            allowed: 2,
            denied: diagnostics.len() as u64,
            inconclusive: 0,
            skipped: 0,
        };
        FriendsReport::new(
            ToolInfo {
                name: "friends".to_string(),
                version: None,
            },
            summary,
            diagnostics,
        )
    }

    fn denial() -> Diagnostic {
        Diagnostic {
            rule_id: "FRIEND001".to_string(),
            severity: Severity::Warn,
            message: "`TypeName.WriteLine()` is restricted to its declaring type and declared friends".to_string(),
            arguments: vec!["TypeName.WriteLine()".to_string()],
            location: Location::new(camino::Utf8PathBuf::from("src/Program.cs"), TextSpan::new(10, 30))
                .with_line_column(36, 13),
            fingerprint: Some("abc".to_string()),
        }
    }

    #[test]
    fn text_lists_diagnostics_like_a_compiler() {
        let text = render_text(&report(vec![denial()]));
        assert_eq!(
            text,
            "warning[FRIEND001]: `TypeName.WriteLine()` is restricted to its declaring type and declared friends\n  --> src/Program.cs:36:13\n\n3 call sites: 2 allowed, 1 denied, 0 inconclusive\n"
        );
    }

    #[test]
    fn markdown_reports_empty_run() {
        let md = render_report_md(&report(vec![]));
        assert!(md.contains("- Status: `pass`"));
        assert!(md.contains("_No diagnostics._"));
    }

    #[test]
    fn markdown_lists_each_diagnostic() {
        let md = render_report_md(&report(vec![denial()]));
        assert!(md.contains("- Status: `warn`"));
        assert!(md.contains("### 1. FRIEND001"));
        assert!(md.contains("- Location: `src/Program.cs:36:13`"));
        assert!(md.contains("- Fingerprint: `abc`"));
    }
}
