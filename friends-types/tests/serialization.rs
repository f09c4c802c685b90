use friends_types::diagnostic::{Diagnostic, Location, Severity, TextSpan};
use friends_types::report::{FriendsReport, ReportStatus, ReportSummary, ToolInfo};
use friends_types::rule::FRIEND_ACCESS;
use friends_types::schema;
use pretty_assertions::assert_eq;

fn tool() -> ToolInfo {
    ToolInfo {
        name: "friends".to_string(),
        version: Some("0.0.0".to_string()),
    }
}

fn diagnostic() -> Diagnostic {
    Diagnostic {
        rule_id: FRIEND_ACCESS.id.to_string(),
        severity: Severity::Warn,
        message: FRIEND_ACCESS.format_message(&["TypeName.WriteLine()".to_string()]),
        arguments: vec!["TypeName.WriteLine()".to_string()],
        location: Location::new("src/Program.cs", TextSpan::new(10, 30)).with_line_column(4, 17),
        fingerprint: None,
    }
}

#[test]
fn severity_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
    let parsed: Severity = serde_json::from_str("\"error\"").unwrap();
    assert_eq!(parsed, Severity::Error);
}

#[test]
fn diagnostic_defaults_tolerate_missing_fields() {
    let json = r#"{
        "rule_id": "FRIEND001",
        "message": "m",
        "location": { "path": "a.cs", "span": { "start": 1, "end": 2 } }
    }"#;
    let d: Diagnostic = serde_json::from_str(json).unwrap();
    assert_eq!(d.severity, Severity::Warn);
    assert!(d.arguments.is_empty());
    assert!(d.location.line.is_none());
    assert!(d.fingerprint.is_none());
}

#[test]
fn report_carries_schema_and_status() {
    let summary = ReportSummary {
        call_sites: 3,
        allowed: 2,
        denied: 1,
        ..Default::default()
    };
    let report = FriendsReport::new(tool(), summary, vec![diagnostic()]);
    assert_eq!(report.schema, schema::FRIENDS_REPORT_V1);
    assert_eq!(report.status, ReportStatus::Warn);

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["status"], "warn");
    assert_eq!(value["summary"]["denied"], 1);
    assert_eq!(value["diagnostics"][0]["location"]["line"], 4);
}

#[test]
fn empty_report_passes() {
    let report = FriendsReport::new(tool(), ReportSummary::default(), vec![]);
    assert_eq!(report.status, ReportStatus::Pass);
}

#[test]
fn location_display_prefers_line_and_column() {
    let loc = Location::new("a.cs", TextSpan::new(3, 9));
    assert_eq!(loc.to_string(), "a.cs@3..9");
    assert_eq!(loc.with_line_column(2, 5).to_string(), "a.cs:2:5");
}

#[test]
fn summary_merge_adds_counts() {
    let mut a = ReportSummary {
        call_sites: 2,
        allowed: 1,
        denied: 1,
        inconclusive: 0,
        skipped: 0,
    };
    let b = ReportSummary {
        call_sites: 3,
        allowed: 1,
        denied: 0,
        inconclusive: 1,
        skipped: 1,
    };
    a.merge(&b);
    assert_eq!(
        a,
        ReportSummary {
            call_sites: 5,
            allowed: 2,
            denied: 1,
            inconclusive: 1,
            skipped: 1,
        }
    );
}
