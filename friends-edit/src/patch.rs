use camino::Utf8PathBuf;
use diffy::PatchFormatter;
use std::collections::BTreeMap;

/// Unified diff of every document whose text differs between `before` and `after`.
///
/// Documents absent from `after` are treated as unchanged.
pub fn render_patch(
    before: &BTreeMap<Utf8PathBuf, String>,
    after: &BTreeMap<Utf8PathBuf, String>,
) -> String {
    let mut out = String::new();
    let formatter = PatchFormatter::new();

    for (path, old) in before {
        let new = after.get(path).unwrap_or(old);
        if old == new {
            continue;
        }

        out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
        out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

        let patch = diffy::create_patch(old, new);
        let body = formatter.fmt_patch(&patch).to_string();
        // diffy repeats the ---/+++ header; keep ours.
        let hunks = body
            .split_once("\n@@")
            .map(|(_, rest)| format!("@@{rest}"))
            .unwrap_or_default();
        out.push_str(&hunks);
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}
