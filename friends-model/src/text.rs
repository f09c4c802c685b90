use crate::snapshot::Anchor;
use friends_types::diagnostic::TextSpan;

/// Resolve `anchor` against `text`, returning `None` when it points nowhere valid.
pub(crate) fn resolve_anchor(text: &str, anchor: &Anchor) -> Option<TextSpan> {
    match anchor {
        Anchor::Span { start, end } => {
            let valid = start <= end
                && *end <= text.len()
                && text.is_char_boundary(*start)
                && text.is_char_boundary(*end);
            valid.then(|| TextSpan::new(*start, *end))
        }
        Anchor::Text { text: needle, occurrence } => {
            if needle.is_empty() || *occurrence == 0 {
                return None;
            }
            text.match_indices(needle.as_str())
                .nth(occurrence - 1)
                .map(|(start, m)| TextSpan::new(start, start + m.len()))
        }
    }
}

/// 1-based line and column (in chars) of byte `offset`.
pub(crate) fn line_column(text: &str, offset: usize) -> (u64, u64) {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() as u64 + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() as u64 + 1;
    (line, column)
}

/// Leading whitespace of the line containing byte `offset`.
pub(crate) fn line_indent(text: &str, offset: usize) -> String {
    let before = &text[..offset.min(text.len())];
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    text[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Shift `span` by `delta` if it starts at or after `from`.
pub(crate) fn shift(span: &mut TextSpan, from: usize, delta: isize) {
    if span.start >= from {
        span.start = span.start.saturating_add_signed(delta);
        span.end = span.end.saturating_add_signed(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "class A\n{\n    void M() { f(); f(); }\n}\n";

    #[test]
    fn text_anchor_picks_nth_occurrence() {
        let second = Anchor::Text {
            text: "f()".to_string(),
            occurrence: 2,
        };
        let span = resolve_anchor(DOC, &second).unwrap();
        assert_eq!(&DOC[span.start..span.end], "f()");
        assert!(span.start > DOC.find("f()").unwrap());

        let third = Anchor::Text {
            text: "f()".to_string(),
            occurrence: 3,
        };
        assert_eq!(resolve_anchor(DOC, &third), None);
    }

    #[test]
    fn span_anchor_is_bounds_checked() {
        assert!(resolve_anchor(DOC, &Anchor::Span { start: 0, end: 5 }).is_some());
        assert!(resolve_anchor(DOC, &Anchor::Span { start: 5, end: 2 }).is_none());
        assert!(resolve_anchor(DOC, &Anchor::Span { start: 0, end: 999 }).is_none());
    }

    #[test]
    fn line_column_is_one_based() {
        let offset = DOC.find("void").unwrap();
        assert_eq!(line_column(DOC, offset), (3, 5));
        assert_eq!(line_column(DOC, 0), (1, 1));
    }

    #[test]
    fn indent_is_leading_whitespace_of_line() {
        let offset = DOC.find("M()").unwrap();
        assert_eq!(line_indent(DOC, offset), "    ");
        assert_eq!(line_indent(DOC, 0), "");
    }

    #[test]
    fn shift_moves_only_later_spans() {
        let mut before = TextSpan::new(2, 4);
        let mut after = TextSpan::new(10, 12);
        shift(&mut before, 5, 3);
        shift(&mut after, 5, 3);
        assert_eq!(before, TextSpan::new(2, 4));
        assert_eq!(after, TextSpan::new(13, 15));
    }

    proptest::proptest! {
        #[test]
        fn shifted_spans_still_cover_their_text(
            doc in "[a-z \n]{1,40}",
            a in 0usize..40,
            b in 0usize..40,
            at in 0usize..40,
            inserted in "[A-Z\n]{0,10}",
        ) {
            let (start, end) = (a.min(b).min(doc.len()), a.max(b).min(doc.len()));
            let at = at.min(doc.len());
            proptest::prop_assume!(end <= at || start >= at);

            let original = doc[start..end].to_string();
            let mut edited = doc.clone();
            edited.insert_str(at, &inserted);

            let mut span = TextSpan::new(start, end);
            shift(&mut span, at, inserted.len() as isize);
            proptest::prop_assert_eq!(&edited[span.start..span.end], original.as_str());
        }
    }
}
