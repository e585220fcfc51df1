//! Diary documents: seeding a new day and replacing the generated block.

use crate::diary::render::{MARK_END, MARK_START};
use time::{Date, Weekday};

pub const PLACEHOLDER_FILL: &str = "TBD";

/// Headings the generated block is placed before, in order of preference.
const ANCHORS: &[&str] = &["\n## Results summary", "\n## Related projects"];

pub fn weekday_name(date: Date) -> &'static str {
    match date.weekday() {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

/// Template with `{{date}}`, `{{weekday}}` and `{{today_plan_note}}`
/// filled in; any other `{{...}}` becomes `TBD`.
pub fn fill_template(template: &str, date: Date) -> String {
    let date_text = date.to_string();
    let filled = template
        .replace("{{date}}", &date_text)
        .replace("{{weekday}}", weekday_name(date))
        .replace("{{today_plan_note}}", &format!("{date_text} plan"));
    let mut out = replace_placeholders(&filled, PLACEHOLDER_FILL);
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}

/// `{{name}}` with no braces inside the name.
fn replace_placeholders(text: &str, fill: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        let close = after
            .find(|c| c == '{' || c == '}')
            .filter(|&i| i > 0 && after[i..].starts_with("}}"));
        match close {
            Some(close) => {
                out.push_str(&rest[..open]);
                out.push_str(fill);
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[..open + 1]);
                rest = &rest[open + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Built-in page for a day without a template.
pub fn skeleton(date: Date) -> String {
    let weekday = weekday_name(date);
    format!(
        "---\ndate: {date}\nweekday: {weekday}\ntags: [daily]\n---\n\n\
         # {date} {weekday}\n\n\
         ## What I did today\n- [ ] {PLACEHOLDER_FILL}\n\n\
         ## Themes\n- {PLACEHOLDER_FILL}\n\n\
         ## Results summary\n- {PLACEHOLDER_FILL}\n\n\
         ## Related projects\n- {PLACEHOLDER_FILL}\n"
    )
}

/// Put `section` (a heading plus a marker-wrapped block) into `document`.
///
/// With an existing marker pair only the bytes between the markers are
/// replaced. Otherwise an existing `## title` section is replaced, or the
/// section goes before the first anchor heading, or at the end.
pub fn upsert_section(document: &str, title: &str, section: &str) -> String {
    if let Some((inner_start, inner_end)) = marker_interior(document) {
        let body = match marker_interior(section) {
            Some((s, e)) => &section[s..e],
            None => section,
        };
        return format!(
            "{}{}{}",
            &document[..inner_start],
            body,
            &document[inner_end..]
        );
    }

    let section = section.trim_end();
    let heading = format!("## {title}");
    if let Some(pos) = document.find(&heading) {
        let end = document[pos + heading.len()..]
            .find("\n## ")
            .map_or(document.len(), |i| pos + heading.len() + i);
        return format!(
            "{}\n\n{section}\n\n{}",
            document[..pos].trim_end(),
            document[end..].trim_start()
        );
    }

    if let Some(pos) = ANCHORS.iter().find_map(|anchor| document.find(anchor)) {
        return format!(
            "{}\n\n{section}\n\n{}",
            document[..pos].trim_end(),
            document[pos..].trim_start()
        );
    }

    format!("{}\n\n{section}\n", document.trim_end())
}

/// Byte range strictly between the first start marker and the end marker
/// after it.
fn marker_interior(text: &str) -> Option<(usize, usize)> {
    let start = text.find(MARK_START)? + MARK_START.len();
    let end = start + text[start..].find(MARK_END)?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn block(title: &str, body: &str) -> String {
        format!("## {title}\n{MARK_START}\n{body}\n{MARK_END}\n")
    }

    #[test]
    fn test_fill_template() {
        let template = "# {{date}} {{weekday}}\nplan: {{today_plan_note}}\nmood: {{ mood }}\n{not} {{}}\n\n";
        assert_eq!(
            fill_template(template, date!(2026 - 03 - 14)),
            "# 2026-03-14 Saturday\nplan: 2026-03-14 plan\nmood: TBD\n{not} {{}}\n"
        );
    }

    #[test]
    fn test_skeleton_has_anchors() {
        let doc = skeleton(date!(2026 - 03 - 16));
        assert!(doc.starts_with("---\ndate: 2026-03-16\nweekday: Monday\n"));
        assert!(doc.contains("\n## Results summary\n"));
    }

    #[test]
    fn test_insert_before_anchor() {
        let doc = skeleton(date!(2026 - 03 - 16));
        let out = upsert_section(&doc, "Auto", &block("Auto", "- one"));
        let auto = out.find("## Auto").unwrap();
        let results = out.find("## Results summary").unwrap();
        assert!(auto < results);
        assert!(out.contains("## Themes\n- TBD\n\n## Auto\n"));
    }

    #[test]
    fn test_replace_between_markers_only() {
        let doc = format!(
            "# Day\n\nmy notes\n\n## Renamed heading\n{MARK_START}\nold\n{MARK_END}\ntrailing  text kept\n"
        );
        let out = upsert_section(&doc, "Auto", &block("Auto", "new"));
        assert_eq!(
            out,
            format!(
                "# Day\n\nmy notes\n\n## Renamed heading\n{MARK_START}\nnew\n{MARK_END}\ntrailing  text kept\n"
            )
        );
        let again = upsert_section(&out, "Auto", &block("Auto", "new"));
        assert_eq!(again, out);
    }

    #[test]
    fn test_replace_heading_without_markers() {
        let doc = "# Day\n\n## Auto\nstale line\n\n## Later\nkeep\n";
        let out = upsert_section(doc, "Auto", &block("Auto", "fresh"));
        assert_eq!(
            out,
            format!("# Day\n\n## Auto\n{MARK_START}\nfresh\n{MARK_END}\n\n## Later\nkeep\n")
        );
    }

    #[test]
    fn test_append_when_nothing_matches() {
        let out = upsert_section("# Day\nfree text\n\n", "Auto", &block("Auto", "x"));
        assert_eq!(out, format!("# Day\nfree text\n\n## Auto\n{MARK_START}\nx\n{MARK_END}\n"));
    }
}
