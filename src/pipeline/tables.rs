//! Summary-table normalisation.
//!
//! Reference manuals describe each component with a two-column table whose
//! left column is a bold label (`**Owner:**`) and whose header row is empty.
//! Pandoc serialises those faithfully but unreadably, so every such table is
//! re-emitted in one canonical shape ([`SummaryStyle`]). Tables that do not
//! fit the pattern exactly are left alone, as is anything inside fenced code.
//!
//! The output of either style is never itself recognised as a summary table,
//! which makes the pass idempotent.

use super::codeblocks::Fence;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical form for a recognised summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryStyle {
    /// `| Field | Details |` table with one plain-label row per entry. (default)
    #[default]
    FieldTable,
    /// One `**Label:** value` paragraph per entry.
    BoldLabel,
}

static RE_BOLD_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*(.+?)\*\*(.*)$").unwrap());

static RE_DELIMITER_CELL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:?-{3,}:?$").unwrap());

/// Rewrite every summary table in `input`.
pub fn rewrite_summary_tables(input: &str, style: SummaryStyle) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut open: Option<Fence> = None;
    let mut i = 0;

    while i < lines.len() {
        // Table syntax shown inside a code example is content, not a table.
        if let Some(fence) = open {
            if fence.is_closed_by(lines[i]) {
                open = None;
            }
            out.push(lines[i].to_string());
            i += 1;
            continue;
        }
        if let Some(fence) = Fence::opening(lines[i]) {
            open = Some(fence);
            out.push(lines[i].to_string());
            i += 1;
            continue;
        }

        if !is_table_line(lines[i]) {
            out.push(lines[i].to_string());
            i += 1;
            continue;
        }

        let mut j = i;
        while j < lines.len() && is_table_line(lines[j]) {
            j += 1;
        }

        let tables = split_adjacent_tables(&lines[i..j]);
        let count = tables.len();
        for (n, table) in tables.into_iter().enumerate() {
            match summary_rows(table) {
                Some(rows) => {
                    emit_summary(&rows, style, indent_of(table[0]), &mut out);
                    if style == SummaryStyle::BoldLabel && n + 1 < count {
                        out.push(String::new());
                    }
                }
                None => out.extend(table.iter().map(|l| l.to_string())),
            }
        }
        i = j;
    }

    let mut result = out.join("\n");
    if input.ends_with('\n') && !result.is_empty() {
        result.push('\n');
    }
    result
}

/// A pipe-table line: at most three spaces of indentation, then `|`.
pub fn is_table_line(line: &str) -> bool {
    indent_of(line) <= 3 && line.trim_start().starts_with('|')
}

/// A delimiter row such as `| --- | :---: |`: every cell is three or more
/// dashes, optionally with alignment colons.
pub fn is_delimiter_row(line: &str) -> bool {
    if !line.trim_start().starts_with('|') {
        return false;
    }
    let cells = split_table_row(line);
    !cells.is_empty() && cells.iter().all(|cell| RE_DELIMITER_CELL.is_match(cell))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Split a run of pipe lines wherever a second delimiter row shows that the
/// line before it is the header of a new, adjacent table.
fn split_adjacent_tables<'a>(run: &'a [&'a str]) -> Vec<&'a [&'a str]> {
    let mut tables = Vec::new();
    let mut start = 0;
    for k in 0..run.len() {
        if is_delimiter_row(run[k]) && k >= start + 2 {
            tables.push(&run[start..k - 1]);
            start = k - 1;
        }
    }
    tables.push(&run[start..]);
    tables
}

/// Split a table row into trimmed cells, honouring `\|` escapes.
pub fn split_table_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut started = false;
    let mut escape = false;

    for ch in line.trim_end_matches('\n').chars() {
        if !started {
            if ch == '|' {
                started = true;
            }
            continue;
        }
        if ch == '|' && !escape {
            cells.push(cell.trim().to_string());
            cell.clear();
            continue;
        }
        escape = ch == '\\' && !escape;
        cell.push(ch);
    }
    if !cell.trim().is_empty() {
        cells.push(cell.trim().to_string());
    }
    cells
}

/// `**Label:** lead` → `("Label", "lead")`. The colon may sit inside or
/// outside the bold markers.
fn parse_bold_label(cell: &str) -> Option<(String, String)> {
    let caps = RE_BOLD_LABEL.captures(cell)?;
    let label = caps[1].trim().trim_end_matches(':').trim_end();
    if label.is_empty() {
        return None;
    }
    let lead = caps[2].trim_start_matches(':').trim();
    Some((label.to_string(), lead.to_string()))
}

/// Label/value pairs if `table` is a summary table, otherwise `None`.
fn summary_rows(table: &[&str]) -> Option<Vec<(String, String)>> {
    let mut rows = Vec::new();
    for line in table {
        if is_delimiter_row(line) {
            continue;
        }
        let cells = split_table_row(line);
        // A blank header (or blank spacer row) reads as `|  |  |`, which
        // splits into two empty cells.
        if cells.iter().all(String::is_empty) && cells.len() <= 2 {
            continue;
        }
        if cells.len() != 2 {
            return None;
        }
        let (label, lead) = parse_bold_label(&cells[0])?;
        let value = [lead.as_str(), cells[1].as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        rows.push((label, value));
    }
    if rows.is_empty() {
        None
    } else {
        Some(rows)
    }
}

fn emit_summary(rows: &[(String, String)], style: SummaryStyle, indent: usize, out: &mut Vec<String>) {
    let pad = " ".repeat(indent);
    match style {
        SummaryStyle::FieldTable => {
            out.push(format!("{pad}| Field | Details |"));
            out.push(format!("{pad}| --- | --- |"));
            for (label, value) in rows {
                out.push(format!("{pad}| {label} | {value} |"));
            }
        }
        SummaryStyle::BoldLabel => {
            for (n, (label, value)) in rows.iter().enumerate() {
                if n > 0 {
                    out.push(String::new());
                }
                out.push(format!("{pad}**{label}:** {value}").trim_end().to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "\
Intro.

|  |  |
|----|----|
| **Name:** | ium-agent |
| **Owner:** | Platform team |

After.
";

    #[test]
    fn split_row_handles_escaped_pipes() {
        assert_eq!(
            split_table_row("| **Name:** | John Doe | Age: 30 |"),
            vec!["**Name:**", "John Doe", "Age: 30"]
        );
        assert_eq!(
            split_table_row("| Column with \\| pipe | Normal column |"),
            vec!["Column with \\| pipe", "Normal column"]
        );
        assert_eq!(split_table_row("|  |  |"), vec!["", ""]);
        assert_eq!(split_table_row("| a | b"), vec!["a", "b"]);
    }

    #[test]
    fn bold_label_variants() {
        assert_eq!(parse_bold_label("**Name:**"), Some(("Name".into(), "".into())));
        assert_eq!(parse_bold_label("**Name**:"), Some(("Name".into(), "".into())));
        assert_eq!(parse_bold_label("**Name**"), Some(("Name".into(), "".into())));
        assert_eq!(
            parse_bold_label("**Name:** John"),
            Some(("Name".into(), "John".into()))
        );
        assert_eq!(parse_bold_label("Name"), None);
        assert_eq!(parse_bold_label("****"), None);
    }

    #[test]
    fn summary_table_becomes_field_table() {
        let out = rewrite_summary_tables(SUMMARY, SummaryStyle::FieldTable);
        assert_eq!(
            out,
            "\
Intro.

| Field | Details |
| --- | --- |
| Name | ium-agent |
| Owner | Platform team |

After.
"
        );
    }

    #[test]
    fn summary_table_becomes_bold_labels() {
        let out = rewrite_summary_tables(SUMMARY, SummaryStyle::BoldLabel);
        assert_eq!(
            out,
            "\
Intro.

**Name:** ium-agent

**Owner:** Platform team

After.
"
        );
    }

    #[test]
    fn lead_text_in_label_cell_is_kept() {
        let input = "| **Since:** v2 | (stable) |\n|---|---|\n| **Scope:** | global |";
        let out = rewrite_summary_tables(input, SummaryStyle::FieldTable);
        assert!(out.contains("| Since | v2 (stable) |"), "got: {out}");
        assert!(out.contains("| Scope | global |"), "got: {out}");
    }

    #[test]
    fn idempotent_for_both_styles() {
        for style in [SummaryStyle::FieldTable, SummaryStyle::BoldLabel] {
            let once = rewrite_summary_tables(SUMMARY, style);
            let twice = rewrite_summary_tables(&once, style);
            assert_eq!(once, twice, "{style:?}");
        }
    }

    #[test]
    fn three_column_table_untouched() {
        let input = "|  |  |  |\n|---|---|---|\n| **A:** | 1 | 2 |\n";
        assert_eq!(rewrite_summary_tables(input, SummaryStyle::FieldTable), input);
    }

    #[test]
    fn table_without_bold_labels_untouched() {
        let input = "| Name | Value |\n|---|---|\n| a | 1 |\n";
        assert_eq!(rewrite_summary_tables(input, SummaryStyle::FieldTable), input);
    }

    #[test]
    fn real_header_disqualifies() {
        let input = "| Property | Value |\n|---|---|\n| **A:** | 1 |\n";
        assert_eq!(rewrite_summary_tables(input, SummaryStyle::FieldTable), input);
    }

    #[test]
    fn mixed_rows_disqualify() {
        let input = "|  |  |\n|---|---|\n| **A:** | 1 |\n| plain | 2 |\n";
        assert_eq!(rewrite_summary_tables(input, SummaryStyle::FieldTable), input);
    }

    #[test]
    fn adjacent_unrelated_table_not_consumed() {
        let input = "\
|  |  |
|---|---|
| **A:** | 1 |
| H1 | H2 |
|---|---|
| x | y |";
        let out = rewrite_summary_tables(input, SummaryStyle::FieldTable);
        assert_eq!(
            out,
            "\
| Field | Details |
| --- | --- |
| A | 1 |
| H1 | H2 |
|---|---|
| x | y |"
        );
    }

    #[test]
    fn blank_line_separated_tables_handled_independently() {
        let input = "|  |  |\n|---|---|\n| **A:** | 1 |\n\n| a | b | c |\n|---|---|---|\n";
        let out = rewrite_summary_tables(input, SummaryStyle::FieldTable);
        assert!(out.starts_with("| Field | Details |\n| --- | --- |\n| A | 1 |\n\n| a | b | c |"));
    }

    #[test]
    fn summary_table_inside_fence_untouched() {
        for fence in ["```", "~~~~"] {
            let input = format!(
                "Example:\n\n{fence}\n|  |  |\n|---|---|\n| **Name:** | x |\n{fence}\n\n|  |  |\n|---|---|\n| **Owner:** | y |\n"
            );
            for style in [SummaryStyle::FieldTable, SummaryStyle::BoldLabel] {
                let out = rewrite_summary_tables(&input, style);
                assert!(
                    out.contains(&format!("{fence}\n|  |  |\n|---|---|\n| **Name:** | x |\n{fence}\n")),
                    "{style:?} rewrote fenced code: {out}"
                );
                assert!(!out.contains("| **Owner:** |"), "{style:?} missed table after fence: {out}");
            }
        }
    }

    #[test]
    fn delimiter_rows_need_three_dashes_per_cell() {
        assert!(is_delimiter_row("|---|---|"));
        assert!(is_delimiter_row("| :--- | ---: |"));
        assert!(is_delimiter_row("  | :---: |"));
        assert!(!is_delimiter_row("| - | - |"));
        assert!(!is_delimiter_row("| --- | x |"));
        assert!(!is_delimiter_row("|  |  |"));
    }

    #[test]
    fn dash_data_row_does_not_split_table() {
        let input = "|  |  |\n|---|---|\n| **A:** | 1 |\n| - | - |\n| **B:** | 2 |\n";
        // One table with a non-summary row: left alone as a whole.
        assert_eq!(rewrite_summary_tables(input, SummaryStyle::FieldTable), input);
    }

    #[test]
    fn non_table_text_preserved() {
        let input = "no tables here\n\n**bold** | not a table\n";
        assert_eq!(rewrite_summary_tables(input, SummaryStyle::FieldTable), input);
    }
}
