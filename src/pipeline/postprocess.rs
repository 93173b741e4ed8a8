//! Post-processing: deterministic cleanup of engine-generated Markdown.
//!
//! ## Why is post-processing necessary?
//!
//! Pandoc's GFM writer is faithful to the source tree, and the source trees
//! of real documentation are messy:
//!
//! - Component summaries arrive as two-column tables with an empty header
//! - Code that was indented text in the source comes out as indented blocks
//! - Escaped `\<` / `\[` sequences that some renderers show verbatim
//! - Non-breaking spaces, smart quotes and zero-width characters copied in
//!   from word processors
//!
//! This module applies a fixed sequence of pure `&str → String` rules. Each is
//! idempotent on its own and the whole sequence is idempotent, so re-running
//! the tool over its own output never produces a diff.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule sees `\n` only.
//! Invisible characters go next: a line led by a zero-width space or a
//! non-breaking space only shows its real indentation once they are gone, and
//! the re-fencer must see that indentation on the first run, not the second.
//! Tables are rewritten before code re-fencing so a table inside an indented
//! block is never mistaken for a summary. Escapes and quotes are rewritten
//! before the whitespace pass.

use super::codeblocks::{fence_indented_code, Fence};
use super::tables::{rewrite_summary_tables, SummaryStyle};

/// Apply all post-processing rules to raw engine output.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Remove invisible and control characters, NBSP → space
/// 3. Rewrite summary tables into `style`
/// 4. Re-fence standalone indented code blocks
/// 5. Ordered substitution (entities outside fences, smart quotes)
/// 6. Trim trailing whitespace per line and collapse 3+ blank lines to 2
/// 7. Trim the document and end it with exactly one newline
pub fn clean_markdown(input: &str, style: SummaryStyle) -> String {
    let s = normalise_line_endings(input);
    let s = strip_invisible_characters(&s);
    let s = rewrite_summary_tables(&s, style);
    let s = fence_indented_code(&s);
    let s = substitute_characters(&s);
    let s = collapse_blank_lines(&s);
    finish_document(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Invisible and control characters ─────────────────────────────────

/// Characters that change a line's apparent indentation without being seen.
const INVISIBLE_SUBSTITUTIONS: &[(char, &str)] = &[
    ('\u{00A0}', " "),
    ('\u{200B}', ""),
    ('\u{200C}', ""),
    ('\u{200D}', ""),
    ('\u{2060}', ""),
    ('\u{FEFF}', ""),
    ('\u{00AD}', ""),
];

fn strip_invisible_characters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match INVISIBLE_SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => out.push_str(to),
            None if c.is_control() && c != '\t' && c != '\n' => {}
            None => out.push(c),
        }
    }
    out
}

// ── Rules 3–4 live in `tables` and `codeblocks` ──────────────────────────────

// ── Rule 5: Ordered substitution ─────────────────────────────────────────────

/// Escape sequences pandoc emits for literal brackets, rewritten to entities.
/// Applied outside fenced code only.
const ESCAPE_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("\\<", "&lt;"),
    ("\\>", "&gt;"),
    ("\\[", "&#91;"),
    ("\\]", "&#93;"),
];

/// Smart quotes, straightened everywhere.
const CHAR_SUBSTITUTIONS: &[(char, &str)] = &[
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
];

fn substitute_characters(input: &str) -> String {
    let mut out = Vec::new();
    let mut open: Option<Fence> = None;

    for line in input.split('\n') {
        let in_code = match open {
            Some(fence) => {
                if fence.is_closed_by(line) {
                    open = None;
                }
                true
            }
            None => {
                open = Fence::opening(line);
                open.is_some()
            }
        };

        let mut line = line.to_string();
        if !in_code {
            for (from, to) in ESCAPE_SUBSTITUTIONS {
                line = line.replace(*from, to);
            }
        }
        for (from, to) in CHAR_SUBSTITUTIONS {
            line = line.replace(*from, to);
        }
        out.push(line);
    }
    out.join("\n")
}

// ── Rule 6: Trailing whitespace and blank-line runs ──────────────────────────

/// At most this many consecutive blank lines survive.
const MAX_BLANK_LINES: usize = 2;

fn collapse_blank_lines(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blanks = 0usize;
    for line in input.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blanks += 1;
            if blanks > MAX_BLANK_LINES {
                continue;
            }
        } else {
            blanks = 0;
        }
        out.push(line);
    }
    out.join("\n")
}

// ── Rule 7: Finish the document ──────────────────────────────────────────────

fn finish_document(input: &str) -> String {
    let trimmed = input.trim_start_matches('\n').trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(input: &str) -> String {
        clean_markdown(input, SummaryStyle::FieldTable)
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_collapse_blank_lines() {
        let input = "a\n\n\n\n\nb";
        assert_eq!(collapse_blank_lines(input), "a\n\n\nb");
    }

    #[test]
    fn test_two_blank_lines_kept() {
        assert_eq!(collapse_blank_lines("a\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(collapse_blank_lines("  hello   \nworld \t"), "  hello\nworld");
        assert_eq!(collapse_blank_lines("a\n   \nb"), "a\n\nb");
    }

    #[test]
    fn test_finish_document() {
        assert_eq!(finish_document("hello"), "hello\n");
        assert_eq!(finish_document("\n\nhello\n\n\n"), "hello\n");
        assert_eq!(finish_document("    code"), "    code\n");
        assert_eq!(finish_document(""), "");
        assert_eq!(finish_document("\n \n"), "");
    }

    #[test]
    fn test_substitution_table() {
        assert_eq!(substitute_characters("\\<tag\\>"), "&lt;tag&gt;");
        assert_eq!(substitute_characters("\\[1\\]"), "&#91;1&#93;");
        assert_eq!(
            substitute_characters("\u{201C}hi\u{201D} \u{2018}x\u{2019}"),
            "\"hi\" 'x'"
        );
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar\u{2060}";
        assert_eq!(strip_invisible_characters(input), "helloworldfoobar");
        assert_eq!(strip_invisible_characters("a\u{00A0}b"), "a b");
    }

    #[test]
    fn test_remove_control_chars_keeps_tab_and_newline() {
        assert_eq!(strip_invisible_characters("a\u{0007}b\tc\u{001B}\nd"), "ab\tc\nd");
    }

    #[test]
    fn test_escapes_kept_inside_fences() {
        let input = "\\[x\\]\n```\ngrep '\\[' file\n```\n\\<y";
        assert_eq!(
            substitute_characters(input),
            "&#91;x&#93;\n```\ngrep '\\[' file\n```\n&lt;y"
        );
    }

    #[test]
    fn test_entities_are_stable() {
        let once = substitute_characters("\\<a\\>");
        assert_eq!(substitute_characters(&once), once);
    }

    #[test]
    fn test_empty_document_stays_empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("\n\n  \n"), "");
    }

    #[test]
    fn test_clean_markdown_full_pipeline() {
        let input = "# Title\r\n\r\nSome text   \n\n\n\n\n\n## Section\n\n|  |  |\n|---|---|\n| **Owner:** | docs |\n\nRun:\n\n    make install\n\nDone\u{00A0}now.\n\n\n";
        let result = clean(input);
        assert_eq!(
            result,
            "# Title\n\nSome text\n\n\n## Section\n\n| Field | Details |\n| --- | --- |\n| Owner | docs |\n\nRun:\n\n```\nmake install\n```\n\nDone now.\n"
        );
    }

    #[test]
    fn test_clean_markdown_idempotent() {
        let input = "Intro \u{201C}quoted\u{201D}\n\n\n\n\n|  |  |\n|---|---|\n| **A:** | 1 |\n\n    code \\[x\\]\n\nSee \\<b\\>\u{0007} \n";
        for style in [SummaryStyle::FieldTable, SummaryStyle::BoldLabel] {
            let once = clean_markdown(input, style);
            assert_eq!(clean_markdown(&once, style), once, "{style:?}");
        }
    }

    #[test]
    fn test_invisible_led_indentation_fenced_on_first_run() {
        let nbsp = "Para\n\n\u{00A0}\u{00A0}\u{00A0}\u{00A0}indented text\n";
        assert_eq!(clean(nbsp), "Para\n\n```\nindented text\n```\n");

        let zero_width = "Para\n\n\u{200B}    code\n";
        assert_eq!(clean(zero_width), "Para\n\n```\ncode\n```\n");
    }

    #[test]
    fn test_clean_markdown_idempotent_edge_cases() {
        let inputs = [
            "Para\n\n\u{00A0}\u{00A0}\u{00A0}\u{00A0}indented text\n",
            "Para\n\n\u{200B}    code\n",
            "Para\n\n\u{FEFF}\u{00A0}   \u{2060}x\n\n- item\n\n\u{00AD}    continued\n",
            "Text\u{0007}\n\n\u{0007}    after bell\n",
            "Example:\n\n```\n|  |  |\n|---|---|\n| **Name:** | x |\n```\n",
            "~~~\n|  |  |\n|---|---|\n| **A:** | 1 |\n~~~\n\n|  |  |\n|---|---|\n| **B:** | 2 |\n",
            "|  |  |\n|---|---|\n| **A:** | 1 |\n| - | - |\n",
        ];
        for input in inputs {
            for style in [SummaryStyle::FieldTable, SummaryStyle::BoldLabel] {
                let once = clean_markdown(input, style);
                assert_eq!(clean_markdown(&once, style), once, "{style:?} on {input:?}");
            }
        }
    }

    #[test]
    fn test_fenced_table_survives_both_styles() {
        let input = "Example:\n\n```\n|  |  |\n|---|---|\n| **Name:** | x |\n```\n";
        for style in [SummaryStyle::FieldTable, SummaryStyle::BoldLabel] {
            assert_eq!(clean_markdown(input, style), input, "{style:?}");
        }
    }

    #[test]
    fn test_bold_label_style() {
        let input = "|  |  |\n|---|---|\n| **A:** | 1 |\n| **B:** | 2 |\n";
        assert_eq!(
            clean_markdown(input, SummaryStyle::BoldLabel),
            "**A:** 1\n\n**B:** 2\n"
        );
    }
}
