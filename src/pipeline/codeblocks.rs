//! Indented code → fenced code.
//!
//! Pandoc's GFM writer emits fenced blocks for code it recognised, but code
//! that reached it as indented text (older manuals, `<pre>` inside lists,
//! extracted PDFs) comes out as 4-space indented blocks. Those render, but
//! they lose their boundaries the moment anyone re-indents the file, so we
//! rewrite them as fences.
//!
//! A run of indented lines is converted only when it stands on its own:
//!
//! - blank line (or start of document) before it
//! - blank line (or end of document) after it
//! - the closest preceding non-blank line is not a list item and is not
//!   itself indented, so list continuations stay put
//!
//! Anything already inside a fence is copied through untouched, which makes
//! the pass idempotent.

/// Minimum indentation of an indented code line.
pub const CODE_INDENT: usize = 4;

/// An open fence: marker character and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence {
    pub marker: char,
    pub len: usize,
}

impl Fence {
    /// Detect a fence opener: up to three spaces, then 3+ backticks or tildes.
    pub fn opening(line: &str) -> Option<Fence> {
        if leading_spaces(line) > 3 {
            return None;
        }
        let trimmed = line.trim_start_matches(' ');
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = trimmed.chars().take_while(|&c| c == marker).count();
        if len < 3 {
            return None;
        }
        // A backtick fence's info string cannot contain backticks.
        if marker == '`' && trimmed[len..].contains('`') {
            return None;
        }
        Some(Fence { marker, len })
    }

    /// Whether `line` closes this fence: same marker, at least as long,
    /// nothing but whitespace after it.
    pub fn is_closed_by(&self, line: &str) -> bool {
        if leading_spaces(line) > 3 {
            return false;
        }
        let trimmed = line.trim_start_matches(' ');
        let len = trimmed.chars().take_while(|&c| c == self.marker).count();
        len >= self.len && trimmed[len * self.marker.len_utf8()..].trim().is_empty()
    }
}

/// Rewrite every qualifying indented code block as a fenced block.
pub fn fence_indented_code(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 8);
    let mut open: Option<Fence> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(fence) = open {
            if fence.is_closed_by(line) {
                open = None;
            }
            out.push(line.to_string());
            i += 1;
            continue;
        }

        if let Some(fence) = Fence::opening(line) {
            open = Some(fence);
            out.push(line.to_string());
            i += 1;
            continue;
        }

        if is_indented(line) && starts_block(&lines, i) {
            let end = run_end(&lines, i);
            if end == lines.len() || is_blank(lines[end]) {
                emit_fenced(&lines[i..end], &mut out);
            } else {
                out.extend(lines[i..end].iter().map(|l| l.to_string()));
            }
            i = end;
            continue;
        }

        out.push(line.to_string());
        i += 1;
    }

    let mut result = out.join("\n");
    if input.ends_with('\n') && !result.is_empty() {
        result.push('\n');
    }
    result
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_indented(line: &str) -> bool {
    !is_blank(line) && leading_spaces(line) >= CODE_INDENT
}

/// `- x`, `* x`, `+ x`, `1. x`, `1) x`.
fn is_list_item(line: &str) -> bool {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix(['-', '*', '+']) {
        return rest.is_empty() || rest.starts_with(' ');
    }
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 9 {
        return false;
    }
    let rest = &trimmed[digits..];
    match rest.strip_prefix(['.', ')']) {
        Some(after) => after.is_empty() || after.starts_with(' '),
        None => false,
    }
}

fn starts_block(lines: &[&str], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    if !is_blank(lines[i - 1]) {
        return false;
    }
    match lines[..i].iter().rev().find(|l| !is_blank(l)) {
        None => true,
        Some(prev) => !is_list_item(prev) && leading_spaces(prev) == 0,
    }
}

/// End (exclusive) of the indented run starting at `start`. Internal blank
/// lines belong to the run; trailing ones do not.
fn run_end(lines: &[&str], start: usize) -> usize {
    let mut last = start;
    let mut j = start;
    while j < lines.len() {
        if is_indented(lines[j]) {
            last = j;
        } else if !is_blank(lines[j]) {
            break;
        }
        j += 1;
    }
    last + 1
}

fn emit_fenced(run: &[&str], out: &mut Vec<String>) {
    let indent = run
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| leading_spaces(l))
        .min()
        .unwrap_or(CODE_INDENT);

    let body: Vec<String> = run
        .iter()
        .map(|l| if is_blank(l) { String::new() } else { l[indent..].to_string() })
        .collect();

    let longest = body
        .iter()
        .map(|l| l.trim_start().chars().take_while(|&c| c == '`').count())
        .max()
        .unwrap_or(0);
    let fence = "`".repeat((longest + 1).max(3));

    out.push(fence.clone());
    out.extend(body);
    out.push(fence);
}
