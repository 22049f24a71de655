//! Parsers for winget's human-oriented output

use super::types::{PackageDetail, PackageRecord};

/// Strip ANSI escape sequences and stray control characters.
pub fn clean_terminal_output(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\x1b' => {
                if chars.peek() == Some(&'[') {
                    chars.next();
                    while let Some(&next) = chars.peek() {
                        chars.next();
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
            }
            '\r' => {
                if chars.peek() != Some(&'\n') && !result.ends_with('\n') {
                    result.push('\n');
                }
            }
            c if c.is_control() && c != '\n' && c != '\t' => {}
            _ => result.push(c),
        }
    }

    let mut cleaned_lines = Vec::new();
    let mut prev_empty = false;
    for line in result.lines() {
        let is_empty = line.trim().is_empty();
        if is_empty && prev_empty {
            continue;
        }
        cleaned_lines.push(line);
        prev_empty = is_empty;
    }

    cleaned_lines.join("\n")
}

/// Spinner frames (`-\|/`) and block progress bars that winget redraws in
/// place. They carry no information once the command has finished.
pub fn is_progress_noise(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.chars().all(|c| matches!(c, '-' | '\\' | '|' | '/')) && trimmed.len() <= 3 {
        return true;
    }
    if trimmed.contains('█') || trimmed.contains('▒') {
        return true;
    }
    let digits = trimmed.trim_end_matches('%');
    digits.len() < trimmed.len() && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Column offsets of a winget table, taken from its header row.
#[derive(Debug, Clone, Copy, Default)]
struct Columns {
    id: usize,
    version: usize,
    /// `Available` for the upgrade listing, otherwise `Source`.
    after_version: Option<usize>,
    available: Option<usize>,
    source: Option<usize>,
}

impl Columns {
    fn from_header(header: &str) -> Option<Self> {
        let id = char_offset(header, "Id")?;
        let version = char_offset(header, "Version")?;
        if version <= id {
            return None;
        }
        let available = char_offset(header, "Available");
        let source = char_offset(header, "Source");
        Some(Self {
            id,
            version,
            after_version: available.or(source),
            available,
            source,
        })
    }
}

/// Offset of `word` in `line`, counted in chars so that multi-byte package
/// names do not shift the columns.
fn char_offset(line: &str, word: &str) -> Option<usize> {
    line.find(word).map(|byte| line[..byte].chars().count())
}

/// Chars `[start, end)` of `line`, trimmed. `end = None` means to the end.
fn slice_chars(line: &str, start: usize, end: Option<usize>) -> String {
    let take = end.map(|e| e.saturating_sub(start)).unwrap_or(usize::MAX);
    line.chars().skip(start).take(take).collect::<String>().trim().to_string()
}

/// Parse the table printed by `winget search`, `winget list` and
/// `winget upgrade`.
///
/// Rows are cut at the header's column offsets. A row that does not fit the
/// columns (winget truncates long names with `…`, which can shift them) is
/// retried by splitting on runs of two or more spaces.
pub fn parse_package_table(output: &str, with_available: bool) -> Vec<PackageRecord> {
    let mut packages = Vec::new();
    let mut columns: Option<Columns> = None;
    let mut started = false;

    let cleaned = clean_terminal_output(output);
    for line in cleaned.lines() {
        let line = line.trim_end();
        let trimmed = line.trim();
        if trimmed.is_empty() || is_progress_noise(trimmed) {
            continue;
        }

        if columns.is_none() {
            if trimmed.starts_with("Name") && trimmed.contains("Id") {
                columns = Columns::from_header(line);
            }
            continue;
        }

        if trimmed.starts_with("---") {
            started = true;
            continue;
        }
        if !started || is_table_footer(line) {
            continue;
        }

        let Some(cols) = columns else { continue };
        match parse_fixed_row(line, &cols, with_available) {
            Some(record) => packages.push(record),
            None => {
                if let Some(record) = parse_loose_row(trimmed) {
                    packages.push(record);
                }
            }
        }
    }

    packages
}

/// Summary lines such as "3 upgrades available."
fn is_table_footer(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.ends_with('.')
        && trimmed.chars().next().is_some_and(|c| c.is_ascii_digit())
        && trimmed.split_whitespace().count() <= 8
}

fn parse_fixed_row(line: &str, cols: &Columns, with_available: bool) -> Option<PackageRecord> {
    let width = line.chars().count();
    if width <= cols.version {
        return None;
    }
    let name = slice_chars(line, 0, Some(cols.id));
    let id = slice_chars(line, cols.id, Some(cols.version));
    let version = slice_chars(line, cols.version, cols.after_version);
    if name.is_empty() || id.is_empty() || version.is_empty() || id.contains(' ') {
        return None;
    }

    let available = if with_available {
        cols.available
            .filter(|&start| width > start)
            .map(|start| slice_chars(line, start, cols.source))
            .and_then(|v| v.split_whitespace().next().map(str::to_string))
    } else {
        None
    };
    let source = cols
        .source
        .filter(|&start| width > start)
        .map(|start| slice_chars(line, start, None))
        .filter(|s| !s.is_empty());

    Some(PackageRecord {
        id,
        name,
        version,
        source,
        available,
    })
}

fn parse_loose_row(line: &str) -> Option<PackageRecord> {
    let parts: Vec<&str> = line
        .split("  ")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 3 {
        return None;
    }
    let (name, id, version) = (parts[0], parts[1], parts[2]);
    if name == "Name" || id == "Id" || id.contains(' ') {
        return None;
    }
    Some(PackageRecord::new(id, name, version))
}

/// Parse `winget show` into `key: value` fields. Indented lines continue
/// the previous value.
pub fn parse_package_detail(output: &str) -> PackageDetail {
    let mut fields: Vec<(String, String)> = Vec::new();

    let cleaned = clean_terminal_output(output);
    for line in cleaned.lines() {
        if line.trim().is_empty() || is_progress_noise(line) {
            continue;
        }
        let indented = line.starts_with(' ') || line.starts_with('\t');

        if !indented {
            if let Some(colon_pos) = line.find(':') {
                let key = line[..colon_pos].trim();
                let value = line[colon_pos + 1..].trim();
                if !key.is_empty() && !key.contains("://") {
                    fields.push((key.to_string(), value.to_string()));
                    continue;
                }
            }
        }
        if let Some(last) = fields.last_mut() {
            if !last.1.is_empty() {
                last.1.push(' ');
            }
            last.1.push_str(line.trim());
        }
    }

    PackageDetail { fields }
}

/// Count data rows in a `winget pin list` table.
pub fn count_table_rows(output: &str) -> usize {
    parse_package_table(output, false).len()
}
