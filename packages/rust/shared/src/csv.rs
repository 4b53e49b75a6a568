//! Minimal CSV encoding/decoding for the flat-file artifacts.
//!
//! RFC 4180 quoting: cells containing a comma, a double quote, or a newline
//! are wrapped in double quotes with internal quotes doubled. This covers
//! every value the pipelines persist (identifiers, usernames, taxon labels,
//! counts) without pulling in a full CSV dependency.

/// Append one cell to `out`, quoting if needed.
fn push_cell(out: &mut String, cell: &str) {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        out.push('"');
        for c in cell.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(cell);
    }
}

/// Encode a header plus rows into a CSV string with a trailing newline.
pub fn encode(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    for (i, cell) in header.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_cell(&mut out, cell);
    }
    out.push('\n');

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            push_cell(&mut out, cell);
        }
        out.push('\n');
    }
    out
}

/// Split one CSV line into cells, honoring RFC 4180 quoting.
///
/// Multi-line quoted cells are not supported; no persisted value contains a
/// newline.
pub fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                cell.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    cells.push(std::mem::take(&mut cell));
                }
                _ => cell.push(c),
            }
        }
    }
    cells.push(cell);
    cells
}

/// Decode a CSV string into (header, rows).
///
/// Returns `None` for an empty input. Rows shorter than the header are
/// passed through unchanged; callers validate the shape they need.
pub fn decode(content: &str) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let mut lines = content.lines().filter(|l| !l.is_empty());
    let header = split_line(lines.next()?);
    let rows = lines.map(split_line).collect();
    Some((header, rows))
}
