// Licensed under the Apache-2.0 license

//! reStructuredText formatting helpers.
//!
//! Grid tables are the only non-trivial bit: column widths are computed
//! over every line of every cell (cells may hold multi-line text such as
//! nested value tables), then each logical row is emitted as as many
//! physical lines as its tallest cell.

use crate::types::FieldValue;
use anyhow::{bail, Result};
use std::fmt::Write;

/// Collapse an indented multi-line description into flowing text.
///
/// Leading/trailing whitespace is stripped per line and single newlines
/// become spaces; blank lines are preserved as paragraph breaks.
pub fn reflow(text: &str) -> String {
    let mut paragraphs: Vec<Vec<&str>> = vec![Vec::new()];
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !paragraphs.last().map(Vec::is_empty).unwrap_or(true) {
                paragraphs.push(Vec::new());
            }
        } else {
            paragraphs.last_mut().unwrap().push(line);
        }
    }
    paragraphs
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| p.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render a grid table. The first row is the header.
///
/// Cells may contain newlines; the row is expanded to one physical line
/// per cell line, with the other columns padded.
pub fn print_table(rows: &[Vec<String>]) -> String {
    let mut output = String::new();
    let Some(header) = rows.first() else {
        return output;
    };

    let mut widths = vec![0usize; header.len()];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            for line in cell.lines() {
                widths[i] = widths[i].max(line.chars().count());
            }
        }
    }

    let rule = |c: char| {
        let mut s = String::from("+");
        for w in &widths {
            s.push(c);
            s.extend(std::iter::repeat(c).take(*w));
            s.push(c);
            s.push('+');
        }
        s.push('\n');
        s
    };

    let emit_row = |output: &mut String, row: &[String]| {
        let cells: Vec<Vec<&str>> = row.iter().map(|c| c.lines().collect()).collect();
        let height = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        for line in 0..height {
            output.push('|');
            for (i, cell) in cells.iter().enumerate() {
                let text = cell.get(line).copied().unwrap_or("");
                let pad = widths[i] - text.chars().count();
                write!(output, " {}{} |", text, " ".repeat(pad)).unwrap();
            }
            output.push('\n');
        }
    };

    output.push('\n');
    output.push_str(&rule('-'));
    emit_row(&mut output, header);
    output.push_str(&rule('='));
    for row in &rows[1..] {
        emit_row(&mut output, row);
        output.push_str(&rule('-'));
    }
    output.push('\n');
    output
}

/// Render a field's value enumeration as a nested Value/Description table.
///
/// A zero-length enumeration or a row without a value is a malformed
/// descriptor and aborts generation.
pub fn make_value_table(field_name: &str, values: &[FieldValue]) -> Result<String> {
    if values.is_empty() {
        bail!(
            "field `{}` has a zero-length value enumeration",
            field_name
        );
    }
    let mut rows = vec![vec!["Value".to_string(), "Description".to_string()]];
    for value in values {
        if value.value.is_empty() {
            bail!(
                "field `{}` has a value enumeration entry with no value",
                field_name
            );
        }
        let description = match &value.name {
            Some(name) => format!("``{}``: {}", name, value.description),
            None => value.description.clone(),
        };
        rows.push(vec![value.value.clone(), description]);
    }
    Ok(print_table(&rows))
}

/// Underline `title` with `c` for an RST section heading.
pub fn heading(title: &str, c: char) -> String {
    format!("{}\n{}\n", title, c.to_string().repeat(title.chars().count()))
}
