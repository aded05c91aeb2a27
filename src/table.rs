//! Plain-text tables for the interactive listings.

use std::borrow::Cow;
use std::fmt::Write as _;

use itertools::Itertools;

const COLUMN_GAP: &str = "  ";
const MAX_CELL_WIDTH: usize = 60;

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| display_width(header))
        .collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(&flatten(cell)));
        }
    }
    for width in &mut widths {
        *width = (*width).clamp(1, MAX_CELL_WIDTH);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers.iter().copied(), &widths));
    let rule = widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(rule.iter().map(String::as_str), &widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row.iter().map(String::as_str), &widths));
    }
    output
}

fn format_row<'a, I>(cells: I, widths: &[usize]) -> String
where
    I: Iterator<Item = &'a str>,
{
    let line = cells
        .zip(widths)
        .map(|(cell, &width)| {
            let flattened = flatten(cell);
            let clipped = clip(&flattened, width);
            let padding = width.saturating_sub(display_width(&clipped));
            format!("{clipped}{}", " ".repeat(padding))
        })
        .join(COLUMN_GAP);
    line.trim_end().to_string()
}

fn clip(value: &str, width: usize) -> Cow<'_, str> {
    if display_width(value) <= width {
        return Cow::Borrowed(value);
    }
    let mut clipped = value.chars().take(width.saturating_sub(1)).collect::<String>();
    clipped.push('…');
    Cow::Owned(clipped)
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn flatten(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
