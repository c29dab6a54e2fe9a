use colored::{ColoredString, Colorize};
use pkgver_core::{OutdatedIndex, PackageRecord};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const MAX_DESCRIPTION_WIDTH: usize = 60;
const HEADERS: [&str; 5] = [
    "Package Name",
    "Current Version",
    "Latest Version",
    "Status",
    "Description",
];
const STATUS_OUTDATED: &str = "Outdated";
const STATUS_CURRENT: &str = "Up to date";

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow<'a> {
    pub name: &'a str,
    pub current: &'a str,
    pub latest: &'a str,
    pub description: &'a str,
    pub outdated: bool,
}

/// Outdated packages first, then current ones; each group in
/// case-insensitive name order.
pub fn ordered_rows<'a>(records: &'a [PackageRecord], outdated: &'a OutdatedIndex) -> Vec<TableRow<'a>> {
    let mut sorted: Vec<&PackageRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.name.to_lowercase());

    let (stale, current): (Vec<&PackageRecord>, Vec<&PackageRecord>) = sorted
        .into_iter()
        .partition(|record| outdated.contains(&record.name));

    let stale = stale.into_iter().map(|record| TableRow {
        name: &record.name,
        current: &record.installed_version,
        latest: outdated
            .get(&record.name)
            .map(|entry| entry.latest_version.as_str())
            .unwrap_or(record.installed_version.as_str()),
        description: record.description_or_default(),
        outdated: true,
    });
    let current = current.into_iter().map(|record| TableRow {
        name: &record.name,
        current: &record.installed_version,
        latest: &record.installed_version,
        description: record.description_or_default(),
        outdated: false,
    });

    stale.chain(current).collect()
}

pub fn render_table(records: &[PackageRecord], outdated: &OutdatedIndex) -> String {
    if records.is_empty() {
        return format!("{}\n", "No package information available".red());
    }

    let rows = ordered_rows(records, outdated);
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|row| {
            [
                row.name.to_string(),
                row.current.to_string(),
                row.latest.to_string(),
                if row.outdated { STATUS_OUTDATED } else { STATUS_CURRENT }.to_string(),
                truncate(row.description, MAX_DESCRIPTION_WIDTH),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|title| title.width());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    out.push_str(&border('┏', '━', '┳', '┓', &widths));
    let header: Vec<ColoredString> = HEADERS
        .iter()
        .zip(widths.iter())
        .enumerate()
        .map(|(column, (title, width))| {
            let padded = pad(title, *width);
            match column {
                0 | 2 => padded.yellow().bold(),
                _ => padded.bold(),
            }
        })
        .collect();
    out.push_str(&line('┃', &header));
    out.push_str(&border('┡', '━', '╇', '┩', &widths));

    for (row, cell) in rows.iter().zip(cells.iter()) {
        let styled: Vec<ColoredString> = cell
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(column, (text, width))| style_cell(column, &pad(text, *width), row.outdated))
            .collect();
        out.push_str(&line('│', &styled));
    }
    out.push_str(&border('└', '─', '┴', '┘', &widths));
    out
}

fn style_cell(column: usize, text: &str, outdated: bool) -> ColoredString {
    match (column, outdated) {
        (3, true) => text.red().bold().on_bright_cyan(),
        (3, false) => text.green().bold(),
        (4, _) => text.normal(),
        (_, true) => text.black().on_bright_cyan(),
        (0 | 2, false) => text.yellow(),
        _ => text.normal(),
    }
}

fn border(left: char, fill: char, join: char, right: char, widths: &[usize]) -> String {
    let segments: Vec<String> = widths
        .iter()
        .map(|width| fill.to_string().repeat(width + 2))
        .collect();
    format!("{}{}{}\n", left, segments.join(&join.to_string()), right)
}

fn line(edge: char, cells: &[ColoredString]) -> String {
    let mut out = String::new();
    out.push(edge);
    for cell in cells {
        out.push_str(&format!(" {} {}", cell, edge));
    }
    out.push('\n');
    out
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
