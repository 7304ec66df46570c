use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::standings::{Standings, StandingsRow, ranked_rows};

const MAX_SHEET_NAME_LEN: usize = 31;
const EMPTY_SHEET_NAME: &str = "Posiciones";

pub struct ExportReport {
    pub groups: usize,
    pub teams: usize,
}

/// One worksheet per group, rows in table order.
pub fn export_standings(path: &Path, standings: &Standings) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    let mut used_names = HashSet::new();
    let mut teams = 0usize;

    for (group, table) in standings {
        let mut rows = vec![header_row()];
        for (position, row) in ranked_rows(table).into_iter().enumerate() {
            rows.push(standings_row(position + 1, row));
        }
        teams += table.len();

        let name = sheet_name(group, &mut used_names);
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&name)
            .with_context(|| format!("name worksheet for group {group}"))?;
        write_rows(sheet, &rows)?;
    }

    if standings.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(EMPTY_SHEET_NAME)?;
        write_rows(sheet, &[header_row()])?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        groups: standings.len(),
        teams,
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
}

fn header_row() -> Vec<Cell> {
    [
        "Pos", "Equipo", "PTS", "PJ", "PG", "PE", "PP", "GF", "GC", "DIF",
    ]
    .iter()
    .map(|s| Cell::Text(s.to_string()))
    .collect()
}

fn standings_row(position: usize, row: &StandingsRow) -> Vec<Cell> {
    let mut cells = vec![
        Cell::Number(position as f64),
        Cell::Text(row.name.clone()),
    ];
    cells.extend(
        [
            row.points,
            row.played,
            row.won,
            row.drawn,
            row.lost,
            row.goals_for,
            row.goals_against,
        ]
        .map(|n| Cell::Number(f64::from(n))),
    );
    cells.push(Cell::Number(row.goal_difference as f64));
    cells
}

// Excel sheet names: at most 31 chars, none of []:*?/\ and unique ignoring case.
fn sheet_name(group: &str, used: &mut HashSet<String>) -> String {
    let cleaned = group
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect::<String>();
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    let base = if cleaned.is_empty() {
        "Grupo".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME_LEN).collect()
    };

    let mut candidate = base.clone();
    let mut n = 2usize;
    while !used.insert(candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        let keep = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
        candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        n += 1;
    }
    candidate
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            let written = match cell {
                Cell::Text(text) => worksheet.write_string(r, c, text),
                Cell::Number(number) => worksheet.write_number(r, c, *number),
            };
            written.with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
