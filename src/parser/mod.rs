//! Results workbook parsing
//!
//! Turns raw workbook bytes into a [`ResultSet`]. The workbook layout is
//! the one produced by the judging software: a required "Final results"
//! sheet (banner rows, then a Rank/Name/Judge table) and an optional
//! "Marks" sheet with per-judge score blocks in running order.
//!
//! Decoding is split from extraction: [`grid`] holds the plain cell model
//! and [`results`]/[`marks`] the pure heuristics, so only this module
//! touches the xlsx reader. A missing "Final results" sheet is the one
//! fatal condition; every other anomaly degrades with a logged fallback.

pub mod grid;
pub mod marks;
pub mod results;

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::models::ResultSet;

use self::grid::{Cell, Sheet};
use self::marks::MarksAnalysis;

/// The sheet results are read from; its absence is fatal
pub const FINAL_RESULTS_SHEET: &str = "Final results";

/// Optional sheet carrying per-judge marks in running order
pub const MARKS_SHEET: &str = "Marks";

/// Parse workbook bytes into a result set
///
/// The returned set always has `category_complete` cleared; completion is
/// an operator action, not a workbook property.
pub fn parse_workbook(bytes: &[u8]) -> Result<ResultSet, ParseError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ParseError::InvalidWorkbook(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == FINAL_RESULTS_SHEET) {
        return Err(ParseError::MissingSheet(FINAL_RESULTS_SHEET));
    }

    let finals = workbook
        .worksheet_range(FINAL_RESULTS_SHEET)
        .map(|range| sheet_from_range(&range))
        .map_err(|e| ParseError::InvalidWorkbook(e.to_string()))?;

    let marks_analysis = if sheet_names.iter().any(|name| name == MARKS_SHEET) {
        match workbook.worksheet_range(MARKS_SHEET) {
            Ok(range) => marks::analyze(&sheet_from_range(&range)),
            Err(e) => {
                warn!(error = %e, "Marks sheet present but unreadable; skipping marks analysis");
                MarksAnalysis::default()
            }
        }
    } else {
        debug!("No Marks sheet; zero-score exclusion and last-performer detection disabled");
        MarksAnalysis::default()
    };

    let extracted = results::extract(&finals, &marks_analysis)?;
    Ok(ResultSet::new(
        extracted.discipline,
        extracted.category,
        extracted.competitors,
    ))
}

/// Materialize a calamine range as an absolute-coordinate grid
fn sheet_from_range(range: &Range<Data>) -> Sheet {
    let Some((end_row, end_col)) = range.end() else {
        return Sheet::default();
    };

    let mut rows = Vec::with_capacity(end_row as usize + 1);
    for row in 0..=end_row {
        let mut cells = Vec::with_capacity(end_col as usize + 1);
        for col in 0..=end_col {
            let cell = range
                .get_value((row, col))
                .map(cell_from_data)
                .unwrap_or(Cell::Empty);
            cells.push(cell);
        }
        rows.push(cells);
    }
    Sheet::new(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => {
            debug!(error = ?e, "Treating cell error as empty");
            Cell::Empty
        }
    }
}
