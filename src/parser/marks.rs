//! "Marks" sheet analysis
//!
//! The Marks sheet carries per-judge Tech/Art/Total/Place blocks in sheet
//! order (the running order, not the ranking). Two things come out of it:
//! the summed judge totals per skater, used to exclude skaters who have
//! not performed yet, and the last skater with complete scores from all
//! three judges, flagged for progress display.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::grid::{HeaderRow, Sheet};

/// Banner rows above the Marks header
const BANNER_ROWS: usize = 6;

/// Header layout: the titled header row, then the per-judge sub-header
/// row (Tech, Art, Total, Place) and one spacer row before data
const HEADER_ROWS: usize = 3;

/// Offset from a judge's primary column to its Total sub-column
const TOTAL_OFFSET: usize = 2;

/// Number of judges a complete panel carries
const JUDGE_PANEL: usize = 3;

/// What the Marks sheet contributes to the parse
#[derive(Debug, Clone, Default)]
pub struct MarksAnalysis {
    /// Summed judge totals keyed by trimmed skater name
    pub totals: HashMap<String, f64>,

    /// Name of the last skater (in sheet order) with strictly positive
    /// totals from all three judges
    pub last_performed: Option<String>,
}

impl MarksAnalysis {
    /// Whether the named skater has a recorded total of exactly zero
    pub fn is_unscored(&self, name: &str) -> bool {
        matches!(self.totals.get(name), Some(total) if *total == 0.0)
    }
}

/// Analyze the Marks sheet; never fails, degrades to an empty analysis
pub fn analyze(sheet: &Sheet) -> MarksAnalysis {
    let header_row = BANNER_ROWS;
    let header = HeaderRow::read(sheet, header_row);
    let width = sheet.row(header_row).len();

    let Some(name_col) = header.column_containing("Name") else {
        warn!("Marks sheet has no name column; skipping marks analysis");
        return MarksAnalysis::default();
    };

    let total_cols: Vec<usize> = header
        .columns_containing("Judge")
        .into_iter()
        .filter(|judge_col| judge_col + TOTAL_OFFSET < width)
        .map(|judge_col| judge_col + TOTAL_OFFSET)
        .collect();

    if total_cols.len() != JUDGE_PANEL {
        warn!(
            judge_columns = total_cols.len(),
            "Marks sheet does not carry a full {JUDGE_PANEL}-judge panel; skipping marks analysis"
        );
        return MarksAnalysis::default();
    }

    let mut analysis = MarksAnalysis::default();

    for row in (header_row + HEADER_ROWS)..sheet.height() {
        let name = sheet.cell(row, name_col).display();
        if name.is_empty() {
            continue;
        }

        let values: Vec<Option<f64>> = total_cols
            .iter()
            .map(|&col| sheet.cell(row, col).as_f64())
            .collect();

        let sum: f64 = values.iter().flatten().sum();
        analysis.totals.insert(name.clone(), sum);

        let complete = values.iter().all(|v| matches!(v, Some(n) if *n > 0.0));
        if complete {
            analysis.last_performed = Some(name);
        }
    }

    debug!(
        skaters = analysis.totals.len(),
        last_performed = ?analysis.last_performed,
        "Marks analysis complete"
    );
    analysis
}
