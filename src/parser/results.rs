//! "Final results" sheet extraction
//!
//! The sheet opens with a free-form banner (event name, discipline,
//! category line), followed by the results table. Extraction scans the
//! banner for the category/discipline pair, then walks the table keeping
//! only rows that have been judged.

use tracing::{debug, warn};

use crate::error::ParseError;
use crate::models::Competitor;

use super::grid::{coerce_int, HeaderRow, Sheet};
use super::marks::MarksAnalysis;

/// Banner rows above the results table header
const BANNER_ROWS: usize = 6;

/// Category line scan window: rows 1-9, columns 1-5 (1-based), row-major
const CATEGORY_SCAN_ROWS: usize = 9;
const CATEGORY_SCAN_COLS: usize = 5;

/// Literal prefix of the category banner line
const CATEGORY_PREFIX: &str = "Category";

/// Columns a row must carry values in to count as judged
const REQUIRED_COLUMNS: [&str; 5] = ["Name", "Rank", "Judge 1", "Judge 2", "Judge 3"];

/// Everything extracted from the "Final results" sheet
#[derive(Debug, Clone, Default)]
pub struct ExtractedResults {
    pub discipline: Option<String>,
    pub category: Option<String>,
    pub competitors: Vec<Competitor>,
}

/// Scan the banner for the category line; first match wins
///
/// Returns `(discipline, category)`. The discipline is the trimmed text of
/// the cell directly above the category line, when present. No match
/// leaves both empty; that is a valid sheet, not an error.
pub fn scan_category(sheet: &Sheet) -> (Option<String>, Option<String>) {
    for row in 0..CATEGORY_SCAN_ROWS {
        for col in 0..CATEGORY_SCAN_COLS {
            let Some(text) = sheet.cell(row, col).trimmed() else {
                continue;
            };
            if !text.starts_with(CATEGORY_PREFIX) {
                continue;
            }

            let category = match text.split_once(char::is_whitespace) {
                Some((_, rest)) => rest.trim().to_string(),
                None => {
                    warn!(row, col, "Category line carries no category name");
                    String::new()
                }
            };

            let discipline = if row > 0 {
                sheet
                    .cell(row - 1, col)
                    .trimmed()
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
            } else {
                None
            };

            return (discipline, Some(category));
        }
    }

    debug!("No category line found in banner; leaving category and discipline empty");
    (None, None)
}

/// Extract the competitor table, applying the marks-based filters
pub fn extract(sheet: &Sheet, marks: &MarksAnalysis) -> Result<ExtractedResults, ParseError> {
    let (discipline, category) = scan_category(sheet);

    let header = HeaderRow::read(sheet, BANNER_ROWS);
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|title| header.column(title).is_none())
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::MissingColumns(missing.join(", ")));
    }

    let (Some(name_col), Some(rank_col), Some(j1_col), Some(j2_col), Some(j3_col)) = (
        header.column("Name"),
        header.column("Rank"),
        header.column("Judge 1"),
        header.column("Judge 2"),
        header.column("Judge 3"),
    ) else {
        // Unreachable after the missing-columns check above
        return Err(ParseError::MissingColumns(REQUIRED_COLUMNS.join(", ")));
    };
    let team_col = header.column("Team");
    let country_col = header.column("Ctry");
    let penalty_col = header.column("PEN");
    let remark_col = header.column("Remark");

    let mut competitors = Vec::new();

    for row in (BANNER_ROWS + 1)..sheet.height() {
        let required_cells = [name_col, rank_col, j1_col, j2_col, j3_col];
        if required_cells
            .iter()
            .any(|&col| sheet.cell(row, col).is_empty())
        {
            // Not yet judged (or a blank/placeholder row)
            continue;
        }

        let name = sheet.cell(row, name_col).display();
        if marks.is_unscored(&name) {
            debug!(skater = %name, "Skipping skater with zero marks total");
            continue;
        }

        let scores = (|| -> Result<(i32, i32, i32, i32), super::grid::CoerceError> {
            let rank = coerce_int(sheet.cell(row, rank_col), "Rank")?;
            let judge1 = coerce_int(sheet.cell(row, j1_col), "Judge 1")?;
            let judge2 = coerce_int(sheet.cell(row, j2_col), "Judge 2")?;
            let judge3 = coerce_int(sheet.cell(row, j3_col), "Judge 3")?;
            Ok((rank, judge1, judge2, judge3))
        })();
        let (rank, judge1, judge2, judge3) = match scores {
            Ok(values) => values,
            Err(e) => {
                warn!(row, column = %e.column, value = %e.value, "Dropping row with non-numeric score");
                continue;
            }
        };

        let penalty = match penalty_col.map(|col| coerce_int(sheet.cell(row, col), "PEN")) {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                warn!(row, value = %e.value, "Dropping row with non-numeric penalty");
                continue;
            }
            None => 0,
        };

        let text_of = |col: Option<usize>| col.map(|c| sheet.cell(row, c).display()).unwrap_or_default();

        competitors.push(Competitor {
            rank: rank.max(0) as u32,
            name: name.clone(),
            team: text_of(team_col),
            country: text_of(country_col),
            penalty,
            judge1,
            judge2,
            judge3,
            remark: text_of(remark_col),
            last_performed: marks.last_performed.as_deref() == Some(name.as_str()),
        });
    }

    debug!(
        count = competitors.len(),
        category = ?category,
        discipline = ?discipline,
        "Extracted final results"
    );

    Ok(ExtractedResults {
        discipline,
        category,
        competitors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grid::Cell;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn num(n: f64) -> Cell {
        Cell::Number(n)
    }

    /// Banner + header + the given data rows, in the standard layout:
    /// Rank, Name, Team, Ctry, PEN, Judge 1, Judge 2, Judge 3, Remark
    fn results_sheet(banner: Vec<Vec<Cell>>, data_rows: Vec<Vec<Cell>>) -> Sheet {
        let mut rows = banner;
        rows.resize(BANNER_ROWS, vec![]);
        rows.push(vec![
            text("Rank"),
            text("Name"),
            text("Team"),
            text("Ctry"),
            text("PEN"),
            text("Judge 1"),
            text("Judge 2"),
            text("Judge 3"),
            text("Remark"),
        ]);
        rows.extend(data_rows);
        Sheet::new(rows)
    }

    fn judged(rank: f64, name: &str, scores: [f64; 3]) -> Vec<Cell> {
        vec![
            num(rank),
            text(name),
            text("Rolling Thunder"),
            text("ITA"),
            Cell::Empty,
            num(scores[0]),
            num(scores[1]),
            num(scores[2]),
            Cell::Empty,
        ]
    }

    #[test]
    fn test_category_and_discipline_from_banner() {
        let banner = vec![
            vec![],
            vec![Cell::Empty, text("Inline Freestyle")],
            vec![Cell::Empty, text("Category Senior Men")],
        ];
        let sheet = results_sheet(banner, vec![]);
        let (discipline, category) = scan_category(&sheet);

        assert_eq!(discipline.as_deref(), Some("Inline Freestyle"));
        assert_eq!(category.as_deref(), Some("Senior Men"));
    }

    #[test]
    fn test_category_without_discipline() {
        let banner = vec![vec![text("Category Junior Women")]];
        let sheet = results_sheet(banner, vec![]);
        let (discipline, category) = scan_category(&sheet);

        assert_eq!(discipline, None);
        assert_eq!(category.as_deref(), Some("Junior Women"));
    }

    #[test]
    fn test_no_category_line_is_not_an_error() {
        let sheet = results_sheet(vec![], vec![judged(1.0, "A", [80.0, 81.0, 82.0])]);
        let extracted = extract(&sheet, &MarksAnalysis::default()).unwrap();

        assert_eq!(extracted.category, None);
        assert_eq!(extracted.discipline, None);
        assert_eq!(extracted.competitors.len(), 1);
    }

    #[test]
    fn test_two_competitors_no_marks() {
        let sheet = results_sheet(
            vec![],
            vec![
                judged(1.0, "A", [90.0, 91.0, 89.0]),
                judged(2.0, "B", [85.0, 84.0, 86.0]),
            ],
        );
        let extracted = extract(&sheet, &MarksAnalysis::default()).unwrap();

        assert_eq!(extracted.competitors.len(), 2);
        assert_eq!(extracted.competitors[0].name, "A");
        assert_eq!(extracted.competitors[0].rank, 1);
        assert_eq!(extracted.competitors[1].judge2, 84);
        assert!(extracted.competitors.iter().all(|c| !c.last_performed));
    }

    #[test]
    fn test_unjudged_rows_dropped() {
        let mut pending = judged(0.0, "C", [0.0, 0.0, 0.0]);
        pending[0] = Cell::Empty; // no rank yet
        pending[5] = Cell::Empty; // no judge 1 score
        let sheet = results_sheet(
            vec![],
            vec![judged(1.0, "A", [90.0, 91.0, 89.0]), pending, vec![]],
        );
        let extracted = extract(&sheet, &MarksAnalysis::default()).unwrap();

        assert_eq!(extracted.competitors.len(), 1);
        assert_eq!(extracted.competitors[0].name, "A");
    }

    #[test]
    fn test_zero_marks_total_excluded() {
        let mut marks = MarksAnalysis::default();
        marks.totals.insert("B".to_string(), 0.0);
        marks.totals.insert("A".to_string(), 245.0);

        let sheet = results_sheet(
            vec![],
            vec![
                judged(1.0, "A", [90.0, 91.0, 89.0]),
                judged(2.0, "B", [0.0, 0.0, 0.0]),
            ],
        );
        let extracted = extract(&sheet, &marks).unwrap();

        assert_eq!(extracted.competitors.len(), 1);
        assert_eq!(extracted.competitors[0].name, "A");
    }

    #[test]
    fn test_last_performed_flagged_once() {
        let mut marks = MarksAnalysis::default();
        marks.last_performed = Some("B".to_string());

        let sheet = results_sheet(
            vec![],
            vec![
                judged(1.0, "A", [90.0, 91.0, 89.0]),
                judged(2.0, "B", [85.0, 84.0, 86.0]),
            ],
        );
        let extracted = extract(&sheet, &marks).unwrap();

        let flagged: Vec<&str> = extracted
            .competitors
            .iter()
            .filter(|c| c.last_performed)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(flagged, vec!["B"]);
    }

    #[test]
    fn test_non_numeric_rank_drops_row() {
        let mut bad = judged(0.0, "B", [85.0, 84.0, 86.0]);
        bad[0] = text("DSQ");
        let sheet = results_sheet(vec![], vec![judged(1.0, "A", [90.0, 91.0, 89.0]), bad]);
        let extracted = extract(&sheet, &MarksAnalysis::default()).unwrap();

        assert_eq!(extracted.competitors.len(), 1);
    }

    #[test]
    fn test_missing_penalty_defaults_to_zero() {
        let sheet = results_sheet(vec![], vec![judged(1.0, "A", [90.0, 91.0, 89.0])]);
        let extracted = extract(&sheet, &MarksAnalysis::default()).unwrap();

        assert_eq!(extracted.competitors[0].penalty, 0);
    }

    #[test]
    fn test_missing_required_columns_is_fatal() {
        let mut rows = vec![vec![]; BANNER_ROWS];
        rows.push(vec![text("Rank"), text("Name")]);
        let err = extract(&Sheet::new(rows), &MarksAnalysis::default()).unwrap_err();

        match err {
            ParseError::MissingColumns(cols) => {
                assert!(cols.contains("Judge 1"));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_determinism() {
        let sheet = results_sheet(
            vec![vec![text("Category Cadet Women")]],
            vec![
                judged(1.0, "A", [90.0, 91.0, 89.0]),
                judged(2.0, "B", [85.0, 84.0, 86.0]),
            ],
        );
        let first = extract(&sheet, &MarksAnalysis::default()).unwrap();
        let second = extract(&sheet, &MarksAnalysis::default()).unwrap();

        assert_eq!(first.competitors, second.competitors);
        assert_eq!(first.category, second.category);
    }
}
