use scraper::{ElementRef, Selector};
use std::collections::HashMap;

/// Which cells of the first row carry the column names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderCells {
    #[default]
    Th,
    /// Some JobTracker tables render their header row with plain `td` cells
    Td,
}

impl HeaderCells {
    fn tag(&self) -> &'static str {
        match self {
            HeaderCells::Th => "th",
            HeaderCells::Td => "td",
        }
    }
}

/// An HTML table split into lower-cased headings and data rows of `td` cells.
///
/// Rows with fewer than two cells are spacers or decoration and are dropped.
/// Headings and cells are paired positionally; when the counts differ the
/// shorter side wins and the excess is ignored.
#[derive(Debug, Clone, Default)]
pub struct HtmlTable<'a> {
    headings: Vec<String>,
    rows: Vec<Vec<ElementRef<'a>>>,
}

impl<'a> HtmlTable<'a> {
    pub fn parse(table: ElementRef<'a>, header: HeaderCells) -> Self {
        let mut parsed = Self::default();

        let (Ok(row_selector), Ok(header_selector), Ok(cell_selector)) = (
            Selector::parse("tr"),
            Selector::parse(header.tag()),
            Selector::parse("td"),
        ) else {
            return parsed;
        };

        let mut rows = table.select(&row_selector);
        let Some(header_row) = rows.next() else {
            return parsed;
        };

        parsed.headings = header_row
            .select(&header_selector)
            .map(|cell| cell_text(cell).to_lowercase())
            .collect();

        parsed.rows = rows
            .map(|row| row.select(&cell_selector).collect::<Vec<_>>())
            .filter(|cells| cells.len() > 1)
            .collect();

        parsed
    }

    /// Data rows as raw cell elements, in document order
    pub fn rows(&self) -> &[Vec<ElementRef<'a>>] {
        &self.rows
    }

    /// Pair the headings with any per-row values.
    pub fn zip_row<T>(&self, values: impl IntoIterator<Item = T>) -> HashMap<String, T> {
        self.headings.iter().cloned().zip(values).collect()
    }

    /// Rows keyed by heading, keeping the cell elements for callers that need
    /// attributes or nested markup.
    pub fn records(&self) -> Vec<HashMap<String, ElementRef<'a>>> {
        self.rows
            .iter()
            .map(|cells| self.zip_row(cells.iter().copied()))
            .collect()
    }
}

/// Visible text of a cell, trimmed
pub fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
