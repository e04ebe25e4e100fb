//! Row/cell access for ASP.NET grid tables (`#GridViewN > tbody > tr`)

use scraper::{ElementRef, Html, Selector};

use super::{element_text, selector, ParsingError, ParsingResult};

/// Walks the body rows of one table identified by its element id.
///
/// The first row holds the column headers and is skipped.
pub struct TableExtractor {
    table_id: String,
    table: Selector,
    rows: Selector,
    cells: Vec<Selector>,
}

impl TableExtractor {
    /// Extractor for `#table_id` with `columns` addressable cells per row
    pub fn new(table_id: &str, columns: usize) -> ParsingResult<Self> {
        let cells = (1..=columns)
            .map(|n| selector(&format!("td:nth-child({n})")))
            .collect::<ParsingResult<Vec<_>>>()?;
        Ok(Self {
            table_id: table_id.to_string(),
            table: selector(&format!("#{table_id}"))?,
            rows: selector(&format!("#{table_id} > tbody > tr"))?,
            cells,
        })
    }

    /// Data rows of the table; an error when the table is missing altogether
    pub fn body_rows<'a>(&self, html: &'a Html) -> ParsingResult<Vec<ElementRef<'a>>> {
        if html.select(&self.table).next().is_none() {
            return Err(ParsingError::table_not_found(&format!("#{}", self.table_id)));
        }
        Ok(html.select(&self.rows).skip(1).collect())
    }

    /// Text of the 1-based `column` cell, empty when the row is shorter
    pub fn cell_text(&self, row: &ElementRef<'_>, column: usize) -> String {
        self.cell(row, column).map(|cell| element_text(&cell)).unwrap_or_default()
    }

    /// The 1-based `column` cell element
    pub fn cell<'a>(&self, row: &ElementRef<'a>, column: usize) -> Option<ElementRef<'a>> {
        let selector = self.cells.get(column.checked_sub(1)?)?;
        row.select(selector).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <table id="GridView9">
            <tr><th>A</th><th>B</th></tr>
            <tr><td>1</td><td>one</td></tr>
            <tr><td>2</td></tr>
        </table>"#;

    #[test]
    fn skips_header_row() {
        let html = Html::parse_document(PAGE);
        let table = TableExtractor::new("GridView9", 2).unwrap();
        let rows = table.body_rows(&html).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(table.cell_text(&rows[0], 2), "one");
        assert_eq!(table.cell_text(&rows[1], 2), "");
        assert_eq!(table.cell_text(&rows[1], 3), "");
    }

    #[test]
    fn missing_table_is_an_error() {
        let html = Html::parse_document("<p>maintenance</p>");
        let table = TableExtractor::new("GridView1", 8).unwrap();
        assert_eq!(
            table.body_rows(&html).unwrap_err(),
            ParsingError::TableNotFound {
                selector: "#GridView1".into()
            }
        );
    }
}
