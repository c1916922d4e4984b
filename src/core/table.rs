use crate::core::markup::{MarkupConverter, MarkupDocument};
use crate::domain::model::Record;
use crate::utils::error::Result;
use std::io::Write;
use unicode_width::UnicodeWidthStr;

const ITEM_TAG: &str = "item";
const LINE_PREFIX: &str = "  ";

/// 將記錄列表轉成對齊的文字表格或 XML
#[derive(Debug, Clone)]
pub struct TableGenerator {
    records: Vec<Record>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
    converter: MarkupConverter,
    dedup_rows: bool,
}

impl TableGenerator {
    pub fn new(records: Vec<Record>, headers: Vec<String>) -> Self {
        Self::with_converter(records, headers, MarkupConverter::default())
    }

    pub fn with_converter(
        records: Vec<Record>,
        headers: Vec<String>,
        converter: MarkupConverter,
    ) -> Self {
        let mut widths = vec![0; headers.len()];
        update_widths(&mut widths, &headers);

        let mut rows = Vec::with_capacity(records.len());
        for record in &records {
            let row: Vec<String> = headers
                .iter()
                .map(|header| column_value(&converter, record, header))
                .collect();
            update_widths(&mut widths, &row);
            rows.push(row);
        }

        tracing::debug!(
            "Built table with {} rows, column widths {:?}",
            rows.len(),
            widths
        );

        Self {
            records,
            headers,
            rows,
            widths,
            converter,
            dedup_rows: false,
        }
    }

    /// Collapse identical rows into one when rendering the table.
    pub fn dedup_rows(mut self, enabled: bool) -> Self {
        self.dedup_rows = enabled;
        self
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Extracted rows in input order, untrimmed.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    fn line<'a>(&self, cells: impl Iterator<Item = &'a str>) -> String {
        let mut output = String::from(LINE_PREFIX);
        for (cell, width) in cells.zip(&self.widths) {
            output.push_str(cell);
            let padding = width.saturating_sub(cell.width());
            output.extend(std::iter::repeat(' ').take(padding));
        }
        output
    }

    /// Upper-cased header line, then the rows sorted by their full tuple of values.
    pub fn render_table(&self) -> String {
        let upper: Vec<String> = self.headers.iter().map(|h| h.to_uppercase()).collect();
        let mut output = self.line(upper.iter().map(String::as_str));
        output.push('\n');

        let mut rows = self.rows.clone();
        rows.sort();
        if self.dedup_rows {
            rows.dedup();
        }

        for row in rows {
            let cells: Vec<String> = row.iter().map(|cell| trim_cell(cell)).collect();
            output.push_str(&self.line(cells.iter().map(String::as_str)));
            output.push('\n');
        }
        output
    }

    pub fn write_table<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.render_table().as_bytes())?;
        Ok(())
    }

    pub fn print_table(&self) -> Result<()> {
        self.write_table(&mut std::io::stdout().lock())
    }

    /// Every record wrapped in `<item>` and pretty printed, one document each.
    pub fn render_xml(&self) -> Result<String> {
        let mut output = String::new();
        for record in &self.records {
            let document = MarkupDocument::from_root(self.converter.element(ITEM_TAG, record));
            output.push_str(&document.to_pretty_xml()?);
            output.push('\n');
        }
        Ok(output)
    }

    pub fn write_xml<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.render_xml()?.as_bytes())?;
        Ok(())
    }

    pub fn print_xml(&self) -> Result<()> {
        self.write_xml(&mut std::io::stdout().lock())
    }
}

/// Column text: empty when absent, the element text when unique, the trimmed
/// texts comma-joined when the field repeats.
pub fn column_value(converter: &MarkupConverter, record: &Record, column: &str) -> String {
    let mut texts = converter.descendant_texts(record, column);
    match texts.len() {
        0 => String::new(),
        1 => texts.remove(0),
        _ => texts
            .iter()
            .map(|text| text.trim())
            .collect::<Vec<_>>()
            .join(","),
    }
}

fn trim_cell(cell: &str) -> String {
    cell.replace('\n', "").trim_matches(' ').to_string()
}

fn update_widths(widths: &mut [usize], row: &[String]) {
    for (width, cell) in widths.iter_mut().zip(row) {
        let len = trim_cell(cell).width();
        if len + 1 > *width {
            *width = len + 1;
        }
    }
}
