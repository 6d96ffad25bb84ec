//! Spreadsheet projection of the registry.

use anyhow::Context;
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook};
use sqlx::FromRow;

pub const SHEET_NAME: &str = "Users";
pub const FILE_NAME: &str = "users.xlsx";
pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Header and column width, in sheet order.
pub const COLUMNS: [(&str, f64); 13] = [
    ("User ID", 15.0),
    ("Name", 30.0),
    ("Email", 30.0),
    ("Phone", 15.0),
    ("Age", 10.0),
    ("Gender", 10.0),
    ("State", 15.0),
    ("Lga", 20.0),
    ("Community", 20.0),
    ("Religion", 15.0),
    ("Disability", 10.0),
    ("Physical Fitness", 15.0),
    ("Photo", 50.0),
];

#[derive(Debug, Clone, Default, FromRow)]
pub struct ExportRow {
    pub user_id: String,
    pub names: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub state: Option<String>,
    pub lga: Option<String>,
    pub community: Option<String>,
    pub religion: Option<String>,
    pub disability: Option<String>,
    pub physical_fitness: Option<String>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

impl ExportRow {
    /// Cells in `COLUMNS` order.
    pub fn cells(&self) -> [Cell<'_>; 13] {
        [
            Cell::Text(&self.user_id),
            Cell::Text(&self.names),
            text(&self.email),
            text(&self.phone_number),
            self.age.map_or(Cell::Blank, |a| Cell::Number(f64::from(a))),
            text(&self.sex),
            text(&self.state),
            text(&self.lga),
            text(&self.community),
            text(&self.religion),
            text(&self.disability),
            text(&self.physical_fitness),
            text(&self.photo),
        ]
    }
}

fn text(value: &Option<String>) -> Cell<'_> {
    value.as_deref().map_or(Cell::Blank, Cell::Text)
}

/// Serializes `rows` into an `.xlsx` workbook held in memory.
pub fn write_workbook(rows: &[ExportRow]) -> anyhow::Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new()
        .set_bold()
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(0xE0E0E0));

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).context("name worksheet")?;

    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.set_column_width(col, *width).context("set column width")?;
        sheet
            .write_string_with_format(0, col, *title, &header)
            .context("write header")?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = u32::try_from(i + 1).context("too many rows for a worksheet")?;
        for (col, cell) in row.cells().iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(r, col, *s).context("write cell")?;
                }
                Cell::Number(n) => {
                    sheet.write_number(r, col, *n).context("write cell")?;
                }
                Cell::Blank => {}
            }
        }
    }

    workbook.save_to_buffer().context("serialize workbook")
}
