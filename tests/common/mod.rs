//! Workbook fixtures written with `zip::ZipWriter`.
#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Cell style indexes declared by [`Xlsx::write`].
pub const STYLE_GENERAL: usize = 0;
pub const STYLE_DATE: usize = 1;
pub const STYLE_DATETIME: usize = 2;

fn write_package(path: &Path, entries: &[(&str, String)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Inline string cell.
pub fn text(reference: &str, value: &str) -> String {
    format!(r#"<c r="{reference}" t="inlineStr"><is><t>{}</t></is></c>"#, escape(value))
}

/// Shared string cell pointing at entry `index`.
pub fn shared(reference: &str, index: usize) -> String {
    format!(r#"<c r="{reference}" t="s"><v>{index}</v></c>"#)
}

pub fn number(reference: &str, value: &str) -> String {
    format!(r#"<c r="{reference}"><v>{value}</v></c>"#)
}

pub fn styled(reference: &str, style: usize, value: &str) -> String {
    format!(r#"<c r="{reference}" s="{style}"><v>{value}</v></c>"#)
}

pub fn boolean(reference: &str, value: bool) -> String {
    format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, if value { 1 } else { 0 })
}

/// Formula cell with its cached result.
pub fn formula(reference: &str, formula: &str, cached: &str) -> String {
    format!(r#"<c r="{reference}"><f>{}</f><v>{cached}</v></c>"#, escape(formula))
}

/// Formula cell with a cached string result.
pub fn string_formula(reference: &str, formula: &str, cached: &str) -> String {
    format!(r#"<c r="{reference}" t="str"><f>{}</f><v>{}</v></c>"#, escape(formula), escape(cached))
}

pub fn error(reference: &str, value: &str) -> String {
    format!(r#"<c r="{reference}" t="e"><v>{value}</v></c>"#)
}

pub fn row(number: usize, cells: &[String]) -> String {
    format!(r#"<row r="{number}">{}</row>"#, cells.concat())
}

/// A minimal SpreadsheetML package.
#[derive(Default)]
pub struct Xlsx {
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
    date1904: bool,
}

impl Xlsx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet(mut self, name: &str, rows: &[String]) -> Self {
        self.sheets.push((name.to_owned(), rows.concat()));
        self
    }

    /// Raw `<si>` bodies, e.g. `<t>Symbol</t>`.
    pub fn shared_strings(mut self, items: &[&str]) -> Self {
        self.shared_strings = items.iter().map(|item| item.to_string()).collect();
        self
    }

    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    pub fn write(&self, path: &Path) {
        let mut sheets = String::new();
        let mut relationships = String::new();
        let mut overrides = String::new();
        let mut entries = Vec::new();
        for (index, (name, rows)) in self.sheets.iter().enumerate() {
            let number = index + 1;
            sheets.push_str(&format!(r#"<sheet name="{}" sheetId="{number}" r:id="rId{number}"/>"#, escape(name)));
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{number}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{number}.xml"/>"#
            ));
            overrides.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{number}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
            entries.push((
                format!("xl/worksheets/sheet{number}.xml"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{rows}</sheetData></worksheet>"#
                ),
            ));
        }
        let styles_id = self.sheets.len() + 1;
        relationships.push_str(&format!(
            r#"<Relationship Id="rId{styles_id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
        ));

        let workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr date1904="{}"/><sheets>{sheets}</sheets></workbook>"#,
            if self.date1904 { 1 } else { 0 }
        );
        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
        );
        let styles = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd\ hh:mm"/></numFmts><cellStyleXfs count="1"><xf numFmtId="0"/></cellStyleXfs><cellXfs count="3"><xf numFmtId="0" xfId="0"/><xf numFmtId="14" xfId="0" applyNumberFormat="1"/><xf numFmtId="164" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#.to_owned();

        let mut package: Vec<(&str, String)> = vec![
            ("[Content_Types].xml", content_types),
            ("xl/workbook.xml", workbook),
            ("xl/_rels/workbook.xml.rels", format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{relationships}</Relationships>"#
            )),
            ("xl/styles.xml", styles),
        ];
        if !self.shared_strings.is_empty() {
            let items: String = self.shared_strings.iter().map(|item| format!("<si>{item}</si>")).collect();
            package.push(("xl/sharedStrings.xml", format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{items}</sst>"#,
                self.shared_strings.len()
            )));
        }
        for (name, content) in &entries {
            package.push((name.as_str(), content.to_owned()));
        }
        write_package(path, &package);
    }
}

/// An OpenDocument spreadsheet whose tables are given as raw `table:table-row` XML.
pub fn write_ods(path: &Path, tables: &[(&str, &str)]) {
    let tables: String = tables
        .iter()
        .map(|(name, rows)| format!(r#"<table:table table:name="{name}">{rows}</table:table>"#))
        .collect();
    let content = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><office:body><office:spreadsheet>{tables}</office:spreadsheet></office:body></office:document-content>"#
    );
    write_package(path, &[
        ("mimetype", "application/vnd.oasis.opendocument.spreadsheet".to_owned()),
        ("content.xml", content),
    ]);
}

/// The options sheet used across tests: shared string headers, two quotes.
pub fn options_workbook(path: &Path) {
    Xlsx::new()
        .shared_strings(&["<t>Symbol</t>", "<t>Strike</t>", "<t>Price</t>"])
        .sheet("Sheet1", &[
            row(1, &[shared("A1", 0), shared("B1", 1), shared("C1", 2)]),
            row(2, &[text("A2", "AAPL"), number("B2", "150"), number("C2", "2.35")]),
            row(3, &[text("A3", "MSFT"), number("B3", "300"), number("C3", "4.0999999999999996")]),
        ])
        .write(path);
}
