//! [`Table`] to XLSX serialization.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use slidetext_core::{CellValue, Error, Result, Table};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const SHEET_NAME: &str = "Sheet1";
const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Write `table` as a single-sheet workbook.
pub fn write_table<W: Write + Seek>(table: &Table, writer: W) -> Result<W> {
    let sheet = sheet_xml(table)?;
    let workbook = workbook_xml();

    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("xl/workbook.xml", workbook.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.as_bytes()),
        ("xl/styles.xml", STYLES_XML.as_bytes()),
        ("xl/worksheets/sheet1.xml", &sheet),
    ];

    for (name, data) in parts {
        zip.start_file(name, options)
            .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
        zip.write_all(data)?;
    }

    zip.finish()
        .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))
}

/// Serialize `table` as XLSX bytes.
pub fn table_to_bytes(table: &Table) -> Result<Vec<u8>> {
    Ok(write_table(table, Cursor::new(Vec::new()))?.into_inner())
}

/// Save `table` to `path`. The workbook is built in memory first, so a
/// failure never leaves a partial file behind.
pub fn save_table(table: &Table, path: &Path) -> Result<()> {
    let bytes = table_to_bytes(table)?;
    std::fs::write(path, bytes)?;
    log::debug!(
        "Wrote {} rows x {} columns to {}",
        table.height(),
        table.width(),
        path.display()
    );
    Ok(())
}

fn workbook_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<workbook xmlns="{}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
        ),
        MAIN_NS, SHEET_NAME
    )
}

fn sheet_xml(table: &Table) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());

    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))),
    )?;

    let mut worksheet = BytesStart::new("worksheet");
    worksheet.push_attribute(("xmlns", MAIN_NS));
    write(&mut writer, Event::Start(worksheet))?;
    write(&mut writer, Event::Start(BytesStart::new("sheetData")))?;

    let header_row: Vec<CellValue> = table
        .columns
        .iter()
        .map(|c| CellValue::Text(c.header.clone()))
        .collect();
    write_row(&mut writer, 1, header_row.iter())?;

    for (idx, row) in table.rows().enumerate() {
        write_row(&mut writer, idx + 2, row.into_iter())?;
    }

    write(&mut writer, Event::End(BytesEnd::new("sheetData")))?;
    write(&mut writer, Event::End(BytesEnd::new("worksheet")))?;

    Ok(writer.into_inner())
}

fn write_row<'a>(
    writer: &mut Writer<Vec<u8>>,
    number: usize,
    cells: impl Iterator<Item = &'a CellValue>,
) -> Result<()> {
    let number_text = number.to_string();
    let mut row = BytesStart::new("row");
    row.push_attribute(("r", number_text.as_str()));
    write(writer, Event::Start(row))?;

    for (col, value) in cells.enumerate() {
        let reference = format!("{}{}", column_name(col), number);
        write_cell(writer, &reference, value)?;
    }

    write(writer, Event::End(BytesEnd::new("row")))
}

fn write_cell(writer: &mut Writer<Vec<u8>>, reference: &str, value: &CellValue) -> Result<()> {
    let (kind, text) = match value {
        CellValue::Empty => return Ok(()),
        CellValue::Text(s) => ("inlineStr", sanitize(s)),
        CellValue::Int(i) => ("n", i.to_string()),
        CellValue::Float(f) if f.is_finite() => ("n", f.to_string()),
        CellValue::Float(f) => ("inlineStr", f.to_string()),
        CellValue::Bool(b) => ("b", if *b { "1" } else { "0" }.to_string()),
    };

    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference));
    if kind != "n" {
        cell.push_attribute(("t", kind));
    }
    write(writer, Event::Start(cell))?;

    if kind == "inlineStr" {
        write(writer, Event::Start(BytesStart::new("is")))?;
        let mut t = BytesStart::new("t");
        t.push_attribute(("xml:space", "preserve"));
        write(writer, Event::Start(t))?;
        write(writer, Event::Text(BytesText::new(&text)))?;
        write(writer, Event::End(BytesEnd::new("t")))?;
        write(writer, Event::End(BytesEnd::new("is")))?;
    } else {
        write(writer, Event::Start(BytesStart::new("v")))?;
        write(writer, Event::Text(BytesText::new(&text)))?;
        write(writer, Event::End(BytesEnd::new("v")))?;
    }

    write(writer, Event::End(BytesEnd::new("c")))
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::XmlError(format!("failed to write worksheet: {}", e)))
}

/// Drop characters that XML 1.0 cannot carry, such as vertical tabs.
fn sanitize(text: &str) -> String {
    let allowed = |c: char| {
        matches!(c, '\t' | '\n' | '\r')
            || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
    };

    if text.chars().all(allowed) {
        return text.to_string();
    }

    log::warn!("Dropping characters not allowed in XML from cell text");
    text.chars().filter(|&c| allowed(c)).collect()
}

/// Spreadsheet column letters for a 0-based column index.
fn column_name(mut idx: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_table_from_reader;
    use slidetext_core::Column;

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(3), "D");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("a\u{b}b\nc"), "ab\nc");
        assert_eq!(sanitize("Xin chào"), "Xin chào");
    }

    #[test]
    fn test_write_then_read() {
        let table = Table::new(vec![
            Column::new("Slide", vec![CellValue::Int(1), CellValue::Int(2)]),
            Column::new("ShapeIndex", vec!["0.1".into(), "3".into()]),
            Column::new(
                "OriginalText",
                vec!["Dòng một\nDòng hai".into(), "  spaced  ".into()],
            ),
            Column::new("TranslatedText", vec![CellValue::Empty, "<b> & \"q\"".into()]),
        ]);

        let bytes = table_to_bytes(&table).unwrap();
        let read = read_table_from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(
            read.headers(),
            vec!["Slide", "ShapeIndex", "OriginalText", "TranslatedText"]
        );
        assert_eq!(read.height(), 2);
        assert_eq!(read.cell(1, 0).as_index(), Some(2));
        assert_eq!(read.cell(0, 1), &CellValue::from("0.1"));
        assert_eq!(read.cell(0, 2), &CellValue::from("Dòng một\nDòng hai"));
        assert_eq!(read.cell(1, 2), &CellValue::from("  spaced  "));
        assert!(read.cell(0, 3).is_blank());
        assert_eq!(read.cell(1, 3), &CellValue::from("<b> & \"q\""));
    }

    #[test]
    fn test_header_only_table() {
        let table = Table::new(vec![
            Column::new("Slide", vec![]),
            Column::new("ShapeIndex", vec![]),
        ]);
        let bytes = table_to_bytes(&table).unwrap();
        let read = read_table_from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(read.headers(), vec!["Slide", "ShapeIndex"]);
        assert_eq!(read.height(), 0);
    }
}
