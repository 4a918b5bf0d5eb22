//! XLSX reader
//!
//! Reads back what [`XlsxWriter`](crate::XlsxWriter) produces (and the same
//! subset from other producers): sheet order and visibility, cell values and
//! formulas, font styles, column widths and list validations.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use scorecard_core::{column_index, CellContent};

use crate::error::{XlsxError, XlsxResult};
use crate::workbook::{CellStyle, Workbook, Worksheet};

/// Sheet entry of `xl/workbook.xml`
struct SheetInfo {
    name: String,
    r_id: String,
    hidden: bool,
}

/// Cell being assembled while its element is open
#[derive(Default)]
struct PendingCell {
    reference: String,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    formula: Option<String>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let sheet_info = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::new();
        for info in sheet_info {
            let path = sheet_paths.get(&info.r_id).ok_or_else(|| {
                XlsxError::MissingPart(format!("relationship {} for sheet {}", info.r_id, info.name))
            })?;

            let mut worksheet = Worksheet::new(info.name.as_str());
            worksheet.set_visible(!info.hidden);
            Self::read_worksheet(&mut archive, path, &mut worksheet, &shared_strings)?;
            workbook.add_existing_worksheet(worksheet)?;
        }

        Ok(workbook)
    }

    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"t" if in_si => in_t = true,
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(std::mem::take(&mut current));
                        in_si = false;
                    }
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current.push_str(&e.unescape()?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    /// Read workbook.xml to get sheet names, rIds and visibility
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<SheetInfo>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let mut name = None;
                    let mut r_id = None;
                    let mut hidden = false;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"name" => name = Some(attr.unescape_value()?.to_string()),
                            b"r:id" => r_id = Some(attr.unescape_value()?.to_string()),
                            b"state" => {
                                hidden = attr.unescape_value()? != "visible";
                            }
                            _ => {}
                        }
                    }

                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push(SheetInfo { name, r_id, hidden });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => id = Some(attr.unescape_value()?.to_string()),
                            b"Target" => target = Some(attr.unescape_value()?.to_string()),
                            b"Type" => rel_type = Some(attr.unescape_value()?.to_string()),
                            _ => {}
                        }
                    }

                    // Only include worksheet relationships
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to xl/ folder
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet from the archive
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(false);

        let mut buf = Vec::new();

        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;
        let mut in_formula = false;
        let mut in_inline_text = false;

        let mut validation_sqref: Option<String> = None;
        let mut in_dv_formula1 = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"c" => cell = Some(Self::parse_cell_attrs(&e)?),
                    b"v" if cell.is_some() => in_value = true,
                    b"f" if cell.is_some() => in_formula = true,
                    b"t" if cell.is_some() => in_inline_text = true,
                    b"dataValidation" => {
                        validation_sqref = Self::list_validation_sqref(&e)?;
                    }
                    b"formula1" if validation_sqref.is_some() => in_dv_formula1 = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"c" => {
                        let pending = Self::parse_cell_attrs(&e)?;
                        Self::process_cell(worksheet, pending, shared_strings)?;
                    }
                    b"col" => Self::parse_col(&e, worksheet)?,
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    let text = e.unescape()?;
                    if let Some(pending) = cell.as_mut() {
                        if in_value || in_inline_text {
                            pending
                                .value
                                .get_or_insert_with(String::new)
                                .push_str(&text);
                        } else if in_formula {
                            pending
                                .formula
                                .get_or_insert_with(String::new)
                                .push_str(&text);
                        }
                    } else if in_dv_formula1 {
                        if let Some(sqref) = validation_sqref.as_deref() {
                            for target in sqref.split_whitespace() {
                                let (row, col) = parse_cell_ref(target)?;
                                worksheet.add_list_validation(row, col, text.to_string());
                            }
                        }
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            Self::process_cell(worksheet, pending, shared_strings)?;
                        }
                    }
                    b"v" => in_value = false,
                    b"f" => in_formula = false,
                    b"t" => in_inline_text = false,
                    b"formula1" => in_dv_formula1 = false,
                    b"dataValidation" => validation_sqref = None,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn parse_cell_attrs(e: &BytesStart) -> XlsxResult<PendingCell> {
        let mut pending = PendingCell::default();
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => pending.reference = attr.unescape_value()?.to_string(),
                b"t" => pending.cell_type = Some(attr.unescape_value()?.to_string()),
                b"s" => pending.style = attr.unescape_value()?.parse().unwrap_or(0),
                _ => {}
            }
        }
        if pending.reference.is_empty() {
            return Err(XlsxError::InvalidFormat("cell without reference".into()));
        }
        Ok(pending)
    }

    /// Sqref of a list validation, `None` for other validation types
    fn list_validation_sqref(e: &BytesStart) -> XlsxResult<Option<String>> {
        let mut is_list = false;
        let mut sqref = None;
        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"type" => is_list = attr.unescape_value()? == "list",
                b"sqref" => sqref = Some(attr.unescape_value()?.to_string()),
                _ => {}
            }
        }
        Ok(sqref.filter(|_| is_list))
    }

    fn parse_col(e: &BytesStart, worksheet: &mut Worksheet) -> XlsxResult<()> {
        let mut min = None;
        let mut max = None;
        let mut width = None;
        let mut custom = false;
        let mut hidden = false;
        for attr in e.attributes().flatten() {
            let value = attr.unescape_value()?;
            match attr.key.as_ref() {
                b"min" => min = value.parse::<u32>().ok(),
                b"max" => max = value.parse::<u32>().ok(),
                b"width" => width = value.parse::<f64>().ok(),
                b"customWidth" => custom = value == "1" || value == "true",
                b"hidden" => hidden = value == "1" || value == "true",
                _ => {}
            }
        }

        let (Some(min), Some(max)) = (min, max) else {
            return Err(XlsxError::InvalidFormat("col without min/max".into()));
        };
        for col in min..=max {
            if custom {
                if let Some(width) = width {
                    worksheet.set_column_width(col, width);
                }
            }
            if hidden {
                worksheet.set_column_hidden(col, true);
            }
        }
        Ok(())
    }

    /// Process a cell and add it to the worksheet
    fn process_cell(
        worksheet: &mut Worksheet,
        cell: PendingCell,
        shared_strings: &[String],
    ) -> XlsxResult<()> {
        let (row, col) = parse_cell_ref(&cell.reference)?;

        let content = if let Some(formula) = cell.formula {
            CellContent::formula(formula)
        } else if let Some(value) = cell.value {
            match cell.cell_type.as_deref() {
                // Shared string
                Some("s") => {
                    let idx: usize = value.parse().map_err(|_| {
                        XlsxError::InvalidFormat(format!("Invalid shared string index: {}", value))
                    })?;
                    let s = shared_strings.get(idx).ok_or_else(|| {
                        XlsxError::InvalidFormat(format!(
                            "Shared string index {} out of bounds",
                            idx
                        ))
                    })?;
                    CellContent::Text(s.clone())
                }
                Some("b") => CellContent::Text(
                    if value == "1" { "TRUE" } else { "FALSE" }.to_string(),
                ),
                None | Some("n") => match value.parse::<f64>() {
                    Ok(n) => CellContent::Number(n),
                    Err(_) => CellContent::Text(value),
                },
                // inlineStr, str, e and anything unknown
                Some(_) => CellContent::Text(value),
            }
        } else if matches!(cell.cell_type.as_deref(), Some("inlineStr") | Some("str")) {
            // `<is><t></t></is>` carries no text event
            CellContent::Text(String::new())
        } else {
            CellContent::Empty
        };

        worksheet.set_cell(row, col, content, CellStyle::from_xf_id(cell.style));
        Ok(())
    }
}

/// Parse an unqualified A1 reference (`C12`) into 1-based `(row, col)`
pub fn parse_cell_ref(reference: &str) -> XlsxResult<(u32, u32)> {
    let reference = reference.replace('$', "");
    let split = reference
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| XlsxError::InvalidFormat(format!("invalid cell reference '{}'", reference)))?;
    let (letters, digits) = reference.split_at(split);
    let col = column_index(letters)?;
    let row = digits
        .parse::<u32>()
        .ok()
        .filter(|&r| r > 0)
        .ok_or_else(|| XlsxError::InvalidFormat(format!("invalid cell reference '{}'", reference)))?;
    Ok((row, col))
}
