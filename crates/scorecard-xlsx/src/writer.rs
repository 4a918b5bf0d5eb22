//! XLSX writer
//!
//! Parts are built as XML strings and stored deflated. Every entry carries
//! the same fixed timestamp, so writing the same workbook twice produces
//! identical bytes.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use scorecard_core::column_letters;
use tracing::debug;
use zip::write::SimpleFileOptions;

use crate::error::{XlsxError, XlsxResult};
use crate::workbook::{ConditionalFormat, Workbook, Worksheet};

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to an in-memory buffer
    pub fn write_to_vec(workbook: &Workbook) -> XlsxResult<Vec<u8>> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        Self::write(workbook, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.sheet_count() == 0 {
            return Err(XlsxError::InvalidFormat(
                "a workbook needs at least one sheet".into(),
            ));
        }

        let mut zip = zip::ZipWriter::new(writer);

        // Highlight fills become differential formats, numbered workbook-wide
        let dxf_fills = Self::collect_dxf_fills(workbook);

        Self::write_content_types(&mut zip, workbook)?;
        Self::write_root_rels(&mut zip)?;
        Self::write_workbook_xml(&mut zip, workbook)?;
        Self::write_workbook_rels(&mut zip, workbook)?;
        Self::write_styles_xml(&mut zip, &dxf_fills)?;

        for (i, sheet) in workbook.worksheets().enumerate() {
            Self::write_worksheet(&mut zip, sheet, i, &dxf_fills)?;
        }

        zip.finish()?;
        debug!(sheets = workbook.sheet_count(), "workbook serialized");
        Ok(())
    }

    fn file_options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default())
    }

    fn collect_dxf_fills(workbook: &Workbook) -> Vec<String> {
        let mut fills: Vec<String> = Vec::new();
        for sheet in workbook.worksheets() {
            for format in sheet.conditional_formats() {
                if let ConditionalFormat::HighlightText { fill, .. } = format {
                    if !fills.contains(fill) {
                        fills.push(fill.clone());
                    }
                }
            }
        }
        fills
    }

    fn write_content_types<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        zip.start_file("[Content_Types].xml", Self::file_options())?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i + 1
            ));
        }

        content.push_str("\n</Types>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_root_rels<W: Write + Seek>(zip: &mut zip::ZipWriter<W>) -> XlsxResult<()> {
        zip.start_file("_rels/.rels", Self::file_options())?;

        let content = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        zip.start_file("xl/workbook.xml", Self::file_options())?;

        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <bookViews>
        <workbookView activeTab="{}"/>
    </bookViews>
    <sheets>"#,
            workbook.first_visible_sheet()
        );

        for (i, sheet) in workbook.worksheets().enumerate() {
            let state = if sheet.is_visible() {
                ""
            } else {
                r#" state="hidden""#
            };
            content.push_str(&format!(
                r#"
        <sheet name="{}" sheetId="{}"{} r:id="rId{}"/>"#,
                Self::escape_xml(sheet.name()),
                i + 1,
                state,
                i + 1
            ));
        }

        // Formulas are stored without cached values; ask for a recalculation
        content.push_str(
            r#"
    </sheets>
    <calcPr calcId="191029" fullCalcOnLoad="1"/>
</workbook>"#,
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_workbook_rels<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        workbook: &Workbook,
    ) -> XlsxResult<()> {
        zip.start_file("xl/_rels/workbook.xml.rels", Self::file_options())?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for i in 0..workbook.sheet_count() {
            content.push_str(&format!(
                r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i + 1,
                i + 1
            ));
        }

        // Styles relationship
        let styles_rid = workbook.sheet_count() + 1;
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            styles_rid
        ));

        content.push_str(
            r#"
</Relationships>"#,
        );

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    /// Fonts: regular, bold, italic. `cellXfs` follows
    /// [`CellStyle::xf_id`](crate::CellStyle::xf_id).
    fn write_styles_xml<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        dxf_fills: &[String],
    ) -> XlsxResult<()> {
        zip.start_file("xl/styles.xml", Self::file_options())?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
    <fonts count="3">
        <font><sz val="11"/><name val="Calibri"/><family val="2"/></font>
        <font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font>
        <font><i/><sz val="11"/><name val="Calibri"/><family val="2"/></font>
    </fonts>
    <fills count="2">
        <fill><patternFill patternType="none"/></fill>
        <fill><patternFill patternType="gray125"/></fill>
    </fills>
    <borders count="1">
        <border><left/><right/><top/><bottom/><diagonal/></border>
    </borders>
    <cellStyleXfs count="1">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
    </cellStyleXfs>
    <cellXfs count="3">
        <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
        <xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>
        <xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0" applyFont="1"/>
    </cellXfs>
    <cellStyles count="1">
        <cellStyle name="Normal" xfId="0" builtinId="0"/>
    </cellStyles>"#,
        );

        content.push_str(&format!("\n    <dxfs count=\"{}\">", dxf_fills.len()));
        for fill in dxf_fills {
            content.push_str(&format!(
                "\n        <dxf><fill><patternFill patternType=\"solid\"><fgColor rgb=\"{0}\"/><bgColor rgb=\"{0}\"/></patternFill></fill></dxf>",
                Self::escape_xml(fill)
            ));
        }
        content.push_str("\n    </dxfs>\n</styleSheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_worksheet<W: Write + Seek>(
        zip: &mut zip::ZipWriter<W>,
        sheet: &Worksheet,
        index: usize,
        dxf_fills: &[String],
    ) -> XlsxResult<()> {
        zip.start_file(
            format!("xl/worksheets/sheet{}.xml", index + 1),
            Self::file_options(),
        )?;

        let mut content = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        Self::write_columns(&mut content, sheet);

        content.push_str("\n    <sheetData>");

        // Write cell data (sparse, row-major)
        let mut current_row: Option<u32> = None;
        for (row, col, cell) in sheet.iter_cells() {
            if cell.value.is_empty() && cell.style.xf_id() == 0 {
                continue;
            }

            if current_row != Some(row) {
                // Close previous row
                if current_row.is_some() {
                    content.push_str("\n        </row>");
                }
                content.push_str(&format!("\n        <row r=\"{}\">", row));
                current_row = Some(row);
            }

            let cell_ref = format!("{}{}", column_letters(col), row);
            let xf_id = cell.style.xf_id();
            let style_attr = if xf_id != 0 {
                format!(" s=\"{}\"", xf_id)
            } else {
                String::new()
            };

            match &cell.value {
                scorecard_core::CellContent::Number(n) => {
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{}><v>{}</v></c>",
                        cell_ref, style_attr, n
                    ));
                }
                scorecard_core::CellContent::Text(s) => {
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                        cell_ref,
                        style_attr,
                        Self::escape_xml(s.as_str())
                    ));
                }
                scorecard_core::CellContent::Formula(text) => {
                    let formula_text = text.strip_prefix('=').unwrap_or(text);
                    content.push_str(&format!(
                        "\n            <c r=\"{}\"{}><f>{}</f></c>",
                        cell_ref,
                        style_attr,
                        Self::escape_xml(formula_text)
                    ));
                }
                scorecard_core::CellContent::Empty => {
                    // Preserve style-only cells
                    content.push_str(&format!("\n            <c r=\"{}\"{}/>", cell_ref, style_attr));
                }
            }
        }

        if current_row.is_some() {
            content.push_str("\n        </row>");
        }

        content.push_str("\n    </sheetData>");

        Self::write_conditional_formatting(&mut content, sheet, dxf_fills);
        Self::write_data_validations(&mut content, sheet);

        content.push_str("\n</worksheet>");

        zip.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_columns(content: &mut String, sheet: &Worksheet) {
        let columns: Vec<_> = sheet.columns().collect();
        if columns.is_empty() {
            return;
        }

        content.push_str("\n    <cols>");
        for (col, info) in columns {
            let width = info.width.unwrap_or(9.140625);
            let custom = if info.width.is_some() {
                " customWidth=\"1\""
            } else {
                ""
            };
            let hidden = if info.hidden { " hidden=\"1\"" } else { "" };
            content.push_str(&format!(
                "\n        <col min=\"{0}\" max=\"{0}\" width=\"{1}\"{2}{3}/>",
                col, width, custom, hidden
            ));
        }
        content.push_str("\n    </cols>");
    }

    fn write_conditional_formatting(content: &mut String, sheet: &Worksheet, dxf_fills: &[String]) {
        for (i, format) in sheet.conditional_formats().iter().enumerate() {
            let priority = i + 1;
            match format {
                ConditionalFormat::ColorScale { sqref, stops } => {
                    content.push_str(&format!(
                        "\n    <conditionalFormatting sqref=\"{}\">\n        <cfRule type=\"colorScale\" priority=\"{}\">\n            <colorScale>",
                        Self::escape_xml(sqref),
                        priority
                    ));
                    for (value, _) in stops {
                        content.push_str(&format!(
                            "\n                <cfvo type=\"num\" val=\"{}\"/>",
                            value
                        ));
                    }
                    for (_, color) in stops {
                        content.push_str(&format!(
                            "\n                <color rgb=\"{}\"/>",
                            Self::escape_xml(color)
                        ));
                    }
                    content.push_str(
                        "\n            </colorScale>\n        </cfRule>\n    </conditionalFormatting>",
                    );
                }
                ConditionalFormat::HighlightText { sqref, text, fill } => {
                    let dxf_id = dxf_fills.iter().position(|f| f == fill).unwrap_or(0);
                    let literal = format!("\"{}\"", text.replace('"', "\"\""));
                    content.push_str(&format!(
                        "\n    <conditionalFormatting sqref=\"{}\">\n        <cfRule type=\"cellIs\" operator=\"equal\" priority=\"{}\" dxfId=\"{}\">\n            <formula>{}</formula>\n        </cfRule>\n    </conditionalFormatting>",
                        Self::escape_xml(sqref),
                        priority,
                        dxf_id,
                        Self::escape_xml(&literal)
                    ));
                }
            }
        }
    }

    fn write_data_validations(content: &mut String, sheet: &Worksheet) {
        let validations = sheet.list_validations();
        if validations.is_empty() {
            return;
        }

        content.push_str(&format!(
            "\n    <dataValidations count=\"{}\">",
            validations.len()
        ));

        for validation in validations {
            let (row, col) = validation.cell;
            let source = validation
                .source
                .strip_prefix('=')
                .unwrap_or(&validation.source);
            content.push_str(&format!(
                "\n        <dataValidation type=\"list\" allowBlank=\"1\" showErrorMessage=\"1\" sqref=\"{}{}\">\n            <formula1>{}</formula1>\n        </dataValidation>",
                column_letters(col),
                row,
                Self::escape_xml(source)
            ));
        }

        content.push_str("\n    </dataValidations>");
    }

    fn escape_xml(s: &str) -> String {
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
    }
}
