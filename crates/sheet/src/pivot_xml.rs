//! Embeds pivot table parts into an XLSX package produced by rust_xlsxwriter.
//!
//! Each pivot table gets a `pivotCacheDefinition` part (no cached records,
//! `refreshOnLoad="1"`) and a `pivotTable` part, linked through the workbook
//! and destination worksheet relationships. Untouched parts are raw-copied.

use crate::error::{Result, SheetError};
use crate::pivot::PivotTable;
use quick_xml::escape::escape;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PACKAGE_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_PIVOT_TABLE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/pivotTable";
const REL_PIVOT_CACHE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/pivotCacheDefinition";
const CT_PIVOT_TABLE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.pivotTable+xml";
const CT_PIVOT_CACHE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.pivotCacheDefinition+xml";
const DEFAULT_STYLE: &str = "PivotStyleLight16";

fn cache_definition_part(n: usize) -> String {
    format!("xl/pivotCache/pivotCacheDefinition{n}.xml")
}

fn pivot_table_part(n: usize) -> String {
    format!("xl/pivotTables/pivotTable{n}.xml")
}

fn pivot_table_rels_part(n: usize) -> String {
    format!("xl/pivotTables/_rels/pivotTable{n}.xml.rels")
}

fn worksheet_rels_part(sheet_index: usize) -> String {
    format!("xl/worksheets/_rels/sheet{}.xml.rels", sheet_index + 1)
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Build `xl/pivotCache/pivotCacheDefinitionN.xml`.
pub(crate) fn cache_definition_xml(pivot: &PivotTable) -> String {
    let source = &pivot.options.data_range;
    let mut xml = String::from(XML_DECL);
    xml.push_str(&format!(
        r#"<pivotCacheDefinition xmlns="{NS_MAIN}" xmlns:r="{NS_REL}" saveData="0" refreshOnLoad="1" createdVersion="3" refreshedVersion="3" minRefreshableVersion="3" recordCount="{}">"#,
        pivot.record_count()
    ));
    xml.push_str(&format!(
        r#"<cacheSource type="worksheet"><worksheetSource ref="{}" sheet="{}"/></cacheSource>"#,
        source.rect.to_a1_range(),
        escape(source.sheet.as_str())
    ));
    xml.push_str(&format!(r#"<cacheFields count="{}">"#, pivot.cache_fields.len()));
    for field in &pivot.cache_fields {
        xml.push_str(&format!(
            r#"<cacheField name="{}" numFmtId="0"><sharedItems containsBlank="1" count="1"><m/></sharedItems></cacheField>"#,
            escape(field.as_str())
        ));
    }
    xml.push_str("</cacheFields></pivotCacheDefinition>");
    xml
}

/// Build `xl/pivotTables/pivotTableN.xml` for cache `cache_id`.
pub(crate) fn pivot_table_xml(pivot: &PivotTable, n: usize, cache_id: usize) -> String {
    let opts = &pivot.options;
    let default_name = format!("PivotTable{n}");
    let name = opts.name.as_deref().unwrap_or(&default_name);

    let mut xml = String::from(XML_DECL);
    xml.push_str(&format!(
        r#"<pivotTableDefinition xmlns="{NS_MAIN}" name="{}" cacheId="{cache_id}" applyNumberFormats="0" applyBorderFormats="0" applyFontFormats="0" applyPatternFormats="0" applyAlignmentFormats="0" applyWidthHeightFormats="1" dataCaption="Values" updatedVersion="3" minRefreshableVersion="3" showDrill="{}" useAutoFormatting="1" itemPrintTitles="1" createdVersion="3" indent="0" outline="1" outlineData="1" multipleFieldFilters="0" rowGrandTotals="{}" colGrandTotals="{}">"#,
        escape(name),
        flag(opts.show_drill),
        flag(opts.row_grand_totals),
        flag(opts.col_grand_totals),
    ));
    xml.push_str(&format!(
        r#"<location ref="{}" firstHeaderRow="1" firstDataRow="1" firstDataCol="1"/>"#,
        opts.pivot_table_range.rect.to_a1_range()
    ));

    xml.push_str(&format!(r#"<pivotFields count="{}">"#, pivot.cache_fields.len()));
    for idx in 0..pivot.cache_fields.len() {
        let row_pos = pivot.row_field_indices.iter().position(|&i| i == idx);
        let is_data = pivot.data_field_indices.contains(&idx);
        let mut attrs = String::new();
        if row_pos.is_some() {
            attrs.push_str(r#" axis="axisRow""#);
        }
        if is_data {
            attrs.push_str(r#" dataField="1""#);
        }
        match row_pos {
            Some(pos) => {
                if opts.rows[pos].default_subtotal {
                    xml.push_str(&format!(
                        r#"<pivotField{attrs} showAll="0"><items count="2"><item x="0"/><item t="default"/></items></pivotField>"#
                    ));
                } else {
                    xml.push_str(&format!(
                        r#"<pivotField{attrs} showAll="0" defaultSubtotal="0"><items count="1"><item x="0"/></items></pivotField>"#
                    ));
                }
            }
            None => xml.push_str(&format!(r#"<pivotField{attrs} showAll="0"/>"#)),
        }
    }
    xml.push_str("</pivotFields>");

    if !pivot.row_field_indices.is_empty() {
        xml.push_str(&format!(
            r#"<rowFields count="{}">"#,
            pivot.row_field_indices.len()
        ));
        for idx in &pivot.row_field_indices {
            xml.push_str(&format!(r#"<field x="{idx}"/>"#));
        }
        xml.push_str("</rowFields>");
    }
    xml.push_str(r#"<rowItems count="1"><i/></rowItems>"#);

    // Several value fields are laid out side by side via the virtual "Values" field
    if pivot.data_field_indices.len() > 1 {
        xml.push_str(r#"<colFields count="1"><field x="-2"/></colFields>"#);
    }

    xml.push_str(&format!(r#"<dataFields count="{}">"#, opts.data.len()));
    for (field, idx) in opts.data.iter().zip(&pivot.data_field_indices) {
        xml.push_str(&format!(
            r#"<dataField name="{}" fld="{idx}" subtotal="{}" baseField="0" baseItem="0"/>"#,
            escape(field.name.as_str()),
            field.subtotal.as_xml()
        ));
    }
    xml.push_str("</dataFields>");

    xml.push_str(&format!(
        r#"<pivotTableStyleInfo name="{}" showRowHeaders="{}" showColHeaders="{}" showRowStripes="0" showColStripes="0" showLastColumn="{}"/>"#,
        escape(opts.style_name.as_deref().unwrap_or(DEFAULT_STYLE)),
        flag(opts.show_row_headers),
        flag(opts.show_col_headers),
        flag(opts.show_last_column),
    ));
    xml.push_str("</pivotTableDefinition>");
    xml
}

fn relationship(id: &str, rel_type: &str, target: &str) -> String {
    format!(r#"<Relationship Id="{id}" Type="{rel_type}" Target="{target}"/>"#)
}

fn relationships_xml(entries: &str) -> String {
    format!(r#"{XML_DECL}<Relationships xmlns="{NS_PACKAGE_REL}">{entries}</Relationships>"#)
}

/// Insert `fragment` right before the last `closing` tag of `xml`.
fn insert_before(part: &str, xml: &str, closing: &str, fragment: &str) -> Result<String> {
    let pos = xml
        .rfind(closing)
        .ok_or_else(|| SheetError::Pivot(format!("{part} has no {closing}")))?;
    let mut out = String::with_capacity(xml.len() + fragment.len());
    out.push_str(&xml[..pos]);
    out.push_str(fragment);
    out.push_str(&xml[pos..]);
    Ok(out)
}

fn read_part<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    Ok(Some(text))
}

fn require_part<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    read_part(archive, name)?
        .ok_or_else(|| SheetError::Pivot(format!("package is missing {name}")))
}

/// Rewrite `package` so it carries every pivot table in `pivots`.
///
/// `sheet_names` must list worksheets in the order they were written.
pub(crate) fn embed_pivot_tables(
    package: Vec<u8>,
    sheet_names: &[&str],
    pivots: &[PivotTable],
) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(package))?;

    let mut updated: BTreeMap<String, String> = BTreeMap::new();
    let mut added: BTreeMap<String, String> = BTreeMap::new();

    let mut overrides = String::new();
    let mut cache_list = String::new();
    let mut workbook_rels = String::new();
    let mut sheet_rels: BTreeMap<usize, String> = BTreeMap::new();

    for (i, pivot) in pivots.iter().enumerate() {
        let n = i + 1;
        let cache_id = n;
        let dest = &pivot.options.pivot_table_range.sheet;
        let sheet_index = sheet_names
            .iter()
            .position(|name| *name == dest.as_str())
            .ok_or_else(|| SheetError::SheetNotFound { name: dest.clone() })?;

        added.insert(cache_definition_part(n), cache_definition_xml(pivot));
        added.insert(pivot_table_part(n), pivot_table_xml(pivot, n, cache_id));
        added.insert(
            pivot_table_rels_part(n),
            relationships_xml(&relationship(
                "rId1",
                REL_PIVOT_CACHE,
                &format!("../pivotCache/pivotCacheDefinition{n}.xml"),
            )),
        );

        overrides.push_str(&format!(
            r#"<Override PartName="/{}" ContentType="{CT_PIVOT_CACHE}"/>"#,
            cache_definition_part(n)
        ));
        overrides.push_str(&format!(
            r#"<Override PartName="/{}" ContentType="{CT_PIVOT_TABLE}"/>"#,
            pivot_table_part(n)
        ));

        let rel_id = format!("rIdPivotCache{n}");
        cache_list.push_str(&format!(r#"<pivotCache cacheId="{cache_id}" r:id="{rel_id}"/>"#));
        workbook_rels.push_str(&relationship(
            &rel_id,
            REL_PIVOT_CACHE,
            &format!("pivotCache/pivotCacheDefinition{n}.xml"),
        ));

        sheet_rels.entry(sheet_index).or_default().push_str(&relationship(
            &format!("rIdPivotTable{n}"),
            REL_PIVOT_TABLE,
            &format!("../pivotTables/pivotTable{n}.xml"),
        ));
    }

    let content_types = require_part(&mut archive, "[Content_Types].xml")?;
    updated.insert(
        "[Content_Types].xml".to_string(),
        insert_before("[Content_Types].xml", &content_types, "</Types>", &overrides)?,
    );

    let workbook = require_part(&mut archive, "xl/workbook.xml")?;
    updated.insert(
        "xl/workbook.xml".to_string(),
        insert_before(
            "xl/workbook.xml",
            &workbook,
            "</workbook>",
            &format!("<pivotCaches>{cache_list}</pivotCaches>"),
        )?,
    );

    let rels = require_part(&mut archive, "xl/_rels/workbook.xml.rels")?;
    updated.insert(
        "xl/_rels/workbook.xml.rels".to_string(),
        insert_before("xl/_rels/workbook.xml.rels", &rels, "</Relationships>", &workbook_rels)?,
    );

    for (sheet_index, entries) in sheet_rels {
        let part = worksheet_rels_part(sheet_index);
        match read_part(&mut archive, &part)? {
            Some(existing) => {
                let patched = insert_before(&part, &existing, "</Relationships>", &entries)?;
                updated.insert(part, patched);
            }
            None => {
                added.insert(part, relationships_xml(&entries));
            }
        }
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_string();
        if let Some(text) = updated.get(&name) {
            zip.start_file(name.clone(), options)?;
            zip.write_all(text.as_bytes())?;
        } else {
            zip.raw_copy_file(file)?;
        }
    }

    for (name, text) in added {
        zip.start_file(name, options)?;
        zip.write_all(text.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}
