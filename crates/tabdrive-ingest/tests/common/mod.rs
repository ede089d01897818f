//! Shared fixtures for the integration tests: a mock-server-backed
//! configuration and hand-built workbook archives.

#![allow(dead_code)]

use std::io::Write;
use tabdrive_ingest::GraphConfig;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const TENANT: &str = "tenant-a";
pub const SITE: &str = "site-1";
pub const DRIVE: &str = "drive-1";

/// Configuration pointing every endpoint at the mock server, with backup
/// polling tightened so failure tests finish quickly.
pub fn test_config(server: &MockServer) -> GraphConfig {
    GraphConfig {
        tenant_id: TENANT.to_string(),
        client_id: "client-1".to_string(),
        client_secret: "secret".to_string(),
        scope: "https://graph.microsoft.com/.default".to_string(),
        site_id: SITE.to_string(),
        drive_id: DRIVE.to_string(),
        graph_base_url: server.uri(),
        login_base_url: server.uri(),
        timeout_secs: 5,
        backup_poll_attempts: 3,
        backup_poll_interval_secs: 0,
    }
}

/// Mount the token endpoint; every pipeline test needs it.
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/{}/oauth2/v2.0/token", TENANT)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "access_token": "test-token",
        })))
        .mount(server)
        .await;
}

/// Path of the children listing for a drive folder path.
pub fn children_path(folder: &str) -> String {
    format!("/sites/{}/drives/{}/root:/{}:/children", SITE, DRIVE, folder)
}

/// Path resolving a drive folder to its item.
pub fn folder_path(folder: &str) -> String {
    format!("/sites/{}/drives/{}/root:/{}", SITE, DRIVE, folder)
}

/// Path of the children listing for an item id.
pub fn children_by_id_path(item_id: &str) -> String {
    format!("/sites/{}/drives/{}/items/{}/children", SITE, DRIVE, item_id)
}

/// Path of the copy operation for an item id.
pub fn copy_path(item_id: &str) -> String {
    format!("/sites/{}/drives/{}/items/{}/copy", SITE, DRIVE, item_id)
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Data" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/></font></fonts><fills count="1"><fill><patternFill patternType="none"/></fill></fills><borders count="1"><border/></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" xfId="0"/></cellXfs></styleSheet>"#;

/// Worksheet with a header and two data rows; text cells are inline
/// strings so no shared string table is needed.
const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Region</t></is></c><c r="B1" t="inlineStr"><is><t>Units</t></is></c><c r="C1" t="inlineStr"><is><t>Price</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>North</t></is></c><c r="B2"><v>12</v></c><c r="C2"><v>19.5</v></c></row><row r="3"><c r="A3" t="inlineStr"><is><t>South</t></is></c><c r="B3"><v>7</v></c><c r="C3"><v>24.25</v></c></row></sheetData></worksheet>"#;

fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A small well-formed workbook: Region/Units/Price with two data rows.
pub fn minimal_xlsx() -> Vec<u8> {
    build_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", SHEET),
        ("xl/styles.xml", STYLES),
    ])
}

/// Style part whose `cellStyleXfs` declares five entries but holds one,
/// pointing at a style id that does not exist.
const CORRUPT_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="1"><font><sz val="11"/></font></fonts><fills count="1"><fill><patternFill patternType="none"/></fill></fills><borders count="1"><border/></borders><cellStyleXfs count="5"><xf numFmtId="0" fontId="0" xfId="3"/></cellStyleXfs><cellXfs count="1"><xf numFmtId="0" fontId="0" xfId="0"/></cellXfs></styleSheet>"#;

/// Same workbook, but with the inconsistent style table.
pub fn corrupt_styles_xlsx() -> Vec<u8> {
    build_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", SHEET),
        ("xl/styles.xml", CORRUPT_STYLES),
    ])
}

/// Same workbook, but the workbook relationships part is truncated so
/// readers that rely on it cannot find the worksheets.
pub fn xlsx_broken_rels() -> Vec<u8> {
    build_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", "<Relationships><Relationship"),
        ("xl/worksheets/sheet1.xml", SHEET),
        ("xl/styles.xml", STYLES),
    ])
}
