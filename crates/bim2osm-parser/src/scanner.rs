// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity scanner and header reader
//!
//! The scanner walks the DATA section statement by statement. Only
//! whitespace may appear between entity instances; anything else (block
//! comments included) is reported as a format error with its line number.

use crate::tokenizer::parse_statement;
use bim2osm_model::{AttributeValue, ModelMetadata, ParseError, Result};
use memchr::{memchr2, memchr_iter};

const MAGIC: &str = "ISO-10303-21;";
const HEADER: &str = "HEADER;";
const DATA: &str = "DATA;";
const ENDSEC: &str = "ENDSEC;";
const END_MAGIC: &str = "END-ISO-10303-21;";

/// Location of one entity instance inside the file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawEntity<'a> {
    pub id: u32,
    /// Type keyword as written; empty for complex instances
    pub type_name: &'a str,
    /// Byte offset of the leading `#`
    pub start: usize,
    /// Byte offset just past the terminating `;`
    pub end: usize,
}

/// Sequential scanner over the DATA section
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
    finished: bool,
}

impl<'a> EntityScanner<'a> {
    /// Create a scanner positioned at the first entity of the DATA section
    pub fn new(content: &'a str) -> Result<Self> {
        let header = parse_header(content)?;
        Ok(Self::at(content, header.data_offset))
    }

    /// Create a scanner starting at a known byte offset
    pub fn at(content: &'a str, offset: usize) -> Self {
        Self {
            content,
            pos: offset,
            finished: false,
        }
    }

    /// Scan to the next entity instance
    ///
    /// Returns `Ok(None)` once the closing `ENDSEC;` is reached.
    pub fn next_entity(&mut self) -> Result<Option<RawEntity<'a>>> {
        if self.finished {
            return Ok(None);
        }

        self.skip_whitespace();
        let bytes = self.content.as_bytes();

        if self.rest().starts_with(ENDSEC) {
            self.pos += ENDSEC.len();
            self.finished = true;
            return Ok(None);
        }
        if self.pos >= bytes.len() {
            return Err(ParseError::format("DATA section is not closed by ENDSEC;"));
        }
        if bytes[self.pos] != b'#' {
            return Err(self.unexpected());
        }

        let start = self.pos;
        self.pos += 1;
        let id_start = self.pos;
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        let id: u32 = self.content[id_start..self.pos]
            .parse()
            .map_err(|_| self.unexpected_at(start))?;

        self.skip_whitespace();
        if bytes.get(self.pos) != Some(&b'=') {
            return Err(self.unexpected_at(start));
        }
        self.pos += 1;
        self.skip_whitespace();

        let type_start = self.pos;
        while self.pos < bytes.len()
            && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        let type_name = &self.content[type_start..self.pos];

        let end = self.find_entity_end().ok_or_else(|| {
            ParseError::format(format!(
                "unterminated entity #{} starting at line {}",
                id,
                self.line_of(start)
            ))
        })?;

        Ok(Some(RawEntity {
            id,
            type_name,
            start,
            end,
        }))
    }

    /// Verify that only `END-ISO-10303-21;` follows the DATA section
    pub fn finish(&mut self) -> Result<()> {
        while self.next_entity()?.is_some() {}
        self.skip_whitespace();
        if !self.rest().starts_with(END_MAGIC) {
            return Err(ParseError::format("missing END-ISO-10303-21;"));
        }
        self.pos += END_MAGIC.len();
        self.skip_whitespace();
        if self.pos < self.content.len() {
            return Err(self.unexpected());
        }
        Ok(())
    }

    fn rest(&self) -> &'a str {
        &self.content[self.pos.min(self.content.len())..]
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    /// Find the terminating semicolon, skipping quoted strings
    fn find_entity_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            let offset = memchr2(b'\'', b';', &bytes[self.pos..])?;
            self.pos += offset;
            match bytes[self.pos] {
                b'\'' => {
                    if in_string && bytes.get(self.pos + 1) == Some(&b'\'') {
                        self.pos += 2;
                        continue;
                    }
                    in_string = !in_string;
                }
                _ if !in_string => {
                    self.pos += 1;
                    return Some(self.pos);
                }
                _ => {}
            }
            self.pos += 1;
        }

        None
    }

    fn line_of(&self, offset: usize) -> usize {
        line_number(self.content, offset)
    }

    fn unexpected(&self) -> ParseError {
        self.unexpected_at(self.pos)
    }

    fn unexpected_at(&self, offset: usize) -> ParseError {
        ParseError::format(format!(
            "unexpected content at line {}: {}",
            self.line_of(offset),
            snippet(&self.content[offset.min(self.content.len())..])
        ))
    }
}

/// 1-based line number of a byte offset
fn line_number(content: &str, offset: usize) -> usize {
    let end = offset.min(content.len());
    memchr_iter(b'\n', &content.as_bytes()[..end]).count() + 1
}

fn snippet(s: &str) -> String {
    let line = s.lines().next().unwrap_or_default();
    line.chars().take(40).collect()
}

/// Header information extracted from an IFC file
#[derive(Clone, Debug, Default)]
pub struct HeaderInfo {
    pub metadata: ModelMetadata,
    /// Byte offset just past `DATA;`
    pub data_offset: usize,
}

/// Parse the HEADER section and locate the DATA section
///
/// The header must consist of well-formed statements; a file without
/// `FILE_SCHEMA` is rejected.
pub fn parse_header(content: &str) -> Result<HeaderInfo> {
    let mut pos = skip_ws(content, 0);
    if content[pos..].starts_with('\u{feff}') {
        pos = skip_ws(content, pos + '\u{feff}'.len_utf8());
    }

    pos = expect_keyword(content, pos, MAGIC)?;
    pos = expect_keyword(content, skip_ws(content, pos), HEADER)?;

    let mut metadata = ModelMetadata::default();
    let mut has_schema = false;

    loop {
        pos = skip_ws(content, pos);
        if content[pos..].starts_with(ENDSEC) {
            pos += ENDSEC.len();
            break;
        }
        let end = statement_end(content, pos).ok_or_else(|| {
            ParseError::header(format!(
                "unterminated statement at line {}",
                line_number(content, pos)
            ))
        })?;
        let (name, args) = parse_statement(&content[pos..end]).map_err(|e| {
            ParseError::header(format!("line {}: {}", line_number(content, pos), e))
        })?;

        match name.as_str() {
            "FILE_DESCRIPTION" => {
                metadata.file_description = first_string(args.first());
            }
            "FILE_NAME" => {
                metadata.file_name = string_at(&args, 0);
                metadata.timestamp = string_at(&args, 1);
                metadata.author = first_string(args.get(2));
                metadata.organization = first_string(args.get(3));
                metadata.preprocessor_version = string_at(&args, 4);
                metadata.originating_system = string_at(&args, 5);
            }
            "FILE_SCHEMA" => {
                has_schema = true;
                metadata.schema_identifiers = args
                    .first()
                    .and_then(|a| a.as_list())
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|id| id.as_string())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
            }
            _ => {}
        }
        pos = end;
    }

    if !has_schema {
        return Err(ParseError::header("missing FILE_SCHEMA"));
    }

    let data_offset = expect_keyword(content, skip_ws(content, pos), DATA)?;

    Ok(HeaderInfo {
        metadata,
        data_offset,
    })
}

fn skip_ws(content: &str, pos: usize) -> usize {
    let bytes = content.as_bytes();
    let mut pos = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

fn expect_keyword(content: &str, pos: usize, keyword: &str) -> Result<usize> {
    if content[pos..].starts_with(keyword) {
        Ok(pos + keyword.len())
    } else {
        Err(ParseError::header(format!(
            "expected {} at line {}, found: {}",
            keyword,
            line_number(content, pos),
            snippet(&content[pos..])
        )))
    }
}

/// Offset just past the `;` closing the statement at `pos`
fn statement_end(content: &str, pos: usize) -> Option<usize> {
    let mut scanner = EntityScanner::at(content, pos);
    scanner.find_entity_end()
}

fn string_at(args: &[AttributeValue], index: usize) -> Option<String> {
    args.get(index)
        .and_then(|a| a.as_string())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_string(attr: Option<&AttributeValue>) -> Option<String> {
    match attr? {
        AttributeValue::List(items) => items
            .iter()
            .filter_map(|i| i.as_string())
            .find(|s| !s.is_empty())
            .map(str::to_string),
        AttributeValue::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('test.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','App','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#4= IFCWALL('guid',$,'Wall; 1',$,$,#5,#6,$);
ENDSEC;
END-ISO-10303-21;
"#;

    fn scan_all(content: &str) -> Result<Vec<(u32, String)>> {
        let mut scanner = EntityScanner::new(content)?;
        let mut entities = Vec::new();
        while let Some(raw) = scanner.next_entity()? {
            entities.push((raw.id, raw.type_name.to_string()));
        }
        scanner.finish()?;
        Ok(entities)
    }

    #[test]
    fn test_scanner_finds_entities() {
        let entities = scan_all(TEST_IFC).unwrap();
        assert_eq!(entities.len(), 4);
        assert_eq!(entities[0], (1, "IFCPROJECT".to_string()));
        assert_eq!(entities[3], (4, "IFCWALL".to_string()));
    }

    #[test]
    fn test_entity_span_includes_semicolon() {
        let mut scanner = EntityScanner::new(TEST_IFC).unwrap();
        let raw = scanner.next_entity().unwrap().unwrap();
        assert!(TEST_IFC[raw.start..raw.end].starts_with("#1=IFCPROJECT"));
        assert!(TEST_IFC[raw.start..raw.end].ends_with(");"));
    }

    #[test]
    fn test_block_comment_in_data_is_rejected() {
        let content = TEST_IFC.replace("#2=IFCUNIT", "/* units */\n#2=IFCUNIT");
        let err = scan_all(&content).unwrap_err();
        assert!(err.to_string().contains("line 9"), "{}", err);
    }

    #[test]
    fn test_missing_endsec_is_rejected() {
        let content = TEST_IFC.replace("ENDSEC;\nEND-ISO", "END-ISO");
        assert!(scan_all(&content).is_err());
    }

    #[test]
    fn test_parse_header() {
        let header = parse_header(TEST_IFC).unwrap();
        let meta = &header.metadata;
        assert_eq!(meta.schema_identifiers, vec!["IFC2X3".to_string()]);
        assert_eq!(meta.file_name.as_deref(), Some("test.ifc"));
        assert_eq!(meta.author.as_deref(), Some("Author"));
        assert_eq!(meta.organization.as_deref(), Some("Org"));
        assert_eq!(meta.originating_system.as_deref(), Some("App"));
        assert_eq!(
            meta.file_description.as_deref(),
            Some("ViewDefinition [CoordinationView]")
        );
        assert!(TEST_IFC[header.data_offset..].trim_start().starts_with("#1="));
    }

    #[test]
    fn test_header_comment_is_rejected() {
        let content = TEST_IFC.replace("FILE_SCHEMA", "/* exporter */ FILE_SCHEMA");
        assert!(matches!(
            parse_header(&content),
            Err(ParseError::InvalidHeader(_))
        ));
        let content = format!("/* leading */\n{}", TEST_IFC);
        assert!(parse_header(&content).is_err());
    }

    #[test]
    fn test_header_without_schema_is_rejected() {
        let content = TEST_IFC.replace("FILE_SCHEMA(('IFC2X3'));\n", "");
        assert!(parse_header(&content).is_err());
    }
}
