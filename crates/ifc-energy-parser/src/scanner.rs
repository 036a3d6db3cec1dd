// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fast entity scanner using SIMD-accelerated byte searching
//!
//! Scans IFC files to discover entities without full parsing.

use crate::tokenizer::parse_record_arguments;
use ifc_energy_model::{AttributeValue, EntityId, IfcType};
use memchr::{memchr, memmem};
use rustc_hash::FxHashMap;

/// Entity index mapping ID to byte offsets
pub type EntityIndex = FxHashMap<u32, (usize, usize)>;

/// Type index mapping entity type to IDs in file order
pub type TypeIndex = FxHashMap<IfcType, Vec<EntityId>>;

/// Fast entity scanner for IFC files
///
/// Uses memchr for SIMD-accelerated scanning to quickly find entity
/// boundaries without full parsing.
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a new scanner positioned after the `DATA;` marker
    pub fn new(content: &'a str) -> Self {
        let pos = memmem::find(content.as_bytes(), b"DATA;")
            .map(|p| p + 5)
            .unwrap_or(0);

        Self { content, pos }
    }

    /// Scan to find the next entity
    ///
    /// Returns (id, type_name, start_byte, end_byte)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            let hash_pos = memchr(b'#', &bytes[self.pos..])?;
            self.pos += hash_pos;

            // Entity definitions start a statement; references inside
            // attribute lists do not.
            if !self.at_statement_start() {
                self.pos += 1;
                continue;
            }

            let start = self.pos;
            self.pos += 1;
            let id_start = self.pos;

            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }

            if self.pos == id_start {
                continue;
            }

            let Ok(id) = self.content[id_start..self.pos].parse::<u32>() else {
                continue;
            };

            self.skip_blanks();
            if self.pos >= bytes.len() || bytes[self.pos] != b'=' {
                continue;
            }
            self.pos += 1;
            self.skip_blanks();

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }

            if self.pos == type_start {
                continue;
            }

            let type_name = &self.content[type_start..self.pos];
            let end = self.find_entity_end();

            return Some((id, type_name, start, end));
        }

        None
    }

    /// Whether the `#` at the current position follows a statement boundary,
    /// allowing indentation and `/* */` comments in between
    fn at_statement_start(&self) -> bool {
        let bytes = self.content.as_bytes();
        let mut i = self.pos;
        while i > 0 {
            match bytes[i - 1] {
                b' ' | b'\t' => i -= 1,
                b'\n' | b'\r' | b';' => return true,
                b'/' if i >= 2 && bytes[i - 2] == b'*' => {
                    match memmem::rfind(&bytes[..i - 2], b"/*") {
                        Some(open) => i = open,
                        None => return false,
                    }
                }
                _ => return false,
            }
        }
        true
    }

    /// Whether a line starting at `pos` opens an entity definition
    /// (`#<digits>=` after optional blanks)
    fn opens_entity(&self, mut pos: usize) -> bool {
        let bytes = self.content.as_bytes();
        while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] != b'#' {
            return false;
        }
        pos += 1;
        let digits = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        if pos == digits {
            return false;
        }
        while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
            pos += 1;
        }
        pos < bytes.len() && bytes[pos] == b'='
    }

    fn skip_blanks(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && (bytes[self.pos] == b' ' || bytes[self.pos] == b'\t') {
            self.pos += 1;
        }
    }

    /// Find the end of an entity (semicolon), handling quoted strings and
    /// comments
    ///
    /// A string left open at a line break ends the entity there when the
    /// next line opens another entity. The truncated entity is indexed but
    /// fails to decode, and scanning resumes with the next line. An entity
    /// with no terminator runs to the end of the content.
    fn find_entity_end(&mut self) -> usize {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\'' => {
                    if in_string && self.pos + 1 < bytes.len() && bytes[self.pos + 1] == b'\'' {
                        self.pos += 2;
                        continue;
                    }
                    in_string = !in_string;
                }
                b'\n' if in_string && self.opens_entity(self.pos + 1) => {
                    let end = if self.pos > 0 && bytes[self.pos - 1] == b'\r' {
                        self.pos - 1
                    } else {
                        self.pos
                    };
                    self.pos += 1;
                    return end;
                }
                b'/' if !in_string && bytes.get(self.pos + 1) == Some(&b'*') => {
                    match memmem::find(&bytes[self.pos + 2..], b"*/") {
                        Some(close) => {
                            self.pos += close + 4;
                            continue;
                        }
                        None => break,
                    }
                }
                b';' if !in_string => {
                    self.pos += 1;
                    return self.pos;
                }
                _ => {}
            }
            self.pos += 1;
        }

        self.pos = bytes.len();
        self.pos
    }

    /// Build the id and type indices in a single pass
    ///
    /// Ids within each type keep their file order. A duplicate id keeps
    /// its first definition.
    pub fn build_indices(content: &'a str) -> (EntityIndex, TypeIndex) {
        let mut scanner = Self::new(content);
        let mut index = EntityIndex::default();
        let mut types = TypeIndex::default();

        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            if index.contains_key(&id) {
                continue;
            }
            index.insert(id, (start, end));
            types
                .entry(IfcType::parse(type_name))
                .or_default()
                .push(EntityId(id));
        }

        (index, types)
    }
}

/// Header information extracted from IFC file
#[derive(Clone, Debug, Default)]
pub struct HeaderInfo {
    pub schema_version: String,
    pub file_name: Option<String>,
    pub timestamp: Option<String>,
    pub author: Option<String>,
    pub organization: Option<String>,
    pub preprocessor_version: Option<String>,
    pub originating_system: Option<String>,
}

/// Check the `ISO-10303-21;` marker that opens every STEP Part 21 file
pub fn has_step_marker(content: &str) -> bool {
    content.trim_start().starts_with("ISO-10303-21")
}

/// Check for the `DATA;` section
pub fn has_data_section(content: &str) -> bool {
    memmem::find(content.as_bytes(), b"DATA;").is_some()
}

/// Parse the header section to extract metadata
pub fn parse_header(content: &str) -> HeaderInfo {
    let mut info = HeaderInfo::default();

    let header_start = content.find("HEADER;").unwrap_or(0);
    let header_end = content[header_start..]
        .find("ENDSEC;")
        .map(|p| header_start + p)
        .unwrap_or(content.len());
    let header = &content[header_start..header_end];

    // FILE_SCHEMA(('IFC4'))
    if let Some(args) = header_record(header, "FILE_SCHEMA") {
        if let Some(schema) = args
            .first()
            .and_then(AttributeValue::as_list)
            .and_then(|list| list.first())
            .and_then(AttributeValue::as_string)
        {
            info.schema_version = schema.to_string();
        }
    }

    // FILE_NAME(name, time_stamp, (author), (organization),
    //           preprocessor_version, originating_system, authorization)
    if let Some(args) = header_record(header, "FILE_NAME") {
        let text = |i: usize| {
            args.get(i)
                .and_then(AttributeValue::as_string)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let first_of_list = |i: usize| {
            args.get(i)
                .and_then(AttributeValue::as_list)
                .and_then(|list| list.iter().find_map(AttributeValue::as_string))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        info.file_name = text(0);
        info.timestamp = text(1);
        info.author = first_of_list(2);
        info.organization = first_of_list(3);
        info.preprocessor_version = text(4);
        info.originating_system = text(5);
    }

    info
}

/// Locate a header record and decode its arguments
fn header_record(header: &str, record: &str) -> Option<Vec<AttributeValue>> {
    let start = header.find(record)? + record.len();
    parse_record_arguments(&header[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('office.ifc','2024-01-01T00:00:00',('Author'),('Org'),'Preprocessor','Modeler 2024','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('guid',$,'Project',$,$,$,$,$,#2);
#2=IFCUNITASSIGNMENT((#3));
#3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);
#10=IFCSPACE('guid10',$,'Office; north',$,'OFFICE',$,$,$,.ELEMENT.,.INTERNAL.,$);
  #11=IFCSPACE('guid11',$,'Lobby',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);
#12=IFCWALL('guid12',$,'Wall 1',$,$,#5,#6,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_scanner_finds_entities() {
        let mut scanner = EntityScanner::new(TEST_IFC);
        let mut entities = Vec::new();

        while let Some((id, type_name, _, _)) = scanner.next_entity() {
            entities.push((id, type_name.to_string()));
        }

        assert_eq!(entities.len(), 6);
        assert_eq!(entities[0], (1, "IFCPROJECT".to_string()));
        assert_eq!(entities[4], (11, "IFCSPACE".to_string()));
        assert_eq!(entities[5], (12, "IFCWALL".to_string()));
    }

    #[test]
    fn test_semicolon_inside_string_does_not_split_entity() {
        let (index, _) = EntityScanner::build_indices(TEST_IFC);
        let (start, end) = index[&10];
        assert!(TEST_IFC[start..end].ends_with(".INTERNAL.,$);"));
    }

    #[test]
    fn test_type_index_keeps_file_order() {
        let (index, types) = EntityScanner::build_indices(TEST_IFC);
        assert_eq!(index.len(), 6);
        assert_eq!(
            types.get(&IfcType::IfcSpace),
            Some(&vec![EntityId(10), EntityId(11)])
        );
    }

    #[test]
    fn test_unterminated_string_ends_at_next_entity_line() {
        let content = "DATA;\n\
#10=IFCSPACE('g10',$,'Office',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);\n\
#11=IFCSPACE('g11',$,'Broken,$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);\r\n\
#12=IFCSPACE('g12',$,'Lobby',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);\n\
  #13=IFCSPACE('g13',$,'Store',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);\n\
ENDSEC;\n";

        let (index, types) = EntityScanner::build_indices(content);
        assert_eq!(
            types.get(&IfcType::IfcSpace),
            Some(&vec![EntityId(10), EntityId(11), EntityId(12), EntityId(13)])
        );

        let (start, end) = index[&11];
        assert!(content[start..end].ends_with(".INTERNAL.,$);"));
        assert!(!content[start..end].contains("#12"));

        let (start, end) = index[&12];
        assert!(content[start..end].starts_with("#12=IFCSPACE('g12'"));
        assert!(content[start..end].ends_with(".INTERNAL.,$);"));
    }

    #[test]
    fn test_missing_terminator_runs_to_end() {
        let content = "DATA;\n#1=IFCWALL('w',$,'Open'\n";
        let mut scanner = EntityScanner::new(content);
        let (id, _, start, end) = scanner.next_entity().unwrap();
        assert_eq!(id, 1);
        assert_eq!(&content[start..end], "#1=IFCWALL('w',$,'Open'\n");
        assert!(scanner.next_entity().is_none());
    }

    #[test]
    fn test_comments_around_entities() {
        let content = "DATA;\n\
/* spaces */ #5=IFCSPACE('g5',$,'A',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$);\n\
#6=IFCSPACE('g6',$,'B',$,$,$,$,$,.ELEMENT.,.INTERNAL.,$); /* a; b */ #7=IFCWALL('w7',$,'W',$,$,$,$,$);\n\
#8=IFCWALL('w8',$,'X',$,$ /* ; */,$,$,$);\n\
ENDSEC;\n";

        let (index, types) = EntityScanner::build_indices(content);
        assert_eq!(
            types.get(&IfcType::IfcSpace),
            Some(&vec![EntityId(5), EntityId(6)])
        );
        assert_eq!(
            types.get(&IfcType::IfcWall),
            Some(&vec![EntityId(7), EntityId(8)])
        );

        let (start, end) = index[&8];
        assert!(content[start..end].ends_with(",$,$,$);"));
    }

    #[test]
    fn test_parse_header() {
        let info = parse_header(TEST_IFC);
        assert_eq!(info.schema_version, "IFC2X3");
        assert_eq!(info.file_name.as_deref(), Some("office.ifc"));
        assert_eq!(info.author.as_deref(), Some("Author"));
        assert_eq!(info.organization.as_deref(), Some("Org"));
        assert_eq!(info.originating_system.as_deref(), Some("Modeler 2024"));
    }

    #[test]
    fn test_step_markers() {
        assert!(has_step_marker(TEST_IFC));
        assert!(has_data_section(TEST_IFC));
        assert!(!has_step_marker("PK\u{3}\u{4} zip archive"));
        assert!(!has_data_section("ISO-10303-21;\nHEADER;\nENDSEC;"));
    }
}
