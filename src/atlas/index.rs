//! Binary atlas index
//!
//! Layout (all little-endian):
//! - Header, 12 bytes: sheet width u32, sheet height u32, count u32
//! - Records, 12 bytes each: codepoint u32, x u16, y u16, width u16, height u16
//!
//! One record per codepoint, in placement order. When a codepoint is
//! placed more than once only the first placement is written.
//!
//! The header count is the number of placements (duplicates included)
//! unless [`IndexCount::Records`] is selected. Readers must not assume
//! `count == records.len()` for files written in the legacy mode.

use std::collections::HashSet;
use std::io::Write;

use crate::constants::{INDEX_HEADER_LEN, INDEX_RECORD_LEN, MAX_INDEX_COORD};
use crate::error::{AtlasError, Result};

use super::packer::Placement;

/// What the header's count field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexCount {
    /// Placements before de-duplication (legacy, matches existing consumers)
    #[default]
    Placements,
    /// Records actually written
    Records,
}

/// One glyph rectangle as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRecord {
    pub codepoint: u32,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl IndexRecord {
    fn from_placement(p: &Placement) -> Result<Self> {
        let codepoint = p.ch as u32;
        let field = |name: &'static str, value: u32| -> Result<u16> {
            if value > MAX_INDEX_COORD {
                return Err(AtlasError::IndexFieldOverflow {
                    codepoint,
                    field: name,
                    value,
                });
            }
            Ok(value as u16)
        };
        Ok(Self {
            codepoint,
            x: field("x", p.x)?,
            y: field("y", p.y)?,
            width: field("width", p.width)?,
            height: field("height", p.height)?,
        })
    }

    /// The codepoint as a char (records are validated on parse)
    pub fn ch(&self) -> Option<char> {
        char::from_u32(self.codepoint)
    }

    /// Back to a sheet rectangle
    pub fn placement(&self) -> Option<Placement> {
        Some(Placement {
            ch: self.ch()?,
            x: self.x as u32,
            y: self.y as u32,
            width: self.width as u32,
            height: self.height as u32,
        })
    }
}

/// Parsed or about-to-be-written index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasIndex {
    pub sheet_width: u32,
    pub sheet_height: u32,
    /// Header count field, see [`IndexCount`]
    pub count: u32,
    pub records: Vec<IndexRecord>,
}

impl AtlasIndex {
    /// Build the index for a pass, keeping the first placement of each codepoint
    pub fn from_placements<'a, I>(
        sheet_width: u32,
        sheet_height: u32,
        placements: I,
        mode: IndexCount,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Placement>,
    {
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut total = 0u32;
        for p in placements {
            total += 1;
            if !seen.insert(p.ch) {
                continue;
            }
            records.push(IndexRecord::from_placement(p)?);
        }

        let count = match mode {
            IndexCount::Placements => total,
            IndexCount::Records => records.len() as u32,
        };
        Ok(Self {
            sheet_width,
            sheet_height,
            count,
            records,
        })
    }

    /// Serialize into `out`
    pub fn write_to<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        out.write_all(&self.to_bytes())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(INDEX_HEADER_LEN + self.records.len() * INDEX_RECORD_LEN);
        buf.extend_from_slice(&self.sheet_width.to_le_bytes());
        buf.extend_from_slice(&self.sheet_height.to_le_bytes());
        buf.extend_from_slice(&self.count.to_le_bytes());
        for r in &self.records {
            buf.extend_from_slice(&r.codepoint.to_le_bytes());
            buf.extend_from_slice(&r.x.to_le_bytes());
            buf.extend_from_slice(&r.y.to_le_bytes());
            buf.extend_from_slice(&r.width.to_le_bytes());
            buf.extend_from_slice(&r.height.to_le_bytes());
        }
        buf
    }

    /// Parse an index file
    ///
    /// Accepts fewer records than the header count (legacy files) but
    /// rejects more, partial trailing records, invalid codepoints and
    /// repeated codepoints.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < INDEX_HEADER_LEN {
            return Err(AtlasError::MalformedIndex(format!(
                "header truncated ({} bytes)",
                bytes.len()
            )));
        }
        let body = bytes.len() - INDEX_HEADER_LEN;
        if body % INDEX_RECORD_LEN != 0 {
            return Err(AtlasError::MalformedIndex(format!(
                "{} trailing bytes after last record",
                body % INDEX_RECORD_LEN
            )));
        }

        let sheet_width = read_u32(bytes, 0);
        let sheet_height = read_u32(bytes, 4);
        let count = read_u32(bytes, 8);
        let record_count = body / INDEX_RECORD_LEN;
        if record_count > count as usize {
            return Err(AtlasError::MalformedIndex(format!(
                "header counts {} placements but file holds {} records",
                count, record_count
            )));
        }

        let mut seen = HashSet::with_capacity(record_count);
        let mut records = Vec::with_capacity(record_count);
        for i in 0..record_count {
            let off = INDEX_HEADER_LEN + i * INDEX_RECORD_LEN;
            let record = IndexRecord {
                codepoint: read_u32(bytes, off),
                x: read_u16(bytes, off + 4),
                y: read_u16(bytes, off + 6),
                width: read_u16(bytes, off + 8),
                height: read_u16(bytes, off + 10),
            };
            if record.ch().is_none() {
                return Err(AtlasError::MalformedIndex(format!(
                    "record {}: invalid codepoint 0x{:X}",
                    i, record.codepoint
                )));
            }
            if !seen.insert(record.codepoint) {
                return Err(AtlasError::MalformedIndex(format!(
                    "record {}: U+{:04X} appears twice",
                    i, record.codepoint
                )));
            }
            records.push(record);
        }

        Ok(Self {
            sheet_width,
            sheet_height,
            count,
            records,
        })
    }

    /// Look up a glyph's rectangle
    pub fn get(&self, ch: char) -> Option<&IndexRecord> {
        self.records.iter().find(|r| r.codepoint == ch as u32)
    }
}

fn read_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(ch: char, x: u32, y: u32, w: u32, h: u32) -> Placement {
        Placement { ch, x, y, width: w, height: h }
    }

    #[test]
    fn test_exact_bytes() {
        let placements = [p('\u{1F600}', 0, 0, 32, 32), p('\u{1F601}', 34, 0, 16, 32)];
        let index = AtlasIndex::from_placements(100, 32, &placements, IndexCount::Placements)
            .unwrap();
        let bytes = index.to_bytes();
        #[rustfmt::skip]
        let expected: Vec<u8> = vec![
            100, 0, 0, 0,  32, 0, 0, 0,  2, 0, 0, 0,
            0x00, 0xF6, 0x01, 0x00,  0, 0,  0, 0,  32, 0,  32, 0,
            0x01, 0xF6, 0x01, 0x00,  34, 0,  0, 0,  16, 0,  32, 0,
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let placements = [
            p('a', 0, 0, 10, 10),
            p('b', 12, 0, 10, 10),
            p('a', 24, 0, 10, 10),
        ];
        let index =
            AtlasIndex::from_placements(64, 10, &placements, IndexCount::Placements).unwrap();
        assert_eq!(index.count, 3);
        assert_eq!(index.records.len(), 2);
        assert_eq!(index.get('a').unwrap().x, 0);
        assert_eq!(index.records[1].codepoint, 'b' as u32);
    }

    #[test]
    fn test_records_count_mode() {
        let placements = [p('a', 0, 0, 10, 10), p('a', 12, 0, 10, 10)];
        let index = AtlasIndex::from_placements(64, 10, &placements, IndexCount::Records).unwrap();
        assert_eq!(index.count, 1);
        assert_eq!(index.records.len(), 1);
    }

    #[test]
    fn test_empty_index() {
        let index = AtlasIndex::from_placements(4096, 0, std::iter::empty(), IndexCount::Placements).unwrap();
        assert_eq!(index.to_bytes(), vec![0, 16, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_field_overflow() {
        let placements = [p('a', 0, 70_000, 10, 10)];
        let err = AtlasIndex::from_placements(64, 70_010, &placements, IndexCount::Placements)
            .unwrap_err();
        assert!(matches!(
            err,
            AtlasError::IndexFieldOverflow { field: "y", value: 70_000, .. }
        ));
    }

    #[test]
    fn test_parse_written_index() {
        let placements = [p('x', 0, 0, 5, 8), p('y', 7, 0, 3, 8), p('x', 12, 0, 5, 8)];
        let index =
            AtlasIndex::from_placements(20, 8, &placements, IndexCount::Placements).unwrap();
        let parsed = AtlasIndex::parse(&index.to_bytes()).unwrap();
        assert_eq!(parsed, index);
        assert_eq!(parsed.count, 3);
        assert_eq!(parsed.records.len(), 2);
    }

    #[test]
    fn test_parse_rejects_truncated() {
        assert!(AtlasIndex::parse(&[0u8; 11]).is_err());
        let mut bytes = AtlasIndex::from_placements(8, 8, &[p('a', 0, 0, 8, 8)], IndexCount::Records)
            .unwrap()
            .to_bytes();
        bytes.pop();
        assert!(matches!(
            AtlasIndex::parse(&bytes),
            Err(AtlasError::MalformedIndex(_))
        ));
    }

    #[test]
    fn test_parse_rejects_more_records_than_count() {
        let mut index =
            AtlasIndex::from_placements(8, 8, &[p('a', 0, 0, 8, 8)], IndexCount::Records).unwrap();
        index.count = 0;
        assert!(AtlasIndex::parse(&index.to_bytes()).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_codepoint() {
        let mut bytes = vec![8, 0, 0, 0, 8, 0, 0, 0, 1, 0, 0, 0];
        bytes.extend_from_slice(&0xD800u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 8]);
        assert!(AtlasIndex::parse(&bytes).is_err());
    }
}
