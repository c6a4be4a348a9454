use serde::Serialize;

use super::error::{BundleError, Result};
use super::layouts::{BUNDLE_HEADER, BUNDLE_ITEM_SLOTS};
use super::record::{decode, Record};
use super::schema::Endian;

/// One catalog slot: where a sub-stream lives inside the bundle file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub extension: String,
    pub start: u64,
    pub length: u64,
}

impl CatalogEntry {
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// The 256-byte bundle header.
#[derive(Debug, Clone, Serialize)]
pub struct BundleHeader {
    pub signature: String,
    pub version: String,
    /// Creation time in PatchMaster seconds.
    pub time: f64,
    pub items: i32,
    pub is_little_endian: bool,
    pub entries: Vec<CatalogEntry>,
}

impl BundleHeader {
    pub const SIZE: usize = BUNDLE_HEADER.required_size;

    /// Parse the header, re-reading it big-endian when the file says so.
    pub fn parse(bytes: &[u8]) -> Result<(Self, Endian)> {
        if bytes.len() < Self::SIZE {
            return Err(BundleError::EndianDetectionFailure {
                location: "bundle header".to_string(),
                offset: 0,
                found: bytes.iter().take(8).copied().collect(),
            });
        }

        let mut record = decode(&BUNDLE_HEADER, bytes, Endian::Little)?;
        let mut endian = Endian::Little;
        if !record.is_set("IsLittleEndian")? {
            record = decode(&BUNDLE_HEADER, bytes, Endian::Big)?;
            endian = Endian::Big;
        }

        let signature = record.text("Signature")?.to_string();
        if !signature.starts_with("DAT") {
            return Err(BundleError::EndianDetectionFailure {
                location: "bundle header".to_string(),
                offset: 0,
                found: bytes[..8].to_vec(),
            });
        }

        let items = record.i64("Items")? as i32;
        let entries = catalog_entries(&record, items)?;

        Ok((
            BundleHeader {
                signature,
                version: record.text("Version")?.to_string(),
                time: record.f64("Time")?,
                items,
                is_little_endian: endian == Endian::Little,
                entries,
            },
            endian,
        ))
    }

    pub fn entry(&self, extension: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.extension == extension)
    }
}

fn catalog_entries(record: &Record, items: i32) -> Result<Vec<CatalogEntry>> {
    let slots = usize::try_from(items).unwrap_or(0).min(BUNDLE_ITEM_SLOTS);
    let mut entries = Vec::with_capacity(slots);

    for item in &record.records("BundleItems")?[..slots] {
        let extension = item.text("Extension")?;
        if extension.is_empty() {
            continue;
        }

        let start = item.i64("Start")?;
        let length = item.i64("Length")?;
        if start < 0 || length < 0 {
            return Err(BundleError::EndianDetectionFailure {
                location: format!("catalog entry {extension}"),
                offset: start.max(0) as u64,
                found: Vec::new(),
            });
        }

        entries.push(CatalogEntry {
            extension: extension.to_string(),
            start: start as u64,
            length: length as u64,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use byteorder::{BigEndian, ByteOrder, LittleEndian};

    use super::*;
    use crate::bundle::layouts::BUNDLE_ITEM;

    fn header_bytes<B: ByteOrder>(little: bool, entries: &[(&str, i32, i32)], items: i32) -> Vec<u8> {
        let mut bytes = vec![0u8; BundleHeader::SIZE];
        bytes[..4].copy_from_slice(b"DAT2");
        bytes[8..14].copy_from_slice(b"v2x90 ");
        B::write_f64(&mut bytes[40..48], 3.6e9);
        B::write_i32(&mut bytes[48..52], items);
        bytes[52] = u8::from(little);

        let base = BUNDLE_HEADER.offset_of("BundleItems").unwrap();
        for (i, (ext, start, length)) in entries.iter().enumerate() {
            let slot = base + i * BUNDLE_ITEM.required_size;
            B::write_i32(&mut bytes[slot..slot + 4], *start);
            B::write_i32(&mut bytes[slot + 4..slot + 8], *length);
            bytes[slot + 8..slot + 8 + ext.len()].copy_from_slice(ext.as_bytes());
        }
        bytes
    }

    #[test]
    fn test_header__little_endian__then_catalog_entries() {
        let bytes = header_bytes::<LittleEndian>(
            true,
            &[(".dat", 256, 100), (".pul", 356, 40), ("", 0, 0)],
            3,
        );

        let (header, endian) = BundleHeader::parse(&bytes).unwrap();

        assert_eq!(endian, Endian::Little);
        assert_eq!(header.signature, "DAT2");
        assert_eq!(header.version, "v2x90 ");
        assert_eq!(header.time, 3.6e9);
        assert_eq!(header.entries.len(), 2);
        assert_eq!(header.entry(".pul").unwrap().start, 356);
        assert_eq!(header.entry(".pul").unwrap().end(), 396);
        assert!(header.entry(".amp").is_none());
    }

    #[test]
    fn test_header__big_endian_flag_clear__then_reread_big_endian() {
        let bytes = header_bytes::<BigEndian>(false, &[(".pul", 256, 1024)], 1);

        let (header, endian) = BundleHeader::parse(&bytes).unwrap();

        assert_eq!(endian, Endian::Big);
        assert!(!header.is_little_endian);
        assert_eq!(header.items, 1);
        assert_eq!(header.entry(".pul").unwrap().length, 1024);
    }

    #[test]
    fn test_header__items_beyond_slots__then_clamped_to_twelve() {
        let entries: Vec<(String, i32, i32)> = (0..12).map(|i| (format!(".x{i}"), 256, 1)).collect();
        let borrowed: Vec<(&str, i32, i32)> = entries.iter().map(|(e, s, l)| (e.as_str(), *s, *l)).collect();
        let bytes = header_bytes::<LittleEndian>(true, &borrowed, 40);

        let (header, _) = BundleHeader::parse(&bytes).unwrap();

        assert_eq!(header.entries.len(), 12);
    }

    #[test]
    fn test_header__bad_signature__then_endian_detection_failure() {
        let mut bytes = header_bytes::<LittleEndian>(true, &[], 0);
        bytes[..4].copy_from_slice(b"JUNK");

        let err = BundleHeader::parse(&bytes).unwrap_err();

        assert!(matches!(err, BundleError::EndianDetectionFailure { offset: 0, .. }));
    }

    #[test]
    fn test_header__short_file__then_endian_detection_failure() {
        let err = BundleHeader::parse(&[0u8; 100]).unwrap_err();

        assert!(matches!(err, BundleError::EndianDetectionFailure { .. }));
    }
}
