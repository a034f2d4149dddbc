//! Reader for HotSpot performance-data files.
//!
//! A JVM started with performance data enabled (the default) maps a file
//! named after its pid into `<tmp>/hsperfdata_<user>/`. The file is a flat
//! table of named counters: a fixed prologue followed by self-describing
//! entries. Only NUL-terminated byte strings are decoded, as the locator
//! reads nothing else; other entries are skipped. Every offset is bounds-checked so a
//! truncated or half-written file becomes a [`PerfDataError`] rather than a
//! panic.

use std::collections::HashMap;

use thiserror::Error;

/// Magic number at the start of every perf-data file, always big-endian.
pub const MAGIC: u32 = 0xCAFE_C0C0;
/// Length of the fixed prologue.
pub const PROLOGUE_LEN: usize = 32;
/// Length of the fixed part of an entry header.
pub const ENTRY_HEADER_LEN: usize = 20;
/// Prologue layout version this reader understands.
pub const SUPPORTED_MAJOR_VERSION: u8 = 2;

const TYPE_BYTE: u8 = b'B';

const BYTE_ORDER_OFFSET: usize = 4;
const MAJOR_VERSION_OFFSET: usize = 5;
const MINOR_VERSION_OFFSET: usize = 6;
const ACCESSIBLE_OFFSET: usize = 7;
const ENTRY_OFFSET_OFFSET: usize = 24;
const NUM_ENTRIES_OFFSET: usize = 28;

/// Errors raised while decoding a perf-data file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PerfDataError {
    /// The file does not start with the perf-data magic number.
    #[error("bad perf-data magic {found:#010x}")]
    BadMagic { found: u32 },
    /// The byte-order flag is neither big (0) nor little (1) endian.
    #[error("unknown perf-data byte order flag {flag}")]
    UnknownByteOrder { flag: u8 },
    /// The prologue version is not supported.
    #[error("unsupported perf-data version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },
    /// The JVM has not finished publishing its counters.
    #[error("perf-data is not yet accessible")]
    NotAccessible,
    /// A read ran past the end of the file.
    #[error("perf-data truncated at offset {offset}")]
    Truncated { offset: usize },
    /// A header field holds an impossible value.
    #[error("corrupt perf-data: {reason}")]
    Corrupt { reason: String },
}

/// Byte order declared by the perf-data prologue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first.
    Big,
    /// Least significant byte first.
    Little,
}

impl ByteOrder {
    fn from_flag(flag: u8) -> Result<Self, PerfDataError> {
        match flag {
            0 => Ok(Self::Big),
            1 => Ok(Self::Little),
            other => Err(PerfDataError::UnknownByteOrder { flag: other }),
        }
    }

    /// Flag value written to the prologue for this order.
    #[must_use]
    pub const fn flag(self) -> u8 {
        match self {
            Self::Big => 0,
            Self::Little => 1,
        }
    }

    /// Encodes a 32-bit value in this order.
    #[must_use]
    pub const fn encode_i32(self, value: i32) -> [u8; 4] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    /// Encodes a 64-bit value in this order.
    #[must_use]
    pub const fn encode_i64(self, value: i64) -> [u8; 8] {
        match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        }
    }

    const fn decode_i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            Self::Big => i32::from_be_bytes(bytes),
            Self::Little => i32::from_le_bytes(bytes),
        }
    }
}

/// Counters decoded from one perf-data file.
#[derive(Debug, Clone, Default)]
pub struct PerfData {
    entries: HashMap<String, String>,
}

impl PerfData {
    /// Decodes the counters in `data`.
    ///
    /// Entries other than byte vectors are skipped.
    pub fn parse(data: &[u8]) -> Result<Self, PerfDataError> {
        let magic = u32::from_be_bytes(fixed::<4>(data, 0)?);
        if magic != MAGIC {
            return Err(PerfDataError::BadMagic { found: magic });
        }
        let order = ByteOrder::from_flag(byte_at(data, BYTE_ORDER_OFFSET)?)?;
        let major = byte_at(data, MAJOR_VERSION_OFFSET)?;
        let minor = byte_at(data, MINOR_VERSION_OFFSET)?;
        if major != SUPPORTED_MAJOR_VERSION {
            return Err(PerfDataError::UnsupportedVersion { major, minor });
        }
        if byte_at(data, ACCESSIBLE_OFFSET)? == 0 {
            return Err(PerfDataError::NotAccessible);
        }

        let reader = Reader { data, order };
        let mut offset = reader.offset_at(ENTRY_OFFSET_OFFSET, "entry offset")?;
        let count = reader.offset_at(NUM_ENTRIES_OFFSET, "entry count")?;
        let room = data.len().saturating_sub(offset) / ENTRY_HEADER_LEN;
        if count > room {
            return Err(PerfDataError::Corrupt {
                reason: format!("{count} entries cannot fit in {} bytes", data.len()),
            });
        }

        let mut entries = HashMap::with_capacity(count);
        for _ in 0..count {
            let entry_length = reader.offset_at(offset, "entry length")?;
            if entry_length < ENTRY_HEADER_LEN {
                return Err(PerfDataError::Corrupt {
                    reason: format!("entry at {offset} is {entry_length} bytes long"),
                });
            }
            if let Some((name, value)) = reader.entry(offset, entry_length)? {
                entries.insert(name, value);
            }
            offset = offset
                .checked_add(entry_length)
                .ok_or(PerfDataError::Truncated { offset })?;
        }
        Ok(Self { entries })
    }

    /// Returns the text counter called `name`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }
}

struct Reader<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

impl Reader<'_> {
    fn i32_at(&self, offset: usize) -> Result<i32, PerfDataError> {
        fixed::<4>(self.data, offset).map(|bytes| self.order.decode_i32(bytes))
    }

    fn offset_at(&self, offset: usize, field: &str) -> Result<usize, PerfDataError> {
        let raw = self.i32_at(offset)?;
        usize::try_from(raw).map_err(|_| PerfDataError::Corrupt {
            reason: format!("negative {field} {raw} at {offset}"),
        })
    }

    fn entry(
        &self,
        start: usize,
        entry_length: usize,
    ) -> Result<Option<(String, String)>, PerfDataError> {
        let end = start
            .checked_add(entry_length)
            .filter(|end| *end <= self.data.len())
            .ok_or(PerfDataError::Truncated { offset: start })?;
        let entry = self
            .data
            .get(start..end)
            .ok_or(PerfDataError::Truncated { offset: start })?;
        let local = Reader {
            data: entry,
            order: self.order,
        };

        let name_offset = local.offset_at(4, "name offset")?;
        let vector_length = local.offset_at(8, "vector length")?;
        let data_type = byte_at(entry, 12)?;
        let data_offset = local.offset_at(16, "data offset")?;

        let name = nul_terminated(entry.get(name_offset..).ok_or(PerfDataError::Truncated {
            offset: start + name_offset,
        })?);

        if data_type != TYPE_BYTE || vector_length == 0 {
            return Ok(None);
        }
        let bytes = data_offset
            .checked_add(vector_length)
            .and_then(|data_end| entry.get(data_offset..data_end))
            .ok_or(PerfDataError::Truncated {
                offset: start + data_offset,
            })?;
        Ok(Some((name, nul_terminated(bytes))))
    }
}

fn byte_at(data: &[u8], offset: usize) -> Result<u8, PerfDataError> {
    data.get(offset)
        .copied()
        .ok_or(PerfDataError::Truncated { offset })
}

fn fixed<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], PerfDataError> {
    offset
        .checked_add(N)
        .and_then(|end| data.get(offset..end))
        .and_then(|slice| <[u8; N]>::try_from(slice).ok())
        .ok_or(PerfDataError::Truncated { offset })
}

fn nul_terminated(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|byte| *byte == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(bytes.get(..end).unwrap_or_default()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PerfDataImage;
    use rstest::rstest;

    #[rstest]
    #[case(ByteOrder::Big)]
    #[case(ByteOrder::Little)]
    fn decodes_text_and_skips_long_counters(#[case] order: ByteOrder) {
        let image = PerfDataImage::new(order)
            .text("sun.rt.javaCommand", "com.app.Main --port 8080")
            .long("sun.os.hrt.frequency", 1_000_000_000)
            .build();

        let data = PerfData::parse(&image).expect("image should decode");

        assert_eq!(
            data.text("sun.rt.javaCommand"),
            Some("com.app.Main --port 8080")
        );
        assert_eq!(data.text("sun.os.hrt.frequency"), None);
        assert_eq!(data.text("missing"), None);
    }

    #[test]
    fn text_stops_at_first_nul() {
        let image = PerfDataImage::new(ByteOrder::Little)
            .text_with_capacity("java.rt.vmArgs", "-Xmx1g", 64)
            .build();
        let data = PerfData::parse(&image).expect("image should decode");
        assert_eq!(data.text("java.rt.vmArgs"), Some("-Xmx1g"));
    }

    #[test]
    fn rejects_foreign_files() {
        let error = PerfData::parse(b"#!/bin/sh\nexec java -jar app.jar\n").unwrap_err();
        assert!(matches!(error, PerfDataError::BadMagic { .. }));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut image = PerfDataImage::new(ByteOrder::Big).build();
        image[MAJOR_VERSION_OFFSET] = 1;
        let error = PerfData::parse(&image).unwrap_err();
        assert_eq!(
            error,
            PerfDataError::UnsupportedVersion { major: 1, minor: 0 }
        );
    }

    #[test]
    fn rejects_unpublished_counters() {
        let mut image = PerfDataImage::new(ByteOrder::Big).build();
        image[ACCESSIBLE_OFFSET] = 0;
        assert_eq!(PerfData::parse(&image).unwrap_err(), PerfDataError::NotAccessible);
    }

    #[test]
    fn truncated_entry_table_is_an_error() {
        let image = PerfDataImage::new(ByteOrder::Little)
            .text("sun.rt.javaCommand", "com.app.Main")
            .build();
        let cut = &image[..image.len() - 4];
        let error = PerfData::parse(cut).unwrap_err();
        assert!(matches!(error, PerfDataError::Truncated { .. }));
    }

    #[rstest]
    #[case(ByteOrder::Big)]
    #[case(ByteOrder::Little)]
    fn entry_count_larger_than_the_file_is_corrupt(#[case] order: ByteOrder) {
        let mut image = PerfDataImage::new(order).build();
        image[NUM_ENTRIES_OFFSET..NUM_ENTRIES_OFFSET + 4]
            .copy_from_slice(&order.encode_i32(i32::MAX));
        let error = PerfData::parse(&image).unwrap_err();
        assert!(matches!(error, PerfDataError::Corrupt { .. }), "{error}");
    }

    #[test]
    fn empty_input_is_truncated_not_a_panic() {
        assert_eq!(
            PerfData::parse(&[]).unwrap_err(),
            PerfDataError::Truncated { offset: 0 }
        );
    }
}
