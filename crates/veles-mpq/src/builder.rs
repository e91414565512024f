//! MPQ archive writer.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::archive::COMPRESSION_ZLIB;
use crate::crypto;
use crate::tables::{encode_block_table, encode_hash_table, BlockEntry, HashEntry, MpqHeader};
use crate::{Error, Result};

/// Builds a format-version-0 archive in memory.
///
/// Files are sector-compressed with zlib; sectors where compression does
/// not help are stored raw, which the sector size comparison on the read
/// side detects. Tables are encrypted with their well-known keys.
///
/// # Example
///
/// ```
/// use veles_mpq::{MpqArchive, MpqBuilder};
///
/// let mut builder = MpqBuilder::new();
/// builder.add("war3map.w3i", b"...".to_vec());
/// let archive = MpqArchive::parse(builder.build()?)?;
/// assert!(archive.contains("war3map.w3i"));
/// # Ok::<(), veles_mpq::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MpqBuilder {
    files: Vec<(String, Vec<u8>)>,
    sector_shift: u16,
}

impl MpqBuilder {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            // 4 KiB sectors, the size Blizzard's own tools use.
            sector_shift: 3,
        }
    }

    /// Queue a named file. Callers wanting an enumerable archive should add
    /// a `(listfile)` naming the others.
    pub fn add(&mut self, name: &str, data: Vec<u8>) -> &mut Self {
        self.files.push((name.to_string(), data));
        self
    }

    /// Number of files queued so far.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Lay out and emit the complete archive.
    pub fn build(&self) -> Result<Vec<u8>> {
        let sector_size = 512usize << self.sector_shift;
        let hash_count = self.files.len().max(1).next_power_of_two().max(4);

        let mut file_data = Vec::new();
        let mut block_table = Vec::with_capacity(self.files.len());
        let mut hash_table = vec![HashEntry::EMPTY; hash_count];

        for (index, (name, contents)) in self.files.iter().enumerate() {
            let offset = MpqHeader::BYTE_LEN + file_data.len();
            let stored = compress_sectors(contents, sector_size)?;

            block_table.push(BlockEntry {
                offset: offset as u32,
                compressed_size: stored.len() as u32,
                file_size: contents.len() as u32,
                flags: BlockEntry::FLAG_EXISTS | BlockEntry::FLAG_COMPRESS,
            });
            file_data.extend_from_slice(&stored);

            place_hash_entry(&mut hash_table, name, index as u32)?;
        }

        let hash_table_offset = MpqHeader::BYTE_LEN + file_data.len();
        let block_table_offset = hash_table_offset + hash_count * HashEntry::BYTE_LEN;
        let archive_size = block_table_offset + block_table.len() * BlockEntry::BYTE_LEN;

        let header = MpqHeader {
            header_size: MpqHeader::BYTE_LEN as u32,
            archive_size: archive_size as u32,
            format_version: 0,
            sector_shift: self.sector_shift,
            hash_table_offset: hash_table_offset as u32,
            block_table_offset: block_table_offset as u32,
            hash_table_count: hash_count as u32,
            block_table_count: block_table.len() as u32,
        };

        let mut archive = Vec::with_capacity(archive_size);
        archive.extend_from_slice(&MpqHeader::MAGIC);
        archive.extend_from_slice(zerocopy::IntoBytes::as_bytes(&header));
        archive.extend_from_slice(&file_data);
        archive.extend_from_slice(&encode_hash_table(&hash_table));
        archive.extend_from_slice(&encode_block_table(&block_table));

        debug_assert_eq!(archive.len(), archive_size);
        Ok(archive)
    }
}

/// Claim a hash table slot for `name` by linear probing.
fn place_hash_entry(table: &mut [HashEntry], name: &str, block_index: u32) -> Result<()> {
    let mask = table.len() as u32 - 1;
    let start = crypto::hash_string(name, crypto::HASH_TABLE_INDEX) & mask;
    let name_a = crypto::hash_string(name, crypto::HASH_NAME_A);
    let name_b = crypto::hash_string(name, crypto::HASH_NAME_B);

    for probe in 0..table.len() as u32 {
        let slot = &mut table[((start + probe) & mask) as usize];
        if slot.block_index == crate::tables::BLOCK_INDEX_EMPTY
            || (slot.name_a == name_a && slot.name_b == name_b)
        {
            *slot = HashEntry {
                name_a,
                name_b,
                locale: 0,
                platform: 0,
                block_index,
            };
            return Ok(());
        }
    }
    // Cannot happen with hash_count >= file count, but surface it rather
    // than loop forever if the invariant breaks.
    Err(Error::EntryNotFound(name.to_string()))
}

/// Compress a file into sector-table form: (n + 1) offsets then the
/// sector payloads, each either zlib with a method byte or raw.
fn compress_sectors(contents: &[u8], sector_size: usize) -> Result<Vec<u8>> {
    let sector_count = contents.len().div_ceil(sector_size).max(1);
    let table_len = (sector_count + 1) * 4;

    let mut payloads: Vec<Vec<u8>> = Vec::with_capacity(sector_count);
    if contents.is_empty() {
        payloads.push(Vec::new());
    }
    for sector in contents.chunks(sector_size) {
        let mut encoder =
            ZlibEncoder::new(Vec::with_capacity(sector.len()), Compression::default());
        encoder
            .write_all(sector)
            .map_err(|e| Error::Decompression(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| Error::Decompression(e.to_string()))?;

        if compressed.len() + 1 < sector.len() {
            let mut payload = Vec::with_capacity(compressed.len() + 1);
            payload.push(COMPRESSION_ZLIB);
            payload.extend_from_slice(&compressed);
            payloads.push(payload);
        } else {
            payloads.push(sector.to_vec());
        }
    }

    let total: usize = payloads.iter().map(Vec::len).sum();
    let mut stored = Vec::with_capacity(table_len + total);
    let mut offset = table_len as u32;
    stored.extend_from_slice(&offset.to_le_bytes());
    for payload in &payloads {
        offset += payload.len() as u32;
        stored.extend_from_slice(&offset.to_le_bytes());
    }
    for payload in &payloads {
        stored.extend_from_slice(payload);
    }
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MpqArchive;

    #[test]
    fn test_build_and_read_back() {
        let mut builder = MpqBuilder::new();
        let script = b"function main takes nothing returns nothing\nendfunction\n".to_vec();
        let blob: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        builder.add("war3map.j", script.clone());
        builder.add("war3map.w3i", blob.clone());
        builder.add("(listfile)", b"war3map.j\r\nwar3map.w3i\r\n".to_vec());

        let archive = MpqArchive::parse(builder.build().unwrap()).unwrap();
        assert_eq!(archive.file_count(), 3);
        assert_eq!(archive.read_file("war3map.j").unwrap(), script);
        assert_eq!(archive.read_file("war3map.w3i").unwrap(), blob);

        let names = archive.list_files().unwrap();
        assert_eq!(names, vec!["war3map.j", "war3map.w3i"]);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut builder = MpqBuilder::new();
        builder.add("Units\\Human\\Footman.mdx", vec![1, 2, 3]);

        let archive = MpqArchive::parse(builder.build().unwrap()).unwrap();
        assert!(archive.contains("units/human/FOOTMAN.MDX"));
        assert_eq!(
            archive.read_file("units\\human\\footman.mdx").unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_empty_file() {
        let mut builder = MpqBuilder::new();
        builder.add("empty.txt", Vec::new());

        let archive = MpqArchive::parse(builder.build().unwrap()).unwrap();
        assert_eq!(archive.read_file("empty.txt").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_missing_entry() {
        let archive = MpqArchive::parse(MpqBuilder::new().build().unwrap()).unwrap();
        assert!(matches!(
            archive.read_file("nope"),
            Err(Error::EntryNotFound(_))
        ));
    }

    #[test]
    fn test_header_found_past_preamble() {
        let mut builder = MpqBuilder::new();
        builder.add("war3map.w3e", vec![9; 300]);
        let bare = builder.build().unwrap();

        // W3X maps carry a 512-byte preamble before the archive proper.
        let mut with_preamble = vec![0u8; 512];
        with_preamble[..4].copy_from_slice(b"HM3W");
        with_preamble.extend_from_slice(&bare);

        let archive = MpqArchive::parse(with_preamble).unwrap();
        assert_eq!(archive.read_file("war3map.w3e").unwrap(), vec![9; 300]);
    }
}
