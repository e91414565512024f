//! MPQ archive reader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use memmap2::Mmap;
use veles_common::BinaryReader;

use crate::crypto;
use crate::tables::{
    decode_block_table, decode_hash_table, BlockEntry, HashEntry, MpqHeader, BLOCK_INDEX_DELETED,
    BLOCK_INDEX_EMPTY,
};
use crate::{Error, Result};

/// Compression method bit for zlib, the only method Warcraft III tools emit
/// and the only one this crate decodes.
pub const COMPRESSION_ZLIB: u8 = 0x02;

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Owned(data) => data,
        }
    }
}

/// A file entry resolved from the tables.
#[derive(Debug, Clone, Copy)]
pub struct MpqEntry<'a> {
    /// Name the entry was looked up by. Entries enumerated without a
    /// listfile have no recoverable name.
    pub name: &'a str,
    pub block_index: usize,
    pub compressed_size: u64,
    pub file_size: u64,
    pub is_encrypted: bool,
    pub is_compressed: bool,
}

/// An MPQ archive opened for reading.
///
/// Archives can start at any 512-byte multiple inside the containing file;
/// W3X maps put a 512-byte campaign preamble before the header, and the
/// scan handles both cases uniformly.
pub struct MpqArchive {
    backing: Backing,
    header_offset: usize,
    header: MpqHeader,
    hash_table: Vec<HashEntry>,
    block_table: Vec<BlockEntry>,
}

impl MpqArchive {
    /// Open an archive by memory-mapping the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_backing(Backing::Mapped(mmap))
    }

    /// Parse an archive from an in-memory buffer.
    pub fn parse(data: Vec<u8>) -> Result<Self> {
        Self::from_backing(Backing::Owned(data))
    }

    fn from_backing(backing: Backing) -> Result<Self> {
        let data = backing.bytes();
        let header_offset = Self::find_header(data)?;

        let mut reader = BinaryReader::new_at(data, header_offset + 4);
        let header: MpqHeader = reader.read_struct()?;

        if header.format_version != 0 {
            return Err(Error::UnsupportedVersion(header.format_version));
        }

        let hash_table = decode_hash_table(
            table_slice(
                data,
                header_offset,
                header.hash_table_offset,
                header.hash_table_count as usize * HashEntry::BYTE_LEN,
                "hash table",
            )?,
            header.hash_table_count as usize,
        );
        let block_table = decode_block_table(
            table_slice(
                data,
                header_offset,
                header.block_table_offset,
                header.block_table_count as usize * BlockEntry::BYTE_LEN,
                "block table",
            )?,
            header.block_table_count as usize,
        );

        Ok(Self {
            backing,
            header_offset,
            header,
            hash_table,
            block_table,
        })
    }

    /// Scan for the header magic at 512-byte multiples.
    fn find_header(data: &[u8]) -> Result<usize> {
        let mut offset = 0;
        while offset + MpqHeader::BYTE_LEN <= data.len() {
            if data[offset..offset + 4] == MpqHeader::MAGIC {
                return Ok(offset);
            }
            offset += 512;
        }
        Err(Error::HeaderNotFound)
    }

    /// Number of block table entries (the file count upper bound).
    pub fn file_count(&self) -> usize {
        self.block_table.len()
    }

    /// Look up a file by name.
    pub fn find<'a>(&self, name: &'a str) -> Option<MpqEntry<'a>> {
        if self.hash_table.is_empty() {
            return None;
        }
        let mask = self.hash_table.len() as u32 - 1;
        let start = crypto::hash_string(name, crypto::HASH_TABLE_INDEX) & mask;
        let name_a = crypto::hash_string(name, crypto::HASH_NAME_A);
        let name_b = crypto::hash_string(name, crypto::HASH_NAME_B);

        for probe in 0..self.hash_table.len() as u32 {
            let entry = &self.hash_table[((start + probe) & mask) as usize];
            match entry.block_index {
                BLOCK_INDEX_EMPTY => return None,
                BLOCK_INDEX_DELETED => continue,
                block_index if entry.name_a == name_a && entry.name_b == name_b => {
                    let block = self.block_table.get(block_index as usize)?;
                    if block.flags & BlockEntry::FLAG_EXISTS == 0 {
                        return None;
                    }
                    return Some(MpqEntry {
                        name,
                        block_index: block_index as usize,
                        compressed_size: block.compressed_size as u64,
                        file_size: block.file_size as u64,
                        is_encrypted: block.is_encrypted(),
                        is_compressed: block.is_compressed(),
                    });
                }
                _ => continue,
            }
        }
        None
    }

    /// Check for a file without resolving its block.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Read and decode a file's contents.
    pub fn read(&self, entry: &MpqEntry<'_>) -> Result<Vec<u8>> {
        let block = self.block_table[entry.block_index];
        let file_size = block.file_size as usize;
        if file_size == 0 {
            return Ok(Vec::new());
        }

        let data = table_slice(
            self.backing.bytes(),
            self.header_offset,
            block.offset,
            block.compressed_size as usize,
            "file data",
        )?;

        let mut key = if block.is_encrypted() {
            let mut key = crypto::file_key(entry.name);
            if block.flags & BlockEntry::FLAG_FIX_KEY != 0 {
                key = key.wrapping_add(block.offset) ^ block.file_size;
            }
            Some(key)
        } else {
            None
        };

        if block.is_single_unit() {
            let mut sector = data.to_vec();
            if let Some(key) = key {
                crypto::decrypt_bytes(&mut sector, key);
            }
            return if block.is_compressed() && sector.len() < file_size {
                decode_sector(&sector, file_size, "file")
            } else {
                Ok(sector)
            };
        }

        let sector_size = self.header.sector_size();
        let sector_count = file_size.div_ceil(sector_size);

        if !block.is_compressed() {
            // Uncompressed sector-based files are stored back to back.
            let mut output = data.to_vec();
            if let Some(key) = key.as_mut() {
                for (i, chunk) in output.chunks_mut(sector_size).enumerate() {
                    crypto::decrypt_bytes(chunk, key.wrapping_add(i as u32));
                }
            }
            return Ok(output);
        }

        // Sector offset table: sector_count + 1 little-endian u32s,
        // encrypted with key - 1 when the file is encrypted.
        let table_len = (sector_count + 1) * 4;
        if data.len() < table_len {
            return Err(Error::SizeMismatch {
                what: "sector offset table",
                expected: table_len,
                actual: data.len(),
            });
        }
        let mut offsets_bytes = data[..table_len].to_vec();
        if let Some(key) = key {
            crypto::decrypt_bytes(&mut offsets_bytes, key.wrapping_sub(1));
        }
        let mut offsets_reader = BinaryReader::new(&offsets_bytes);
        let offsets = offsets_reader.read_u32_array(sector_count + 1)?;

        let mut output = Vec::with_capacity(file_size);
        for i in 0..sector_count {
            let start = offsets[i] as usize;
            let end = offsets[i + 1] as usize;
            if start > end || end > data.len() {
                return Err(Error::OutOfBounds {
                    what: "sector",
                    offset: start,
                    len: end.saturating_sub(start),
                });
            }

            let expected = sector_size.min(file_size - output.len());
            let mut sector = data[start..end].to_vec();
            if let Some(key) = key {
                crypto::decrypt_bytes(&mut sector, key.wrapping_add(i as u32));
            }

            if sector.len() < expected {
                output.extend_from_slice(&decode_sector(&sector, expected, "sector")?);
            } else {
                output.extend_from_slice(&sector);
            }
        }

        if output.len() != file_size {
            return Err(Error::SizeMismatch {
                what: "file",
                expected: file_size,
                actual: output.len(),
            });
        }
        Ok(output)
    }

    /// Find and read a file in one call.
    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .find(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.read(&entry)
    }

    /// Enumerate file names from the archive's `(listfile)`, if present.
    ///
    /// The listfile is a plain text index with one name per line; archives
    /// without one can still be read by known names.
    pub fn list_files(&self) -> Result<Vec<String>> {
        let data = self.read_file("(listfile)")?;
        let text = String::from_utf8_lossy(&data);
        Ok(text
            .split(['\r', '\n', ';'])
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl std::fmt::Debug for MpqArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpqArchive")
            .field("header_offset", &self.header_offset)
            .field("hash_entries", &self.hash_table.len())
            .field("block_entries", &self.block_table.len())
            .finish()
    }
}

/// Slice out a region relative to the header start, bounds-checked.
fn table_slice<'a>(
    data: &'a [u8],
    header_offset: usize,
    relative_offset: u32,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8]> {
    let start = header_offset + relative_offset as usize;
    let end = start.checked_add(len).filter(|&end| end <= data.len());
    match end {
        Some(end) => Ok(&data[start..end]),
        None => Err(Error::OutOfBounds {
            what,
            offset: start,
            len,
        }),
    }
}

/// Decode one compression unit: a method mask byte followed by the
/// compressed payload.
fn decode_sector(sector: &[u8], expected: usize, what: &'static str) -> Result<Vec<u8>> {
    let (&mask, payload) = sector
        .split_first()
        .ok_or(Error::SizeMismatch {
            what,
            expected,
            actual: 0,
        })?;

    if mask != COMPRESSION_ZLIB {
        return Err(Error::UnsupportedCompression(mask));
    }

    let mut output = Vec::with_capacity(expected);
    ZlibDecoder::new(payload)
        .read_to_end(&mut output)
        .map_err(|e| Error::Decompression(e.to_string()))?;

    if output.len() != expected {
        return Err(Error::SizeMismatch {
            what,
            expected,
            actual: output.len(),
        });
    }
    Ok(output)
}
