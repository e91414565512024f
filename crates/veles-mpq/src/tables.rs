//! MPQ header and table layouts.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::crypto;

/// Block index sentinel: hash table slot never used.
pub const BLOCK_INDEX_EMPTY: u32 = 0xFFFF_FFFF;
/// Block index sentinel: hash table slot deleted; probing continues past it.
pub const BLOCK_INDEX_DELETED: u32 = 0xFFFF_FFFE;

/// Archive header (without the 4-byte magic).
///
/// Only format version 0 (the Warcraft III layout) is handled; later
/// versions extend this header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct MpqHeader {
    /// Size of this header, magic included (32 for v0).
    pub header_size: u32,
    /// Size of the whole archive from the header start.
    pub archive_size: u32,
    /// Format version; 0 for Warcraft III.
    pub format_version: u16,
    /// Sector size is `512 << sector_shift`.
    pub sector_shift: u16,
    /// Hash table offset, relative to the header start.
    pub hash_table_offset: u32,
    /// Block table offset, relative to the header start.
    pub block_table_offset: u32,
    /// Number of hash table entries (a power of two).
    pub hash_table_count: u32,
    /// Number of block table entries.
    pub block_table_count: u32,
}

impl MpqHeader {
    /// Header magic bytes.
    pub const MAGIC: [u8; 4] = *b"MPQ\x1A";

    /// Serialized size of the v0 header, magic included.
    pub const BYTE_LEN: usize = 32;

    /// Bytes per sector for this archive.
    pub fn sector_size(&self) -> usize {
        512 << self.sector_shift
    }
}

/// One hash table entry. The table is an open-addressed map from hashed
/// file names to block indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashEntry {
    pub name_a: u32,
    pub name_b: u32,
    pub locale: u16,
    pub platform: u16,
    pub block_index: u32,
}

impl HashEntry {
    /// Serialized size.
    pub const BYTE_LEN: usize = 16;

    /// An entry that has never held a file.
    pub const EMPTY: Self = Self {
        name_a: 0xFFFF_FFFF,
        name_b: 0xFFFF_FFFF,
        locale: 0xFFFF,
        platform: 0xFFFF,
        block_index: BLOCK_INDEX_EMPTY,
    };

    fn from_words(words: &[u32]) -> Self {
        Self {
            name_a: words[0],
            name_b: words[1],
            locale: (words[2] & 0xFFFF) as u16,
            platform: (words[2] >> 16) as u16,
            block_index: words[3],
        }
    }

    fn to_words(self) -> [u32; 4] {
        [
            self.name_a,
            self.name_b,
            (self.locale as u32) | ((self.platform as u32) << 16),
            self.block_index,
        ]
    }
}

/// One block table entry describing where a file's data lives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockEntry {
    /// File data offset, relative to the header start.
    pub offset: u32,
    /// Stored size on disk.
    pub compressed_size: u32,
    /// Uncompressed size.
    pub file_size: u32,
    pub flags: u32,
}

impl BlockEntry {
    /// Serialized size.
    pub const BYTE_LEN: usize = 16;

    /// Sectors are individually compressed, first byte of each being the
    /// method mask.
    pub const FLAG_COMPRESS: u32 = 0x0000_0200;
    /// File data is encrypted with a key derived from its name.
    pub const FLAG_ENCRYPTED: u32 = 0x0001_0000;
    /// The encryption key is adjusted by the block offset and file size.
    pub const FLAG_FIX_KEY: u32 = 0x0002_0000;
    /// Whole file is one compression unit with no sector table.
    pub const FLAG_SINGLE_UNIT: u32 = 0x0100_0000;
    /// Entry describes a real file.
    pub const FLAG_EXISTS: u32 = 0x8000_0000;

    pub fn is_compressed(&self) -> bool {
        self.flags & Self::FLAG_COMPRESS != 0
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & Self::FLAG_ENCRYPTED != 0
    }

    pub fn is_single_unit(&self) -> bool {
        self.flags & Self::FLAG_SINGLE_UNIT != 0
    }

    fn from_words(words: &[u32]) -> Self {
        Self {
            offset: words[0],
            compressed_size: words[1],
            file_size: words[2],
            flags: words[3],
        }
    }

    fn to_words(self) -> [u32; 4] {
        [self.offset, self.compressed_size, self.file_size, self.flags]
    }
}

/// Decrypt and decode the hash table.
pub fn decode_hash_table(data: &[u8], count: usize) -> Vec<HashEntry> {
    decode_words(data, count, crypto::hash_string("(hash table)", crypto::HASH_FILE_KEY))
        .chunks_exact(4)
        .map(HashEntry::from_words)
        .collect()
}

/// Decrypt and decode the block table.
pub fn decode_block_table(data: &[u8], count: usize) -> Vec<BlockEntry> {
    decode_words(data, count, crypto::hash_string("(block table)", crypto::HASH_FILE_KEY))
        .chunks_exact(4)
        .map(BlockEntry::from_words)
        .collect()
}

/// Encode and encrypt the hash table.
pub fn encode_hash_table(entries: &[HashEntry]) -> Vec<u8> {
    encode_words(
        entries.iter().flat_map(|e| e.to_words()).collect(),
        crypto::hash_string("(hash table)", crypto::HASH_FILE_KEY),
    )
}

/// Encode and encrypt the block table.
pub fn encode_block_table(entries: &[BlockEntry]) -> Vec<u8> {
    encode_words(
        entries.iter().flat_map(|e| e.to_words()).collect(),
        crypto::hash_string("(block table)", crypto::HASH_FILE_KEY),
    )
}

fn decode_words(data: &[u8], count: usize, key: u32) -> Vec<u32> {
    let mut words = vec![0u32; count * 4];
    for (i, word) in words.iter_mut().enumerate() {
        *word = u32::from_le_bytes([
            data[i * 4],
            data[i * 4 + 1],
            data[i * 4 + 2],
            data[i * 4 + 3],
        ]);
    }
    crypto::decrypt_block(&mut words, key);
    words
}

fn encode_words(mut words: Vec<u32>, key: u32) -> Vec<u8> {
    crypto::encrypt_block(&mut words, key);
    let mut data = Vec::with_capacity(words.len() * 4);
    for word in words {
        data.extend_from_slice(&word.to_le_bytes());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_table_roundtrip() {
        let entries = vec![
            HashEntry {
                name_a: 0x12345678,
                name_b: 0x9ABCDEF0,
                locale: 0,
                platform: 0,
                block_index: 0,
            },
            HashEntry::EMPTY,
        ];

        let encoded = encode_hash_table(&entries);
        assert_eq!(encoded.len(), entries.len() * HashEntry::BYTE_LEN);
        assert_eq!(decode_hash_table(&encoded, entries.len()), entries);
    }

    #[test]
    fn test_block_table_roundtrip() {
        let entries = vec![BlockEntry {
            offset: 32,
            compressed_size: 100,
            file_size: 400,
            flags: BlockEntry::FLAG_EXISTS | BlockEntry::FLAG_COMPRESS,
        }];

        let encoded = encode_block_table(&entries);
        assert_eq!(decode_block_table(&encoded, 1), entries);
    }

    #[test]
    fn test_sector_size() {
        let header = MpqHeader {
            header_size: 32,
            archive_size: 0,
            format_version: 0,
            sector_shift: 3,
            hash_table_offset: 0,
            block_table_offset: 0,
            hash_table_count: 0,
            block_table_count: 0,
        };
        assert_eq!(header.sector_size(), 4096);
    }
}
