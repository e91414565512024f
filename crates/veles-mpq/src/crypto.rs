//! The Storm cipher used by MPQ archives.
//!
//! Table lookups, filename hashing, and block en/decryption all derive from
//! one 0x500-entry table seeded with a fixed linear congruential generator.
//! The hash doubles as both the bucket index into the hash table (kind 0)
//! and the verification pair stored in it (kinds 1 and 2); kind 3 produces
//! file encryption keys.

/// Hash kind: bucket index into the hash table.
pub const HASH_TABLE_INDEX: u32 = 0;
/// Hash kind: first verification hash.
pub const HASH_NAME_A: u32 = 1;
/// Hash kind: second verification hash.
pub const HASH_NAME_B: u32 = 2;
/// Hash kind: file encryption key.
pub const HASH_FILE_KEY: u32 = 3;

/// The shared crypt table, built once at first use.
fn crypt_table() -> &'static [u32; 0x500] {
    use std::sync::OnceLock;
    static TABLE: OnceLock<[u32; 0x500]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u32; 0x500];
        let mut seed: u32 = 0x0010_0001;
        for i in 0..0x100 {
            let mut index = i;
            for _ in 0..5 {
                seed = (seed.wrapping_mul(125).wrapping_add(3)) % 0x2A_AAAB;
                let high = (seed & 0xFFFF) << 16;
                seed = (seed.wrapping_mul(125).wrapping_add(3)) % 0x2A_AAAB;
                let low = seed & 0xFFFF;
                table[index] = high | low;
                index += 0x100;
            }
        }
        table
    })
}

/// Hash a file name with one of the four hash kinds.
///
/// Names are case-insensitive and use `\` as the path separator; `/` is
/// normalized before hashing.
pub fn hash_string(name: &str, kind: u32) -> u32 {
    let table = crypt_table();
    let mut seed1: u32 = 0x7FED_7FED;
    let mut seed2: u32 = 0xEEEE_EEEE;

    for &byte in name.as_bytes() {
        let ch = match byte {
            b'/' => b'\\',
            b'a'..=b'z' => byte - 0x20,
            _ => byte,
        } as u32;
        seed1 = table[(kind * 0x100 + ch) as usize] ^ seed1.wrapping_add(seed2);
        seed2 = ch
            .wrapping_add(seed1)
            .wrapping_add(seed2)
            .wrapping_add(seed2 << 5)
            .wrapping_add(3);
    }
    seed1
}

/// Encryption key for a file, derived from its base name (the part after
/// the last path separator).
pub fn file_key(name: &str) -> u32 {
    let base = name
        .rsplit(['\\', '/'])
        .next()
        .unwrap_or(name);
    hash_string(base, HASH_FILE_KEY)
}

/// Decrypt a block of u32 values in place.
pub fn decrypt_block(data: &mut [u32], mut key: u32) {
    let table = crypt_table();
    let mut seed: u32 = 0xEEEE_EEEE;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(table[(0x400 + (key & 0xFF)) as usize]);
        let decrypted = *value ^ key.wrapping_add(seed);
        key = ((!key) << 0x15)
            .wrapping_add(0x1111_1111)
            | (key >> 0x0B);
        seed = decrypted
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
        *value = decrypted;
    }
}

/// Encrypt a block of u32 values in place.
///
/// The seed chain runs over the plaintext, which is what makes this the
/// exact inverse of [`decrypt_block`].
pub fn encrypt_block(data: &mut [u32], mut key: u32) {
    let table = crypt_table();
    let mut seed: u32 = 0xEEEE_EEEE;

    for value in data.iter_mut() {
        seed = seed.wrapping_add(table[(0x400 + (key & 0xFF)) as usize]);
        let plain = *value;
        *value = plain ^ key.wrapping_add(seed);
        key = ((!key) << 0x15)
            .wrapping_add(0x1111_1111)
            | (key >> 0x0B);
        seed = plain
            .wrapping_add(seed)
            .wrapping_add(seed << 5)
            .wrapping_add(3);
    }
}

/// Decrypt a byte buffer in place, interpreting it as little-endian u32s.
/// A trailing partial word is left untouched, matching Storm.
pub fn decrypt_bytes(data: &mut [u8], key: u32) {
    let words = data.len() / 4;
    let mut block = vec![0u32; words];
    for (i, word) in block.iter_mut().enumerate() {
        *word = u32::from_le_bytes([
            data[i * 4],
            data[i * 4 + 1],
            data[i * 4 + 2],
            data[i * 4 + 3],
        ]);
    }
    decrypt_block(&mut block, key);
    for (i, word) in block.iter().enumerate() {
        data[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_key_hashes() {
        // Reference values every Storm-compatible implementation agrees on.
        assert_eq!(hash_string("(hash table)", HASH_FILE_KEY), 0xC3AF3770);
        assert_eq!(hash_string("(block table)", HASH_FILE_KEY), 0xEC83B3A3);
    }

    #[test]
    fn test_hash_is_case_and_slash_insensitive() {
        let a = hash_string("war3map.w3i", HASH_NAME_A);
        let b = hash_string("WAR3MAP.W3I", HASH_NAME_A);
        assert_eq!(a, b);

        let c = hash_string("units\\human\\footman.mdx", HASH_NAME_B);
        let d = hash_string("units/human/footman.mdx", HASH_NAME_B);
        assert_eq!(c, d);
    }

    #[test]
    fn test_block_roundtrip() {
        let original: Vec<u32> = (0..64).map(|i| i * 0x01010101).collect();
        let key = hash_string("some file", HASH_FILE_KEY);

        let mut data = original.clone();
        encrypt_block(&mut data, key);
        assert_ne!(data, original);
        decrypt_block(&mut data, key);
        assert_eq!(data, original);
    }

    #[test]
    fn test_file_key_uses_base_name() {
        assert_eq!(
            file_key("units\\human\\footman.mdx"),
            hash_string("footman.mdx", HASH_FILE_KEY)
        );
    }
}
