//! Payload decryption for the ETSI LI encryption container
//!
//! The container announces an encryption method; method 3 is AES-192-CBC
//! with an IV derived from the record's sequence number and no padding
//! (the plaintext was padded up to the block size at encryption time).
//! After decryption the plaintext is sanity-checked: it must start with a
//! constructed-sequence octet and its announced outer length plus padding
//! gap must account for every decrypted byte.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, KeyIvInit};
use aes::Aes192;
use etsili_core::error::{EtsiliError, EtsiliResult};

type Aes192CbcDec = cbc::Decryptor<Aes192>;

/// Encryption methods named by the container's encryptionType field.
pub const ENCRYPTION_NOT_STATED: i64 = 0;
pub const ENCRYPTION_NONE: i64 = 1;
pub const ENCRYPTION_NATIONAL: i64 = 2;
pub const ENCRYPTION_AES_192_CBC: i64 = 3;
pub const ENCRYPTION_AES_256_CBC: i64 = 4;
pub const ENCRYPTION_BLOWFISH_192_CBC: i64 = 5;
pub const ENCRYPTION_BLOWFISH_256_CBC: i64 = 6;
pub const ENCRYPTION_THREEDES_CBC: i64 = 7;

/// Derive the CBC IV for a record: the 32-bit sequence number in network
/// order, repeated four times.
pub fn derive_iv(seqno: u32) -> [u8; 16] {
    let be = seqno.to_be_bytes();
    let mut iv = [0u8; 16];
    for chunk in iv.chunks_exact_mut(4) {
        chunk.copy_from_slice(&be);
    }
    iv
}

/// Parse hex key material into the 24 key bytes AES-192 needs.
pub fn parse_key_hex(key_hex: &str) -> EtsiliResult<[u8; 24]> {
    let bytes = hex::decode(key_hex.trim())
        .map_err(|e| EtsiliError::Decryption(format!("invalid hex key material: {}", e)))?;
    bytes.as_slice().try_into().map_err(|_| {
        EtsiliError::Decryption(format!(
            "AES-192 key must be 24 bytes, got {}",
            bytes.len()
        ))
    })
}

/// Decrypt an AES-192-CBC payload. The ciphertext must be a whole number
/// of blocks; padding is not stripped here (the length sanity check
/// accounts for it instead).
pub fn decrypt_aes_192_cbc(
    key_hex: &str,
    seqno: u32,
    ciphertext: &[u8],
) -> EtsiliResult<Vec<u8>> {
    let key = parse_key_hex(key_hex)?;
    let iv = derive_iv(seqno);

    if ciphertext.is_empty() || ciphertext.len() % 16 != 0 {
        return Err(EtsiliError::Decryption(format!(
            "ciphertext length {} is not a whole number of AES blocks",
            ciphertext.len()
        )));
    }

    let mut work = ciphertext.to_vec();
    let plain_len = Aes192CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_mut::<NoPadding>(&mut work)
        .map_err(|e| EtsiliError::Decryption(format!("CBC decrypt failed: {}", e)))?
        .len();
    work.truncate(plain_len);
    Ok(work)
}

/// Check that decrypted bytes look like a BER payload: the outer item's
/// announced length plus its header, padded up to the next block boundary,
/// must equal the plaintext size exactly (pad gap strictly under one
/// block).
pub fn plaintext_shape_ok(data: &[u8]) -> bool {
    let dlen = data.len() as u64;
    if data.len() < 2 {
        return false;
    }

    let mut obslen: u64 = 0;
    let headerlen: u64;

    if data[1] < 0x80 {
        obslen = data[1] as u64;
        headerlen = 2;
    } else {
        let blen = (data[1] & 0x7f) as usize;
        if blen == 0 || blen > 8 {
            return false;
        }
        if data.len() <= 2 + blen {
            return false;
        }
        for i in 0..blen {
            obslen += (data[2 + i] as u64) << (8 * (blen - (i + 1)));
        }
        headerlen = 2 + blen as u64;
    }

    if obslen + headerlen > dlen {
        return false;
    }
    // Encryption padded the payload up to the nearest multiple of 16.
    if dlen - (obslen + headerlen) > 16 {
        return false;
    }

    let gap = if (obslen + headerlen) % 16 == 0 {
        0
    } else {
        16 - ((obslen + headerlen) % 16)
    };
    dlen - (obslen + headerlen) == gap
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncryptMut;

    type Aes192CbcEnc = cbc::Encryptor<Aes192>;

    const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f1011121314151617";

    #[test]
    fn test_iv_is_repeated_seqno() {
        let iv = derive_iv(0x00112233);
        assert_eq!(
            iv,
            [
                0x00, 0x11, 0x22, 0x33, 0x00, 0x11, 0x22, 0x33, 0x00, 0x11, 0x22, 0x33, 0x00,
                0x11, 0x22, 0x33
            ]
        );
    }

    #[test]
    fn test_key_parsing() {
        assert!(parse_key_hex(KEY_HEX).is_ok());
        assert!(parse_key_hex("abcd").is_err());
        assert!(parse_key_hex("zz").is_err());
    }

    #[test]
    fn test_decrypt_roundtrip() {
        // 0x30 sequence of announced length 6, padded to one block.
        let mut plain = vec![0x30, 0x06, 0x02, 0x01, 0x05, 0x02, 0x01, 0x07];
        plain.resize(16, 0);
        assert!(plaintext_shape_ok(&plain));

        let key = parse_key_hex(KEY_HEX).unwrap();
        let iv = derive_iv(42);
        let mut buf = plain.clone();
        Aes192CbcEnc::new(&key.into(), &iv.into())
            .encrypt_padded_mut::<NoPadding>(&mut buf, plain.len())
            .unwrap();

        let out = decrypt_aes_192_cbc(KEY_HEX, 42, &buf).unwrap();
        assert_eq!(out, plain);
    }

    #[test]
    fn test_shape_rejects_bad_lengths() {
        // Announced length larger than the data.
        assert!(!plaintext_shape_ok(&[0x30, 0x7f, 0x00]));
        // Gap of a full block or more.
        let mut long = vec![0x30, 0x02, 0x01, 0x01];
        long.resize(36, 0);
        assert!(!plaintext_shape_ok(&long));
        assert!(!plaintext_shape_ok(&[0x30]));
    }

    #[test]
    fn test_ciphertext_must_be_block_aligned() {
        assert!(decrypt_aes_192_cbc(KEY_HEX, 1, &[0u8; 15]).is_err());
    }
}
