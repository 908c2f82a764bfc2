//! Minimal Solidity ABI encoding for the booking contract's argument and return types.

use primitive_types::U256;
use sha3::{Digest, Keccak256};
use thiserror::Error;

use sciquip::models::Address;

const WORD: usize = 32;

/// `bytes4(keccak256("Error(string)"))`
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("return data too short: needed {needed} bytes, got {len}")]
    OutOfBounds { needed: usize, len: usize },

    #[error("value does not fit in {0}")]
    Overflow(&'static str),

    #[error("invalid bool word")]
    InvalidBool,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,
}

/// Argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(U256),
    String(String),
}

/// First four bytes of the Keccak-256 hash of a function signature.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());

    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `signature` called with `tokens`.
#[must_use]
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut calldata = selector(signature).to_vec();
    calldata.extend(encode(tokens));
    calldata
}

/// Head/tail encoding of a flat argument tuple.
#[must_use]
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let mut head = Vec::with_capacity(tokens.len() * WORD);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(value) => head.extend(value.to_big_endian()),
            Token::String(value) => {
                let offset = tokens.len() * WORD + tail.len();
                head.extend(U256::from(offset).to_big_endian());

                let bytes = value.as_bytes();
                tail.extend(U256::from(bytes.len()).to_big_endian());
                tail.extend(bytes);
                tail.resize(tail.len() + padding(bytes.len()), 0);
            }
        }
    }

    head.extend(tail);
    head
}

/// Decode the reason carried by `Error(string)` revert data.
#[must_use]
pub fn decode_revert(data: &[u8]) -> Option<String> {
    let payload = data.strip_prefix(&ERROR_STRING_SELECTOR)?;

    Decoder::new(payload).string(0).ok()
}

fn padding(len: usize) -> usize {
    (WORD - len % WORD) % WORD
}

/// Reads head slots of an encoded return tuple.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn bytes(&self, start: usize, len: usize) -> Result<&'a [u8], AbiError> {
        let end = start
            .checked_add(len)
            .ok_or(AbiError::Overflow("usize"))?;

        self.data.get(start..end).ok_or(AbiError::OutOfBounds {
            needed: end,
            len: self.data.len(),
        })
    }

    fn word_at(&self, offset: usize) -> Result<U256, AbiError> {
        Ok(U256::from_big_endian(self.bytes(offset, WORD)?))
    }

    fn usize_at(&self, offset: usize) -> Result<usize, AbiError> {
        let value = self.word_at(offset)?;

        if value > U256::from(u32::MAX) {
            return Err(AbiError::Overflow("usize"));
        }

        usize::try_from(value.low_u64()).map_err(|_| AbiError::Overflow("usize"))
    }

    /// `uint256` in head slot `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short.
    pub fn uint(&self, index: usize) -> Result<U256, AbiError> {
        self.word_at(index * WORD)
    }

    /// `uint256` in head slot `index` that must fit in a `u64`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short or the value is too large.
    pub fn u64(&self, index: usize) -> Result<u64, AbiError> {
        let value = self.uint(index)?;

        if value > U256::from(u64::MAX) {
            return Err(AbiError::Overflow("u64"));
        }

        Ok(value.low_u64())
    }

    /// `uint8` in head slot `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short or the value is too large.
    pub fn u8(&self, index: usize) -> Result<u8, AbiError> {
        u8::try_from(self.u64(index)?).map_err(|_| AbiError::Overflow("u8"))
    }

    /// # Errors
    ///
    /// Returns an error if the data is too short or the word is neither 0 nor 1.
    pub fn bool(&self, index: usize) -> Result<bool, AbiError> {
        match self.u64(index) {
            Ok(0) => Ok(false),
            Ok(1) => Ok(true),
            Ok(_) | Err(AbiError::Overflow(_)) => Err(AbiError::InvalidBool),
            Err(error) => Err(error),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the data is too short.
    pub fn address(&self, index: usize) -> Result<Address, AbiError> {
        let word = self.bytes(index * WORD, WORD)?;
        let mut bytes = [0; 20];
        bytes.copy_from_slice(word.get(12..).ok_or(AbiError::OutOfBounds {
            needed: WORD,
            len: word.len(),
        })?);

        Ok(Address::from_bytes(bytes))
    }

    /// Dynamic `string` whose offset sits in head slot `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if an offset or length points outside the data, or the bytes are not
    /// UTF-8.
    pub fn string(&self, index: usize) -> Result<String, AbiError> {
        let offset = self.usize_at(index * WORD)?;
        let len = self.usize_at(offset)?;
        let bytes = self.bytes(offset + WORD, len)?;

        String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)
    }
}
