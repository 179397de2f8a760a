//! Minimal Solidity ABI codec.
//!
//! Covers exactly the parameter shapes the registry contract uses: `address`,
//! `uint256` (values that fit in 64 bits), `bool`, `bytes32`, `string`,
//! `bytes32[]`, and tuples of those. Encoding follows the standard head/tail
//! layout; offsets in a head are relative to the start of the enclosing
//! tuple.

use notary_types::Address;

const WORD: usize = 32;

/// A decoded or to-be-encoded ABI value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(u64),
    Bool(bool),
    FixedBytes([u8; 32]),
    String(String),
    FixedBytesArray(Vec<[u8; 32]>),
    Tuple(Vec<Token>),
}

/// Expected shape of a value being decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint,
    Bool,
    FixedBytes,
    String,
    FixedBytesArray,
    Tuple(Vec<ParamType>),
}

/// Errors from ABI encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("data too short: need {needed} bytes at offset {offset}, have {available}")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("integer does not fit in 64 bits")]
    Overflow,

    #[error("invalid bool word")]
    InvalidBool,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("unexpected token: expected {expected}")]
    UnexpectedToken { expected: &'static str },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl ParamType {
    fn is_dynamic(&self) -> bool {
        match self {
            Self::String | Self::FixedBytesArray => true,
            Self::Tuple(members) => members.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    fn head_len(&self) -> usize {
        match self {
            Self::Tuple(members) if !self.is_dynamic() => {
                members.iter().map(ParamType::head_len).sum()
            }
            _ => WORD,
        }
    }
}

impl Token {
    fn is_dynamic(&self) -> bool {
        match self {
            Self::String(_) | Self::FixedBytesArray(_) => true,
            Self::Tuple(members) => members.iter().any(Token::is_dynamic),
            _ => false,
        }
    }

    fn head_len(&self) -> usize {
        match self {
            Self::Tuple(members) if !self.is_dynamic() => members.iter().map(Token::head_len).sum(),
            _ => WORD,
        }
    }

    pub fn into_address(self) -> Result<Address, AbiError> {
        match self {
            Self::Address(a) => Ok(a),
            _ => Err(AbiError::UnexpectedToken { expected: "address" }),
        }
    }

    pub fn into_uint(self) -> Result<u64, AbiError> {
        match self {
            Self::Uint(v) => Ok(v),
            _ => Err(AbiError::UnexpectedToken { expected: "uint256" }),
        }
    }

    pub fn into_bool(self) -> Result<bool, AbiError> {
        match self {
            Self::Bool(b) => Ok(b),
            _ => Err(AbiError::UnexpectedToken { expected: "bool" }),
        }
    }

    pub fn into_fixed_bytes(self) -> Result<[u8; 32], AbiError> {
        match self {
            Self::FixedBytes(b) => Ok(b),
            _ => Err(AbiError::UnexpectedToken { expected: "bytes32" }),
        }
    }

    pub fn into_string(self) -> Result<String, AbiError> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(AbiError::UnexpectedToken { expected: "string" }),
        }
    }

    pub fn into_fixed_bytes_array(self) -> Result<Vec<[u8; 32]>, AbiError> {
        match self {
            Self::FixedBytesArray(v) => Ok(v),
            _ => Err(AbiError::UnexpectedToken { expected: "bytes32[]" }),
        }
    }

    pub fn into_tuple(self) -> Result<Vec<Token>, AbiError> {
        match self {
            Self::Tuple(v) => Ok(v),
            _ => Err(AbiError::UnexpectedToken { expected: "tuple" }),
        }
    }
}

/// Encode a parameter list (the body of calldata, return data, or log data).
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let heads_len: usize = tokens.iter().map(Token::head_len).sum();
    let mut head = Vec::with_capacity(heads_len);
    let mut tail = Vec::new();
    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&uint_word((heads_len + tail.len()) as u64));
            tail.extend(encode_token(token));
        } else {
            head.extend(encode_token(token));
        }
    }
    head.extend(tail);
    head
}

/// Encode a function call: selector followed by the encoded arguments.
pub fn encode_call(selector: [u8; 4], args: &[Token]) -> Vec<u8> {
    let mut data = selector.to_vec();
    data.extend(encode(args));
    data
}

/// Decode a parameter list of the given types.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, AbiError> {
    decode_params(types, data, 0)
}

fn encode_token(token: &Token) -> Vec<u8> {
    match token {
        Token::Address(a) => {
            let mut word = [0u8; WORD];
            word[12..].copy_from_slice(a.as_bytes());
            word.to_vec()
        }
        Token::Uint(v) => uint_word(*v).to_vec(),
        Token::Bool(b) => uint_word(u64::from(*b)).to_vec(),
        Token::FixedBytes(b) => b.to_vec(),
        Token::String(s) => {
            let bytes = s.as_bytes();
            let mut out = uint_word(bytes.len() as u64).to_vec();
            out.extend_from_slice(bytes);
            out.resize(WORD + padded_len(bytes.len()), 0);
            out
        }
        Token::FixedBytesArray(items) => {
            let mut out = uint_word(items.len() as u64).to_vec();
            for item in items {
                out.extend_from_slice(item);
            }
            out
        }
        Token::Tuple(members) => encode(members),
    }
}

fn decode_params(types: &[ParamType], data: &[u8], base: usize) -> Result<Vec<Token>, AbiError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut cursor = base;
    for ty in types {
        if ty.is_dynamic() {
            let offset = read_offset(data, cursor)?;
            let at = base
                .checked_add(offset)
                .ok_or(AbiError::Overflow)?;
            tokens.push(decode_token(ty, data, at)?);
            cursor += WORD;
        } else {
            tokens.push(decode_token(ty, data, cursor)?);
            cursor += ty.head_len();
        }
    }
    Ok(tokens)
}

fn decode_token(ty: &ParamType, data: &[u8], at: usize) -> Result<Token, AbiError> {
    match ty {
        ParamType::Address => {
            let word = read_word(data, at)?;
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&word[12..]);
            Ok(Token::Address(Address::from_bytes(bytes)))
        }
        ParamType::Uint => Ok(Token::Uint(word_to_u64(read_word(data, at)?)?)),
        ParamType::Bool => match word_to_u64(read_word(data, at)?) {
            Ok(0) => Ok(Token::Bool(false)),
            Ok(1) => Ok(Token::Bool(true)),
            _ => Err(AbiError::InvalidBool),
        },
        ParamType::FixedBytes => Ok(Token::FixedBytes(read_word(data, at)?)),
        ParamType::String => {
            let len = read_offset(data, at)?;
            let bytes = read_slice(data, at + WORD, len)?;
            String::from_utf8(bytes.to_vec())
                .map(Token::String)
                .map_err(|_| AbiError::InvalidUtf8)
        }
        ParamType::FixedBytesArray => {
            let len = read_offset(data, at)?;
            // Bound the allocation by what the buffer can actually hold.
            read_slice(data, at + WORD, len.checked_mul(WORD).ok_or(AbiError::Overflow)?)?;
            let mut items = Vec::with_capacity(len);
            for i in 0..len {
                items.push(read_word(data, at + WORD + i * WORD)?);
            }
            Ok(Token::FixedBytesArray(items))
        }
        ParamType::Tuple(members) => decode_params(members, data, at).map(Token::Tuple),
    }
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

fn read_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], AbiError> {
    let end = offset.checked_add(len).ok_or(AbiError::Overflow)?;
    data.get(offset..end).ok_or(AbiError::OutOfBounds {
        offset,
        needed: len,
        available: data.len().saturating_sub(offset),
    })
}

fn read_word(data: &[u8], offset: usize) -> Result<[u8; WORD], AbiError> {
    let slice = read_slice(data, offset, WORD)?;
    let mut word = [0u8; WORD];
    word.copy_from_slice(slice);
    Ok(word)
}

fn word_to_u64(word: [u8; WORD]) -> Result<u64, AbiError> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    Ok(u64::from_be_bytes(bytes))
}

fn read_offset(data: &[u8], offset: usize) -> Result<usize, AbiError> {
    let value = word_to_u64(read_word(data, offset)?)?;
    usize::try_from(value).map_err(|_| AbiError::Overflow)
}
