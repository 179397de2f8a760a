//! Binding for the document registry contract's fixed ABI.
//!
//! Document hashes cross the ABI as 64-character lowercase hex strings,
//! exactly as [`DocumentHash`]'s `Display` renders them.

use notary_crypto::function_selector;
use notary_types::{Address, Document, DocumentHash, DocumentId, DocumentRecord};

use crate::abi::{self, AbiError, ParamType, Token};

/// Canonical function signatures of the registry contract.
pub mod signatures {
    pub const REGISTER_DOCUMENT: &str = "registerDocument(string,string)";
    pub const VERIFY_DOCUMENT_BY_HASH: &str = "verifyDocumentByHash(string)";
    pub const GET_USER_DOCUMENTS: &str = "getUserDocuments(address)";
    pub const GET_DOCUMENT: &str = "getDocument(bytes32)";
}

/// Calldata builders and return-data decoders for the registry contract.
pub struct RegistryAbi;

impl RegistryAbi {
    pub fn encode_register_document(hash: &DocumentHash, file_name: &str) -> Vec<u8> {
        abi::encode_call(
            function_selector(signatures::REGISTER_DOCUMENT),
            &[
                Token::String(hash.to_hex()),
                Token::String(file_name.to_string()),
            ],
        )
    }

    /// Split `registerDocument` calldata back into its arguments.
    pub fn decode_register_document(calldata: &[u8]) -> Result<(String, String), AbiError> {
        let selector = function_selector(signatures::REGISTER_DOCUMENT);
        let body = calldata
            .strip_prefix(selector.as_slice())
            .ok_or_else(|| AbiError::InvalidValue("not a registerDocument call".into()))?;
        let mut tokens = abi::decode(&[ParamType::String, ParamType::String], body)?.into_iter();
        let hash = next(&mut tokens)?.into_string()?;
        let file_name = next(&mut tokens)?.into_string()?;
        Ok((hash, file_name))
    }

    pub fn encode_verify_document_by_hash(hash: &DocumentHash) -> Vec<u8> {
        abi::encode_call(
            function_selector(signatures::VERIFY_DOCUMENT_BY_HASH),
            &[Token::String(hash.to_hex())],
        )
    }

    /// Decode `(bool isValid, uint256 timestamp, address owner, string fileName)`.
    ///
    /// `isValid == false` maps to `None`; the other fields are then ignored.
    pub fn decode_verify_document_by_hash(
        hash: &DocumentHash,
        output: &[u8],
    ) -> Result<Option<DocumentRecord>, AbiError> {
        let mut tokens = abi::decode(
            &[
                ParamType::Bool,
                ParamType::Uint,
                ParamType::Address,
                ParamType::String,
            ],
            output,
        )?
        .into_iter();
        if !next(&mut tokens)?.into_bool()? {
            return Ok(None);
        }
        let timestamp = next(&mut tokens)?.into_uint()?;
        let owner = next(&mut tokens)?.into_address()?;
        let file_name = next(&mut tokens)?.into_string()?;
        Ok(Some(DocumentRecord {
            document_hash: *hash,
            file_name,
            owner,
            timestamp,
        }))
    }

    pub fn encode_verify_document_by_hash_output(record: Option<&DocumentRecord>) -> Vec<u8> {
        match record {
            Some(r) => abi::encode(&[
                Token::Bool(true),
                Token::Uint(r.timestamp),
                Token::Address(r.owner),
                Token::String(r.file_name.clone()),
            ]),
            None => abi::encode(&[
                Token::Bool(false),
                Token::Uint(0),
                Token::Address(Address::zero()),
                Token::String(String::new()),
            ]),
        }
    }

    pub fn encode_get_user_documents(owner: &Address) -> Vec<u8> {
        abi::encode_call(
            function_selector(signatures::GET_USER_DOCUMENTS),
            &[Token::Address(*owner)],
        )
    }

    pub fn decode_get_user_documents(output: &[u8]) -> Result<Vec<DocumentId>, AbiError> {
        let mut tokens = abi::decode(&[ParamType::FixedBytesArray], output)?.into_iter();
        Ok(next(&mut tokens)?
            .into_fixed_bytes_array()?
            .into_iter()
            .map(DocumentId::from_bytes)
            .collect())
    }

    pub fn encode_get_document(id: &DocumentId) -> Vec<u8> {
        abi::encode_call(
            function_selector(signatures::GET_DOCUMENT),
            &[Token::FixedBytes(*id.as_bytes())],
        )
    }

    /// Decode the `(string documentHash, string fileName, uint256 timestamp,
    /// address owner)` struct returned by `getDocument`.
    ///
    /// A zero timestamp with a zero owner is the contract's empty slot and
    /// maps to `None`.
    pub fn decode_get_document(id: &DocumentId, output: &[u8]) -> Result<Option<Document>, AbiError> {
        let mut outer = abi::decode(&[Self::document_tuple()], output)?.into_iter();
        let mut fields = next(&mut outer)?.into_tuple()?.into_iter();
        let hash_hex = next(&mut fields)?.into_string()?;
        let file_name = next(&mut fields)?.into_string()?;
        let timestamp = next(&mut fields)?.into_uint()?;
        let owner = next(&mut fields)?.into_address()?;
        if timestamp == 0 && owner.is_zero() {
            return Ok(None);
        }
        let document_hash = DocumentHash::from_hex(&hash_hex)
            .map_err(|e| AbiError::InvalidValue(format!("stored document hash: {e}")))?;
        Ok(Some(Document::new(
            *id,
            DocumentRecord {
                document_hash,
                file_name,
                owner,
                timestamp,
            },
        )))
    }

    pub fn encode_get_document_output(document: &Document) -> Vec<u8> {
        abi::encode(&[Token::Tuple(vec![
            Token::String(document.document_hash().to_hex()),
            Token::String(document.file_name().to_string()),
            Token::Uint(document.timestamp()),
            Token::Address(*document.owner()),
        ])])
    }

    fn document_tuple() -> ParamType {
        ParamType::Tuple(vec![
            ParamType::String,
            ParamType::String,
            ParamType::Uint,
            ParamType::Address,
        ])
    }
}

fn next(tokens: &mut impl Iterator<Item = Token>) -> Result<Token, AbiError> {
    tokens
        .next()
        .ok_or_else(|| AbiError::InvalidValue("missing return value".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_hash() -> DocumentHash {
        DocumentHash::from_hex("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
            .unwrap()
    }

    #[test]
    fn register_calldata_carries_hex_hash() {
        let data = RegistryAbi::encode_register_document(&hello_hash(), "hello.txt");
        assert_eq!(hex::encode(&data[..4]), "1c49ea91");
        let (hash, name) = RegistryAbi::decode_register_document(&data).unwrap();
        assert_eq!(hash, hello_hash().to_hex());
        assert_eq!(name, "hello.txt");
    }

    #[test]
    fn register_decode_rejects_other_selector() {
        let data = RegistryAbi::encode_get_document(&DocumentId::from_bytes([1; 32]));
        assert!(RegistryAbi::decode_register_document(&data).is_err());
    }

    #[test]
    fn verify_output_found() {
        let record = DocumentRecord {
            document_hash: hello_hash(),
            file_name: "hello.txt".into(),
            owner: Address::from_bytes([4; 20]),
            timestamp: 1_700_000_123,
        };
        let output = RegistryAbi::encode_verify_document_by_hash_output(Some(&record));
        let decoded = RegistryAbi::decode_verify_document_by_hash(&hello_hash(), &output).unwrap();
        assert_eq!(decoded, Some(record));
    }

    #[test]
    fn verify_output_not_found() {
        let output = RegistryAbi::encode_verify_document_by_hash_output(None);
        let decoded = RegistryAbi::decode_verify_document_by_hash(&hello_hash(), &output).unwrap();
        assert!(decoded.is_none());
    }

    #[test]
    fn get_document_output() {
        let doc = Document::new(
            DocumentId::from_bytes([8; 32]),
            DocumentRecord {
                document_hash: hello_hash(),
                file_name: "report.pdf".into(),
                owner: Address::from_bytes([2; 20]),
                timestamp: 42,
            },
        );
        let output = RegistryAbi::encode_get_document_output(&doc);
        let decoded = RegistryAbi::decode_get_document(&doc.document_id, &output).unwrap();
        assert_eq!(decoded, Some(doc));
    }

    #[test]
    fn get_document_empty_slot_is_none() {
        let empty = abi::encode(&[Token::Tuple(vec![
            Token::String(String::new()),
            Token::String(String::new()),
            Token::Uint(0),
            Token::Address(Address::zero()),
        ])]);
        let id = DocumentId::from_bytes([8; 32]);
        assert_eq!(RegistryAbi::decode_get_document(&id, &empty).unwrap(), None);
    }

    #[test]
    fn get_document_with_garbage_hash_fails() {
        let bad = abi::encode(&[Token::Tuple(vec![
            Token::String("not-a-hash".into()),
            Token::String("x".into()),
            Token::Uint(1),
            Token::Address(Address::from_bytes([1; 20])),
        ])]);
        let id = DocumentId::from_bytes([8; 32]);
        assert!(matches!(
            RegistryAbi::decode_get_document(&id, &bad),
            Err(AbiError::InvalidValue(_))
        ));
    }

    #[test]
    fn user_documents_roundtrip() {
        let ids = [[1u8; 32], [2u8; 32]];
        let output = abi::encode(&[Token::FixedBytesArray(ids.to_vec())]);
        let decoded = RegistryAbi::decode_get_user_documents(&output).unwrap();
        assert_eq!(
            decoded,
            vec![DocumentId::from_bytes(ids[0]), DocumentId::from_bytes(ids[1])]
        );
    }
}
