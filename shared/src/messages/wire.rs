use crate::{MessageError, SyncMessage};

/// Serializes a SyncMessage to its CBOR wire form
pub fn encode_message(message: &SyncMessage) -> Result<Vec<u8>, MessageError> {
    let mut buffer = Vec::new();
    ciborium::into_writer(message, &mut buffer).map_err(|e| MessageError::Encode {
        reason: e.to_string(),
    })?;
    Ok(buffer)
}

/// Deserializes a SyncMessage from its CBOR wire form
pub fn decode_message(bytes: &[u8]) -> Result<SyncMessage, MessageError> {
    ciborium::from_reader(bytes).map_err(|e| MessageError::Malformed {
        len: bytes.len(),
        reason: e.to_string(),
    })
}
