// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Binary Wire Codec
//!
//! The self-describing length-prefixed format shared by record storage,
//! peer-to-peer push, and party-info gossip. One rule everywhere: a
//! variable-length field is preceded by an 8-byte big-endian length, and
//! fixed-size values (keys, nonces) are length-prefixed too, so the decoder
//! stays uniform.
//!
//! Shapes:
//!
//! ```text
//! record            ≡ [sender][cipherText][payloadNonce][boxes][recipientNonce]
//! record+recipients ≡ [2][record bytes][recipients]        (2-element list)
//! party info        ≡ [ownUrl][n][keyBytes,url pair]*[peerUrl list]
//! ```
//!
//! where a list is an 8-byte count followed by that many length-prefixed
//! items. The encoder grows its buffer by doubling to the next power of two
//! at or above the required capacity.

use std::collections::{HashMap, HashSet};

use crate::crypto::{Nonce, KEY_SIZE, NONCE_SIZE};
use crate::keys::NodePublicKey;
use crate::partyinfo::PartySnapshot;

/// Decoder failure. Covers truncation, oversize length fields, and
/// fixed-size slots of the wrong width.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed record: {0}")]
    Malformed(&'static str),
}

/// The on-the-wire / on-disk record object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedRecord {
    /// Public key of the originating node's identity.
    pub sender: NodePublicKey,
    /// Payload sealed under the ephemeral master key.
    pub cipher_text: Vec<u8>,
    pub payload_nonce: Nonce,
    /// One sealed master-key box per recipient, in recipient order.
    pub recipient_boxes: Vec<Vec<u8>>,
    pub recipient_nonce: Nonce,
}

// =============================================================================
// Growing encode buffer
// =============================================================================

struct EncBuf {
    buf: Vec<u8>,
    offset: usize,
}

impl EncBuf {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity],
            offset: 0,
        }
    }

    /// Make sure `required` more bytes fit, doubling to the next power of
    /// two at or above the requirement when they do not.
    fn ensure(&mut self, required: usize) {
        let length = self.buf.len();
        if length - self.offset < required {
            let grow_by = if required > length {
                required
                    .checked_next_power_of_two()
                    .unwrap_or(usize::MAX - length)
            } else {
                length
            };
            self.buf.resize(length + grow_by, 0);
        }
    }

    fn put_u64(&mut self, value: u64) {
        self.ensure(8);
        self.buf[self.offset..self.offset + 8].copy_from_slice(&value.to_be_bytes());
        self.offset += 8;
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.put_u64(src.len() as u64);
        self.ensure(src.len());
        self.buf[self.offset..self.offset + src.len()].copy_from_slice(src);
        self.offset += src.len();
    }

    fn put_slice_list<'a, I>(&mut self, count: usize, items: I)
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        self.put_u64(count as u64);
        for item in items {
            self.put_slice(item);
        }
    }

    fn into_bytes(mut self) -> Vec<u8> {
        self.buf.truncate(self.offset);
        self.buf
    }
}

// =============================================================================
// Decode cursor
// =============================================================================

struct DecBuf<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> DecBuf<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    fn take_u64(&mut self) -> Result<u64, CodecError> {
        if self.remaining() < 8 {
            return Err(CodecError::Malformed("truncated length field"));
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.buf[self.offset..self.offset + 8]);
        self.offset += 8;
        Ok(u64::from_be_bytes(raw))
    }

    fn take_slice(&mut self) -> Result<&'a [u8], CodecError> {
        let length = self.take_u64()?;
        let length = usize::try_from(length)
            .ok()
            .filter(|n| *n <= self.remaining())
            .ok_or(CodecError::Malformed("length field exceeds input"))?;
        let slice = &self.buf[self.offset..self.offset + length];
        self.offset += length;
        Ok(slice)
    }

    /// A list count is bounded by the remaining input: every item carries at
    /// least its own 8-byte length prefix.
    fn take_count(&mut self) -> Result<usize, CodecError> {
        let count = self.take_u64()?;
        usize::try_from(count)
            .ok()
            .filter(|n| *n <= self.remaining() / 8)
            .ok_or(CodecError::Malformed("list count exceeds input"))
    }

    fn take_slice_list(&mut self) -> Result<Vec<Vec<u8>>, CodecError> {
        let count = self.take_count()?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.take_slice()?.to_vec());
        }
        Ok(items)
    }

    fn take_key(&mut self) -> Result<NodePublicKey, CodecError> {
        let slice = self.take_slice()?;
        if slice.len() != KEY_SIZE {
            return Err(CodecError::Malformed("public key slot is not 32 bytes"));
        }
        NodePublicKey::from_bytes(slice).map_err(|_| CodecError::Malformed("invalid public key"))
    }

    fn take_nonce(&mut self) -> Result<Nonce, CodecError> {
        let slice = self.take_slice()?;
        slice
            .try_into()
            .map_err(|_| CodecError::Malformed("nonce slot is not 24 bytes"))
    }
}

// =============================================================================
// Records
// =============================================================================

/// Rough fixed overhead of a record: five length prefixes, two nonces, a key.
const RECORD_BASE_CAPACITY: usize = 5 * 8 + KEY_SIZE + 2 * NONCE_SIZE + 128;

/// Encode a bare record (the shape pushed for resend-individual responses).
pub fn encode_record(record: &EncryptedRecord) -> Vec<u8> {
    let mut out = EncBuf::with_capacity(RECORD_BASE_CAPACITY + record.cipher_text.len());
    put_record(&mut out, record);
    out.into_bytes()
}

fn put_record(out: &mut EncBuf, record: &EncryptedRecord) {
    out.put_slice(record.sender.as_bytes());
    out.put_slice(&record.cipher_text);
    out.put_slice(&record.payload_nonce);
    out.put_slice_list(
        record.recipient_boxes.len(),
        record.recipient_boxes.iter().map(Vec::as_slice),
    );
    out.put_slice(&record.recipient_nonce);
}

/// Decode a bare record. Trailing bytes after the final field are ignored.
pub fn decode_record(encoded: &[u8]) -> Result<EncryptedRecord, CodecError> {
    let mut cursor = DecBuf::new(encoded);
    take_record(&mut cursor)
}

fn take_record(cursor: &mut DecBuf<'_>) -> Result<EncryptedRecord, CodecError> {
    let sender = cursor.take_key()?;
    let cipher_text = cursor.take_slice()?.to_vec();
    let payload_nonce = cursor.take_nonce()?;
    let recipient_boxes = cursor.take_slice_list()?;
    let recipient_nonce = cursor.take_nonce()?;

    if recipient_boxes.is_empty() {
        return Err(CodecError::Malformed("record carries no recipient boxes"));
    }

    Ok(EncryptedRecord {
        sender,
        cipher_text,
        payload_nonce,
        recipient_boxes,
        recipient_nonce,
    })
}

/// Encode a record together with its recipient list (the stored and pushed
/// shape). The pair is wrapped as a 2-element list.
pub fn encode_record_with_recipients(
    record: &EncryptedRecord,
    recipients: &[NodePublicKey],
) -> Vec<u8> {
    let inner = encode_record(record);
    let mut out = EncBuf::with_capacity(inner.len() + recipients.len() * (KEY_SIZE + 8) + 32);
    out.put_u64(2);
    out.put_slice(&inner);
    out.put_slice_list(
        recipients.len(),
        recipients.iter().map(|key| key.as_bytes().as_slice()),
    );
    out.into_bytes()
}

/// Decode a record-with-recipients wrapper.
pub fn decode_record_with_recipients(
    encoded: &[u8],
) -> Result<(EncryptedRecord, Vec<NodePublicKey>), CodecError> {
    let mut cursor = DecBuf::new(encoded);
    if cursor.take_u64()? != 2 {
        return Err(CodecError::Malformed("unexpected wrapper arity"));
    }

    let inner = cursor.take_slice()?;
    let record = decode_record(inner)?;

    let count = cursor.take_count()?;
    let mut recipients = Vec::with_capacity(count);
    for _ in 0..count {
        recipients.push(cursor.take_key()?);
    }

    Ok((record, recipients))
}

// =============================================================================
// Party info
// =============================================================================

/// Encode a party-info snapshot for gossip exchange.
pub fn encode_party_info(snapshot: &PartySnapshot) -> Vec<u8> {
    let mut out = EncBuf::with_capacity(256);

    out.put_slice(snapshot.url.as_bytes());

    out.put_u64(snapshot.recipients.len() as u64);
    for (key, url) in &snapshot.recipients {
        out.put_slice_list(2, [key.as_bytes().as_slice(), url.as_bytes()]);
    }

    out.put_slice_list(
        snapshot.parties.len(),
        snapshot.parties.iter().map(String::as_bytes),
    );

    out.into_bytes()
}

/// Decode a party-info snapshot received from a peer.
pub fn decode_party_info(encoded: &[u8]) -> Result<PartySnapshot, CodecError> {
    let mut cursor = DecBuf::new(encoded);

    let url = String::from_utf8(cursor.take_slice()?.to_vec())
        .map_err(|_| CodecError::Malformed("own URL is not valid UTF-8"))?;

    let count = cursor.take_count()?;
    let mut recipients = HashMap::with_capacity(count);
    for _ in 0..count {
        if cursor.take_u64()? != 2 {
            return Err(CodecError::Malformed("resolver entry is not a pair"));
        }
        let key = cursor.take_key()?;
        let recipient_url = String::from_utf8(cursor.take_slice()?.to_vec())
            .map_err(|_| CodecError::Malformed("resolver URL is not valid UTF-8"))?;
        recipients.insert(key, recipient_url);
    }

    let party_count = cursor.take_count()?;
    let mut parties = HashSet::with_capacity(party_count);
    for _ in 0..party_count {
        let party = String::from_utf8(cursor.take_slice()?.to_vec())
            .map_err(|_| CodecError::Malformed("peer URL is not valid UTF-8"))?;
        parties.insert(party);
    }

    Ok(PartySnapshot {
        url,
        recipients,
        parties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{random_nonce, random_public_key};

    fn sample_record(boxes: usize) -> EncryptedRecord {
        EncryptedRecord {
            sender: random_public_key(),
            cipher_text: b"C1ph3r T3xt".to_vec(),
            payload_nonce: random_nonce(),
            recipient_boxes: (0..boxes).map(|i| format!("B0x{i}").into_bytes()).collect(),
            recipient_nonce: random_nonce(),
        }
    }

    #[test]
    fn record_roundtrips() {
        let record = sample_record(2);
        let decoded = decode_record(&encode_record(&record)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn record_with_recipients_roundtrips() {
        let cases = [
            (sample_record(3), vec![random_public_key(), random_public_key(), random_public_key()]),
            // The propagated form always carries an empty recipient list.
            (sample_record(1), vec![]),
        ];

        for (record, recipients) in cases {
            let encoded = encode_record_with_recipients(&record, &recipients);
            let (decoded, decoded_recipients) = decode_record_with_recipients(&encoded).unwrap();
            assert_eq!(decoded, record);
            assert_eq!(decoded_recipients, recipients);
        }
    }

    #[test]
    fn party_info_roundtrips() {
        let mut snapshot = PartySnapshot {
            url: "https://127.0.0.4:9004/".to_string(),
            recipients: HashMap::new(),
            parties: HashSet::new(),
        };
        for port in 9001..9008 {
            snapshot
                .recipients
                .insert(random_public_key(), format!("https://127.0.0.{}:{port}/", port - 9000));
            snapshot.parties.insert(format!("https://127.0.0.{}:{port}/", port - 9000));
        }

        let decoded = decode_party_info(&encode_party_info(&snapshot)).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn empty_party_info_roundtrips() {
        let snapshot = PartySnapshot {
            url: "http://localhost:9001/".to_string(),
            recipients: HashMap::new(),
            parties: HashSet::new(),
        };
        let decoded = decode_party_info(&encode_party_info(&snapshot)).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn truncated_input_is_malformed() {
        let encoded = encode_record(&sample_record(1));
        for cut in [0, 7, 8, encoded.len() / 2, encoded.len() - 1] {
            assert!(decode_record(&encoded[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn oversize_length_field_is_malformed() {
        let mut encoded = encode_record(&sample_record(1));
        // Inflate the sender length prefix far past the input size.
        encoded[..8].copy_from_slice(&u64::MAX.to_be_bytes());
        assert!(decode_record(&encoded).is_err());
    }

    #[test]
    fn wrong_key_width_is_malformed() {
        let record = sample_record(1);
        let mut out = EncBuf::with_capacity(64);
        out.put_slice(&record.sender.as_bytes()[..31]); // 31-byte key slot
        out.put_slice(&record.cipher_text);
        out.put_slice(&record.payload_nonce);
        out.put_slice_list(1, record.recipient_boxes.iter().map(Vec::as_slice));
        out.put_slice(&record.recipient_nonce);

        assert!(decode_record(&out.into_bytes()).is_err());
    }

    #[test]
    fn zero_box_record_is_malformed() {
        let mut record = sample_record(1);
        record.recipient_boxes.clear();
        let mut out = EncBuf::with_capacity(128);
        put_record(&mut out, &record);
        assert!(decode_record(&out.into_bytes()).is_err());
    }

    #[test]
    fn trailing_bytes_are_tolerated() {
        let record = sample_record(1);
        let mut encoded = encode_record(&record);
        encoded.extend_from_slice(&[0u8; 64]);
        assert_eq!(decode_record(&encoded).unwrap(), record);
    }

    #[test]
    fn buffer_growth_doubles_to_powers_of_two() {
        let mut out = EncBuf::with_capacity(16);
        out.put_slice(&[0xAB; 100]);
        // 8-byte prefix + 100 bytes of data, buffer grown past 16.
        let bytes = out.into_bytes();
        assert_eq!(bytes.len(), 108);
        assert_eq!(&bytes[8..], &[0xAB; 100]);
    }
}
