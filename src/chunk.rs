//! MessagePack buffer chunks.
//!
//! A host pipeline that persists entries before delivery can store each one
//! as a MessagePack array `[tag, time, record]` and concatenate them into a
//! chunk. [`decode_chunk`] turns such a chunk back into [`Entry`] values for
//! [`Forwarder::deliver_chunk`](crate::Forwarder::deliver_chunk).

use std::io::Cursor;

use serde::Deserialize;
use thiserror::Error;

use crate::record::{Entry, Record};

/// Errors raised while encoding or decoding chunk entries.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("failed to encode chunk entry: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("malformed chunk entry at byte {offset}: {source}")]
    Decode {
        offset: u64,
        #[source]
        source: rmp_serde::decode::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ChunkTime {
    Int(i64),
    Float(f64),
}

impl From<ChunkTime> for f64 {
    fn from(time: ChunkTime) -> Self {
        match time {
            ChunkTime::Int(secs) => secs as f64,
            ChunkTime::Float(secs) => secs,
        }
    }
}

/// Serialise one entry as a MessagePack `[tag, time, record]` array.
pub fn format_entry(tag: &str, time: Option<f64>, record: &Record) -> Result<Vec<u8>, ChunkError> {
    Ok(rmp_serde::to_vec(&(tag, time, record))?)
}

/// Decode every entry in a chunk, in order.
pub fn decode_chunk(bytes: &[u8]) -> Result<Vec<Entry>, ChunkError> {
    let total = bytes.len() as u64;
    let mut cursor = Cursor::new(bytes);
    let mut entries = Vec::new();
    while cursor.position() < total {
        let offset = cursor.position();
        let (tag, time, record): (String, Option<ChunkTime>, Record) =
            rmp_serde::from_read(&mut cursor)
                .map_err(|source| ChunkError::Decode { offset, source })?;
        entries.push(Entry::new(tag, time.map(f64::from), record));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn sample_record() -> Record {
        match json!({ "message": "hello", "kubernetes": { "pod_name": "web-1" } }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[rstest]
    fn decodes_concatenated_entries() {
        let record = sample_record();
        let mut chunk = format_entry("kube.web", Some(1_526_004_718.5), &record).expect("encode");
        chunk.extend(format_entry("kube.db", None, &record).expect("encode"));

        let entries = decode_chunk(&chunk).expect("decode");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].tag, "kube.web");
        assert_eq!(entries[0].timestamp, Some(1_526_004_718.5));
        assert_eq!(entries[0].record, record);
        assert_eq!(entries[1].tag, "kube.db");
        assert_eq!(entries[1].timestamp, None);
    }

    #[rstest]
    fn accepts_integer_times() {
        let record = sample_record();
        let chunk = rmp_serde::to_vec(&("tag", 1_526_004_718_i64, &record)).expect("encode");
        let entries = decode_chunk(&chunk).expect("decode");
        assert_eq!(entries[0].timestamp, Some(1_526_004_718.0));
    }

    #[rstest]
    fn empty_chunk_has_no_entries() {
        assert!(decode_chunk(&[]).expect("decode").is_empty());
    }

    #[rstest]
    fn truncated_entry_reports_offset() {
        let record = sample_record();
        let mut chunk = format_entry("a", None, &record).expect("encode");
        let first_len = chunk.len() as u64;
        let second = format_entry("b", None, &record).expect("encode");
        chunk.extend_from_slice(&second[..second.len() / 2]);

        let err = decode_chunk(&chunk).expect_err("truncated chunk must fail");
        assert!(matches!(err, ChunkError::Decode { offset, .. } if offset == first_len));
    }
}
