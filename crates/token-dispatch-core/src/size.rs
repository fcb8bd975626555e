//! Byte size of envelopes as they go over the wire.
//!
//! Sizes are measured on the compact JSON encoding produced by
//! [`encode_envelope`](crate::envelope::encode_envelope), so an estimate is
//! exactly the request body length a transport sends.

use std::io;

use serde::Serialize;

use crate::types::{Envelope, FileContent};

/// Wire size of a dispatch envelope in bytes.
///
/// An envelope that fails to serialize measures `usize::MAX`, so it never
/// fits a budget.
pub fn estimate(envelope: &Envelope) -> usize {
    measure(&envelope.to_payload())
}

/// Wire size of a file-upload body in bytes.
pub fn estimate_file(file: &FileContent) -> usize {
    measure(file)
}

fn measure<T: Serialize>(value: &T) -> usize {
    let mut counter = ByteCounter(0);
    match serde_json::to_writer(&mut counter, value) {
        Ok(()) => counter.0,
        Err(_) => usize::MAX,
    }
}

struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
