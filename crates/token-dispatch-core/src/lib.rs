//! Dispatch core: token document model, wire envelopes, size estimation,
//! gzip compression, category chunking and strategy selection.
//!
//! Everything here is synchronous and free of I/O. Sending envelopes is the
//! job of a transport in the `token-dispatch` crate.

pub mod chunk;
pub mod compress;
pub mod envelope;
pub mod error;
pub mod select;
pub mod size;
pub mod types;

pub use chunk::{merge_fragments, split, Chunk};
pub use compress::{compress, decompress};
pub use envelope::{decode_envelope, decode_tokens, encode_envelope, encode_file, reassemble};
pub use error::DispatchError;
pub use select::select;
pub use size::{estimate, estimate_file};
pub use types::{
    ClientPayload, DeliveryOptions, DeliveryPlan, DispatchPayload, Envelope, FileContent,
    PayloadBody, PlannedEnvelope, Sequence, StrategyKind, StrategyPreference, TokenDocument,
    DEFAULT_COMMIT_MESSAGE, DEFAULT_ENVELOPE_OVERHEAD, DEFAULT_EVENT_TYPE, DEFAULT_FILENAME,
    DEFAULT_FILE_PATH, DEFAULT_SIZE_BUDGET, UPLOAD_METHOD_FILE,
};
