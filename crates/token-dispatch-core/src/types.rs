use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DispatchError, Result};

/// Default transport ceiling in bytes for a single request.
pub const DEFAULT_SIZE_BUDGET: usize = 20_000;

/// Bytes reserved per chunk for the fields that wrap the token fragment.
pub const DEFAULT_ENVELOPE_OVERHEAD: usize = 5_000;

pub const DEFAULT_EVENT_TYPE: &str = "update-tokens";
pub const DEFAULT_FILENAME: &str = "design-tokens.json";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update design tokens";
pub const DEFAULT_FILE_PATH: &str = "src/tokens/figma-export/design-tokens.json";

/// Marker placed in `uploadMethod` for metadata-only envelopes.
pub const UPLOAD_METHOD_FILE: &str = "file";

// ============================================================================
// TokenDocument
// ============================================================================

/// Design-token tree keyed by category name.
///
/// Category order follows insertion order of the source JSON. There is no
/// mutable access; builder methods consume `self`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenDocument(Map<String, Value>);

impl TokenDocument {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value. Only objects are valid token documents.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DispatchError::InvalidDocument(format!(
                "expected object at top level, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    /// Add or replace a category, returning the updated document.
    pub fn with_category(mut self, name: impl Into<String>, value: Value) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Compact JSON, the form carried in `client_payload.tokens`.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(|e| DispatchError::Encoding(e.to_string()))
    }

    /// Two-space indented JSON, the form written by file uploads.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.0).map_err(|e| DispatchError::Encoding(e.to_string()))
    }

    pub fn categories(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn get(&self, category: &str) -> Option<&Value> {
        self.0.get(category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for TokenDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// What an envelope carries in place of (or as) the token tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadBody {
    /// Compact JSON of the (partial) token document.
    Raw(String),
    /// gzip + base64 of the compact JSON. `original_size` is the byte length
    /// of the JSON before compression.
    Compressed { data: String, original_size: usize },
    /// No tokens; the body travels as a file upload of `tokens_size` bytes.
    FileReference { tokens_size: usize },
}

/// 1-based position of a chunk within its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequence {
    pub index: usize,
    pub total: usize,
}

/// One transport-ready unit. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    event_type: String,
    filename: String,
    commit_message: String,
    body: PayloadBody,
    sequence: Option<Sequence>,
    category: String,
}

impl Envelope {
    /// Envelope carrying the whole document.
    pub fn whole(options: &DeliveryOptions, body: PayloadBody) -> Self {
        Self {
            event_type: options.event_type.clone(),
            filename: options.filename.clone(),
            commit_message: options.commit_message.clone(),
            body,
            sequence: None,
            category: String::new(),
        }
    }

    /// Envelope carrying one category (or `category.subkey`) fragment.
    pub fn chunk(
        options: &DeliveryOptions,
        tokens: String,
        category: impl Into<String>,
        sequence: Sequence,
    ) -> Self {
        let category = category.into();
        Self {
            event_type: options.event_type.clone(),
            filename: options.filename.clone(),
            commit_message: format!("{} - {}", options.commit_message, category),
            body: PayloadBody::Raw(tokens),
            sequence: Some(sequence),
            category,
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    pub fn body(&self) -> &PayloadBody {
        &self.body
    }

    pub fn sequence(&self) -> Option<Sequence> {
        self.sequence
    }

    /// Dotted path of the carried subtree, empty for whole-document envelopes.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Wire form of this envelope.
    pub fn to_payload(&self) -> DispatchPayload {
        let mut client = ClientPayload {
            tokens: None,
            filename: self.filename.clone(),
            commit_message: self.commit_message.clone(),
            compressed: None,
            original_size: None,
            compressed_size: None,
            category: None,
            total_categories: None,
            tokens_size: None,
            upload_method: None,
        };

        match &self.body {
            PayloadBody::Raw(json) => client.tokens = Some(json.clone()),
            PayloadBody::Compressed {
                data,
                original_size,
            } => {
                client.tokens = Some(data.clone());
                client.compressed = Some(true);
                client.original_size = Some(*original_size);
                client.compressed_size = Some(data.len());
            }
            PayloadBody::FileReference { tokens_size } => {
                client.tokens_size = Some(*tokens_size);
                client.upload_method = Some(UPLOAD_METHOD_FILE.to_string());
            }
        }

        if let Some(sequence) = self.sequence {
            client.category = Some(self.category.clone());
            client.total_categories = Some(sequence.total);
        }

        DispatchPayload {
            event_type: self.event_type.clone(),
            client_payload: client,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Body of a repository-dispatch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchPayload {
    pub event_type: String,
    pub client_payload: ClientPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<String>,
    pub filename: String,
    pub commit_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_categories: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_method: Option<String>,
}

/// Body of a direct file write (`PUT contents/{path}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub message: String,
    /// Standard base64 of the file bytes.
    pub content: String,
    pub path: String,
}

// ============================================================================
// Options
// ============================================================================

/// Caller's choice of how strategies are picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyPreference {
    /// Direct, then Compressed, then Chunked.
    #[default]
    Auto,
    /// Always write the document as a file. Changes the receiver's contract,
    /// so it is never picked automatically.
    FileUpload,
}

/// Inputs to strategy selection shared by every envelope of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryOptions {
    pub event_type: String,
    pub filename: String,
    pub commit_message: String,
    /// Hard ceiling per request, in bytes. Sizes must be strictly below it.
    pub size_budget: usize,
    /// Reserved per chunk for envelope fields (default 5,000).
    pub envelope_overhead: usize,
    pub strategy: StrategyPreference,
    /// Repository path written by file uploads.
    pub file_path: String,
    /// When false, a chunk still over budget after one level of splitting
    /// fails selection with `SizeExceeded` instead of shipping flagged.
    pub allow_oversized_chunks: bool,
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self {
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            filename: DEFAULT_FILENAME.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            size_budget: DEFAULT_SIZE_BUDGET,
            envelope_overhead: DEFAULT_ENVELOPE_OVERHEAD,
            strategy: StrategyPreference::Auto,
            file_path: DEFAULT_FILE_PATH.to_string(),
            allow_oversized_chunks: true,
        }
    }
}

impl DeliveryOptions {
    /// Budget handed to the chunker for each category fragment.
    pub fn per_chunk_budget(&self) -> usize {
        self.size_budget.saturating_sub(self.envelope_overhead)
    }

    pub fn validate(&self) -> Result<()> {
        if self.event_type.trim().is_empty() {
            return Err(DispatchError::InvalidOptions(
                "event_type must not be empty".to_string(),
            ));
        }
        if self.envelope_overhead >= self.size_budget {
            return Err(DispatchError::InvalidOptions(format!(
                "envelope_overhead {} must be smaller than size_budget {}",
                self.envelope_overhead, self.size_budget
            )));
        }
        if self.strategy == StrategyPreference::FileUpload && self.file_path.trim().is_empty() {
            return Err(DispatchError::InvalidOptions(
                "file_path must not be empty for file uploads".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// DeliveryPlan
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Direct,
    Compressed,
    Chunked,
    FileUpload,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyKind::Direct => "direct",
            StrategyKind::Compressed => "compressed",
            StrategyKind::Chunked => "chunked",
            StrategyKind::FileUpload => "file_upload",
        };
        f.write_str(name)
    }
}

/// An envelope with its estimated wire size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEnvelope {
    pub envelope: Envelope,
    pub size: usize,
    /// Set when `size` is not below the plan budget. Only chunks can be
    /// oversized; the remote side decides whether to accept them.
    pub oversized: bool,
}

/// Ordered envelopes produced by one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub kind: StrategyKind,
    pub envelopes: Vec<PlannedEnvelope>,
    /// Present only for `FileUpload` plans.
    pub file: Option<FileContent>,
    pub budget: usize,
}

impl DeliveryPlan {
    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    pub fn oversized(&self) -> impl Iterator<Item = &PlannedEnvelope> {
        self.envelopes.iter().filter(|p| p.oversized)
    }

    pub fn largest(&self) -> usize {
        self.envelopes.iter().map(|p| p.size).max().unwrap_or(0)
    }
}
