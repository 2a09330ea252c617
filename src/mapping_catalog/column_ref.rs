//! Physical column references and the opaque codec tokens attached to them.
//!
//! Codecs belong to the storage layer. The mapping layer only carries them
//! around so the physical planner can pick them up again; it compares and
//! prints codec identifiers and never encodes or decodes a value itself.

use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, sync::Arc};

/// Storage-defined codec identifier (e.g. `varchar`, `int4`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodecId(pub String);

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Failure reported by a storage codec.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("codec '{codec}' failed: {message}")]
pub struct CodecError {
    pub codec: String,
    pub message: String,
}

/// Encode/decode pair implemented by the storage collaborator.
///
/// Values cross this boundary in the storage layer's neutral JSON form.
pub trait ColumnCodec: Send + Sync + fmt::Debug {
    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value, CodecError>;
}

/// Opaque codec capability attached to a [`ColumnRef`].
///
/// Equality, hashing and serialization only look at the identifier.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "CodecId", into = "CodecId")]
pub struct ValueCodec {
    id: CodecId,
    handle: Option<Arc<dyn ColumnCodec>>,
}

impl ValueCodec {
    /// A token with no encode/decode capability, only an identity.
    pub fn opaque(id: impl Into<String>) -> Self {
        Self {
            id: CodecId(id.into()),
            handle: None,
        }
    }

    pub fn with_handle(id: impl Into<String>, handle: Arc<dyn ColumnCodec>) -> Self {
        Self {
            id: CodecId(id.into()),
            handle: Some(handle),
        }
    }

    pub fn id(&self) -> &CodecId {
        &self.id
    }

    /// The storage layer's encode/decode pair, if one was supplied.
    pub fn handle(&self) -> Option<&Arc<dyn ColumnCodec>> {
        self.handle.as_ref()
    }
}

impl From<CodecId> for ValueCodec {
    fn from(id: CodecId) -> Self {
        Self { id, handle: None }
    }
}

impl From<ValueCodec> for CodecId {
    fn from(codec: ValueCodec) -> Self {
        codec.id
    }
}

impl PartialEq for ValueCodec {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for ValueCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueCodec({})", self.id)
    }
}

/// Source of codec capabilities, implemented by the storage collaborator.
pub trait CodecProvider {
    fn codec(&self, id: &str) -> Option<ValueCodec>;
}

/// Codec provider that hands out identifier-only tokens for a fixed set of
/// codec names.
#[derive(Debug, Clone, Default)]
pub struct OpaqueCodecs {
    known: HashSet<String>,
}

impl OpaqueCodecs {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// The column codecs used by the bundled world database.
    pub fn postgres_basic() -> Self {
        Self::new([
            "bpchar", "varchar", "text", "int2", "int4", "int8", "float4", "float8", "bool",
        ])
    }
}

impl CodecProvider for OpaqueCodecs {
    fn codec(&self, id: &str) -> Option<ValueCodec> {
        self.known.contains(id).then(|| ValueCodec::opaque(id))
    }
}

/// One physical column addressable from the mapping layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
    pub codec: ValueCodec,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>, codec: ValueCodec) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            codec,
        }
    }

    /// `table.column`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.column)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}
