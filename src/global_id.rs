use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;

// ============================================================================
// Global Identifiers
// ============================================================================
//
// External references to entities are base64("<Type>:<uuid>").
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlobalIdError {
    #[error("Invalid ID: {0}. Expected: base64 encoded \"<type>:<id>\".")]
    Malformed(String),

    #[error("Invalid ID: {id}. Expected: {expected}, received: {received}.")]
    WrongType {
        id: String,
        expected: String,
        received: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalId {
    pub type_name: String,
    pub id: Uuid,
}

impl GlobalId {
    pub fn new(type_name: impl Into<String>, id: Uuid) -> Self {
        Self { type_name: type_name.into(), id }
    }

    pub fn encode(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.type_name, self.id))
    }

    pub fn decode(raw: &str) -> Result<Self, GlobalIdError> {
        let malformed = || GlobalIdError::Malformed(raw.to_string());

        let bytes = STANDARD.decode(raw.trim()).map_err(|_| malformed())?;
        let text = String::from_utf8(bytes).map_err(|_| malformed())?;
        let (type_name, id) = text.split_once(':').ok_or_else(malformed)?;
        if type_name.is_empty() {
            return Err(malformed());
        }
        let id = Uuid::parse_str(id).map_err(|_| malformed())?;

        Ok(Self::new(type_name, id))
    }

    /// Decode and require a specific type name
    pub fn decode_as(raw: &str, expected: &str) -> Result<Uuid, GlobalIdError> {
        let global_id = Self::decode(raw)?;
        if global_id.type_name != expected {
            return Err(GlobalIdError::WrongType {
                id: raw.to_string(),
                expected: expected.to_string(),
                received: global_id.type_name,
            });
        }
        Ok(global_id.id)
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
