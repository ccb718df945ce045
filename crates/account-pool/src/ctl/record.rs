//! The control record and its storable string form.
//!
//! Wire format of the remote field:
//!
//! ```text
//! base64( "1#" + {"owner":"..","desc":"..","tags":["..",".."]} )
//! ```
//!
//! Empty fields are omitted from the JSON. The version prefix is checked
//! strictly: a record written by a newer format is a decode error rather
//! than something to guess at.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{PoolError, Result};
use crate::tags::{self, Tags};

/// Current format version written in front of every record.
pub const CTL_VERSION: &str = "1";

/// Upper bound on the encoded length; the remote field is short.
pub const MAX_ENCODED_LEN: usize = 1000;

const VERSION_SEP: u8 = b'#';

/// Owner, description, and tags of one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ctl {
    /// Current owner. Empty means unowned.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl Ctl {
    pub fn new(owner: impl Into<String>, desc: impl Into<String>, tags: Tags) -> Self {
        Self {
            owner: owner.into(),
            desc: desc.into(),
            tags,
        }
    }

    pub fn is_owned(&self) -> bool {
        !self.owner.is_empty()
    }

    /// Set and clear tags in one step (set wins on overlap).
    pub fn update_tags(&mut self, set: &Tags, clear: &Tags) {
        self.tags = tags::apply(&self.tags, set, clear);
    }

    /// Encode into the string stored in the remote field.
    pub fn encode(&self) -> Result<String> {
        let json =
            serde_json::to_vec(self).map_err(|e| PoolError::SerializationError(e.to_string()))?;

        let mut payload = Vec::with_capacity(CTL_VERSION.len() + 1 + json.len());
        payload.extend_from_slice(CTL_VERSION.as_bytes());
        payload.push(VERSION_SEP);
        payload.extend_from_slice(&json);

        let encoded = base64::engine::general_purpose::STANDARD.encode(payload);
        if encoded.len() > MAX_ENCODED_LEN {
            return Err(PoolError::CtlTooLarge {
                len: encoded.len(),
                max: MAX_ENCODED_LEN,
            });
        }
        Ok(encoded)
    }

    /// Decode a remote field value.
    pub fn decode(encoded: &str) -> Result<Self> {
        let payload = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| PoolError::InvalidCtl(format!("invalid base64: {e}")))?;

        let sep = payload
            .iter()
            .position(|&b| b == VERSION_SEP)
            .ok_or_else(|| PoolError::InvalidCtl("missing version prefix".into()))?;
        let (version, body) = (&payload[..sep], &payload[sep + 1..]);
        if version != CTL_VERSION.as_bytes() {
            return Err(PoolError::UnsupportedVersion(
                String::from_utf8_lossy(version).into_owned(),
            ));
        }

        // Tags are re-normalized by their Deserialize impl.
        serde_json::from_slice(body).map_err(|e| PoolError::InvalidCtl(e.to_string()))
    }
}
