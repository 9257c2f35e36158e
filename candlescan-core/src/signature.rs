//! Configuration signatures — deterministic identification of computations.
//!
//! A `SignaturePayload` captures everything that determines a result: the
//! component identity and revision, its merged configuration and the id of
//! the detector driving it. Its canonical JSON (struct fields in declaration
//! order, `serde_json` maps key-sorted) is hashed with BLAKE3.

use serde::{Deserialize, Serialize};

use crate::domain::Signature;

/// Crate revision folded into every payload; a new release is a new algorithm.
pub const REVISION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Indicator,
    Strategy,
}

/// Hash input for a [`Signature`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignaturePayload {
    pub kind: PayloadKind,
    pub component: String,
    pub revision: String,
    pub config: serde_json::Value,
    pub detector: Option<String>,
}

impl SignaturePayload {
    pub fn indicator<C: Serialize>(
        component: &str,
        config: &C,
        detector: Option<&str>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: PayloadKind::Indicator,
            component: component.to_string(),
            revision: REVISION.to_string(),
            config: serde_json::to_value(config)?,
            detector: detector.map(str::to_string),
        })
    }

    pub fn strategy<C: Serialize>(name: &str, config: &C) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: PayloadKind::Strategy,
            component: name.to_string(),
            revision: REVISION.to_string(),
            config: serde_json::to_value(config)?,
            detector: None,
        })
    }

    pub fn canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn signature(&self) -> Result<Signature, serde_json::Error> {
        Ok(Signature::from_bytes(self.canonical_json()?.as_bytes()))
    }
}
