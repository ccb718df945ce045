//! Trust policy documents attached to the control resource.
//!
//! The control resource only exists to carry the control record, so it is
//! created with a policy that lets nobody use it.

use serde::{Deserialize, Serialize};

const POLICY_VERSION: &str = "2012-10-17";
const ASSUME_ACTION: &str = "sts:AssumeRole";
const ANY_PRINCIPAL: &str = "*";

/// Whether a statement grants or refuses its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "AWS")]
    pub aws: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub principal: Principal,
    pub action: String,
}

/// Policy document in the usual `{Version, Statement: [...]}` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrustPolicy {
    pub version: String,
    pub statement: Vec<PolicyStatement>,
}

impl TrustPolicy {
    /// A policy no principal can satisfy.
    pub fn deny_all() -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                effect: Effect::Deny,
                principal: Principal {
                    aws: ANY_PRINCIPAL.to_string(),
                },
                action: ASSUME_ACTION.to_string(),
            }],
        }
    }
}
