//! Handles to values that only exist once the engine has provisioned a resource.
//!
//! A handle names the owning group, the resource's logical id and optionally
//! one of its attributes. Synthesis turns a handle into a local reference when
//! it is used inside its own stack and into a cross-stack import otherwise.

use serde::Serialize;
use stackweave_common::GroupKind;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Handle {
    pub group: GroupKind,
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Handle {
    /// The resource's primary identifier (`Ref`).
    #[must_use]
    pub fn reference(group: GroupKind, resource: &str) -> Self {
        Self {
            group,
            resource: resource.to_string(),
            attribute: None,
        }
    }

    /// A named attribute of the resource (`Fn::GetAtt`).
    #[must_use]
    pub fn attribute(group: GroupKind, resource: &str, attribute: &str) -> Self {
        Self {
            group,
            resource: resource.to_string(),
            attribute: Some(attribute.to_string()),
        }
    }

    /// Output name under which the owning stack exports this handle.
    #[must_use]
    pub fn export_key(&self) -> String {
        match &self.attribute {
            None => self.resource.clone(),
            Some(attr) => {
                let attr: String = attr.chars().filter(char::is_ascii_alphanumeric).collect();
                format!("{}{attr}", self.resource)
            }
        }
    }
}
