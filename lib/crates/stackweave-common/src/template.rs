//! CloudFormation-format stack template model.
//!
//! Resources and outputs live in `BTreeMap`s so that serializing the same
//! template twice always yields byte-identical JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const FORMAT_VERSION: &str = "2010-09-09";

/// Errors raised while assembling a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("logical id '{0}' is already defined in this template")]
    DuplicateLogicalId(String),

    #[error("invalid logical id '{0}': must be non-empty ASCII alphanumeric")]
    InvalidLogicalId(String),

    #[error("output '{0}' is already defined in this template")]
    DuplicateOutput(String),
}

/// A single stack template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    /// Macro applied by the engine before processing, e.g. hosted rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    pub description: String,
    #[serde(default)]
    pub resources: BTreeMap<String, Resource>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

/// A resource declaration: type, properties and ordering hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub properties: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,
}

impl Resource {
    #[must_use]
    pub fn new(kind: &str, properties: Value) -> Self {
        Self {
            kind: kind.to_string(),
            properties,
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    #[must_use]
    pub fn depends_on(mut self, logical_id: &str) -> Self {
        self.depends_on.push(logical_id.to_string());
        self
    }

    /// Set both the deletion and update-replace policy.
    #[must_use]
    pub fn retain_policy(mut self, policy: &str) -> Self {
        self.deletion_policy = Some(policy.to_string());
        self.update_replace_policy = Some(policy.to_string());
        self
    }
}

/// A stack output, optionally exported for cross-stack import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Export {
    pub name: String,
}

impl Template {
    #[must_use]
    pub fn new(description: &str) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            transform: None,
            description: description.to_string(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Add a resource under `logical_id`.
    pub fn add_resource(
        &mut self,
        logical_id: &str,
        resource: Resource,
    ) -> Result<(), TemplateError> {
        validate_logical_id(logical_id)?;
        if self.resources.contains_key(logical_id) {
            return Err(TemplateError::DuplicateLogicalId(logical_id.to_string()));
        }
        self.resources.insert(logical_id.to_string(), resource);
        Ok(())
    }

    /// Add an output, exported as `export` when given.
    pub fn add_output(
        &mut self,
        name: &str,
        value: Value,
        export: Option<String>,
    ) -> Result<(), TemplateError> {
        validate_logical_id(name)?;
        if self.outputs.contains_key(name) {
            return Err(TemplateError::DuplicateOutput(name.to_string()));
        }
        self.outputs.insert(
            name.to_string(),
            Output {
                value,
                description: None,
                export: export.map(|name| Export { name }),
            },
        );
        Ok(())
    }

    /// Resources of the given type, in logical-id order.
    pub fn resources_of<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> {
        self.resources.iter().filter(move |(_, r)| r.kind == kind)
    }

    /// Names of every `Fn::ImportValue` this template consumes, sorted.
    #[must_use]
    pub fn imports(&self) -> Vec<String> {
        let mut found = Vec::new();
        for resource in self.resources.values() {
            collect_imports(&resource.properties, &mut found);
        }
        for output in self.outputs.values() {
            collect_imports(&output.value, &mut found);
        }
        found.sort();
        found.dedup();
        found
    }

    /// Names of every export this template publishes, sorted.
    #[must_use]
    pub fn exports(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .outputs
            .values()
            .filter_map(|o| o.export.as_ref().map(|e| e.name.clone()))
            .collect();
        names.sort();
        names
    }
}

fn validate_logical_id(id: &str) -> Result<(), TemplateError> {
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(TemplateError::InvalidLogicalId(id.to_string()));
    }
    Ok(())
}

fn collect_imports(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(name)) = map.get("Fn::ImportValue") {
                found.push(name.clone());
            }
            for v in map.values() {
                collect_imports(v, found);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_imports(v, found);
            }
        }
        _ => {}
    }
}

/// Intrinsic function constructors.
pub mod intrinsic {
    use serde_json::{Value, json};

    #[must_use]
    pub fn reference(logical_id: &str) -> Value {
        json!({ "Ref": logical_id })
    }

    #[must_use]
    pub fn get_att(logical_id: &str, attribute: &str) -> Value {
        json!({ "Fn::GetAtt": [logical_id, attribute] })
    }

    #[must_use]
    pub fn import_value(export_name: &str) -> Value {
        json!({ "Fn::ImportValue": export_name })
    }

    /// The `index`th availability zone of the deployment region.
    #[must_use]
    pub fn availability_zone(index: usize) -> Value {
        json!({ "Fn::Select": [index, { "Fn::GetAZs": "" }] })
    }

    #[must_use]
    pub fn split(delimiter: &str, source: Value) -> Value {
        json!({ "Fn::Split": [delimiter, source] })
    }

    #[must_use]
    pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
        json!({ "Fn::Join": [delimiter, parts] })
    }

    #[must_use]
    pub fn sub(template: &str) -> Value {
        json!({ "Fn::Sub": template })
    }
}
