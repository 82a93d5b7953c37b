//! Database composition: managed relational instance plus its credential secret.

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use stackweave_common::GroupKind;

use crate::domain::access::{AccessControlGroupDescriptor, AccessRule, Direction, Peer};
use crate::domain::error::ConfigError;
use crate::domain::graph::CompositionContext;
use crate::domain::handle::Handle;
use crate::domain::network::{NetworkDescriptor, SubnetKind};

pub const DATABASE_PORT: u16 = 3306;
pub const DATABASE_ENGINE: &str = "mysql";
pub const DATABASE_ID: &str = "Database";
pub const DATABASE_SG_ID: &str = "DatabaseSecurityGroup";
pub const DATABASE_SECRET_ID: &str = "DatabaseSecret";
pub const ROTATION_SG_ID: &str = "RotationSecurityGroup";

/// Database section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseParams {
    pub engine_version: String,
    pub instance_class: String,
    pub allocated_storage_gib: u32,
    pub database_name: String,
    pub username: String,
    pub rotation_days: u16,
    pub removal_policy: RemovalPolicy,
}

impl Default for DatabaseParams {
    fn default() -> Self {
        Self {
            engine_version: "8.0".to_string(),
            instance_class: "db.t3.micro".to_string(),
            allocated_storage_gib: 20,
            database_name: "moodle".to_string(),
            username: "dbadmin".to_string(),
            rotation_days: 30,
            removal_policy: RemovalPolicy::Snapshot,
        }
    }
}

/// What the engine does with the instance when the stack goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
    Delete,
    Retain,
    Snapshot,
}

impl RemovalPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RemovalPolicy::Delete => "Delete",
            RemovalPolicy::Retain => "Retain",
            RemovalPolicy::Snapshot => "Snapshot",
        }
    }

    /// Policy for the credential secret. A retained or snapshotted instance
    /// keeps its secret so the data stays reachable.
    #[must_use]
    pub fn for_secret(self) -> RemovalPolicy {
        match self {
            RemovalPolicy::Delete => RemovalPolicy::Delete,
            RemovalPolicy::Retain | RemovalPolicy::Snapshot => RemovalPolicy::Retain,
        }
    }
}

/// Keys of the generated credential secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretField {
    DbName,
    Username,
    Password,
}

impl SecretField {
    pub const ALL: [SecretField; 3] = [
        SecretField::DbName,
        SecretField::Username,
        SecretField::Password,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            SecretField::DbName => "dbname",
            SecretField::Username => "username",
            SecretField::Password => "password",
        }
    }
}

/// Generated, rotated credentials. Only the username and database name are
/// known up front; the password never leaves the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSecret {
    pub id: String,
    pub username: String,
    pub database_name: String,
    pub rotation_days: u16,
    pub removal_policy: RemovalPolicy,
}

impl CredentialSecret {
    #[must_use]
    pub fn handle(&self) -> Handle {
        Handle::reference(GroupKind::Database, &self.id)
    }
}

/// Address and port of the provisioned instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseEndpoint {
    pub address: Handle,
    pub port: Handle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseDescriptor {
    pub id: String,
    pub network: Arc<NetworkDescriptor>,
    pub security_group: AccessControlGroupDescriptor,
    /// Group used by the rotation function to reach the instance.
    pub rotation_group: AccessControlGroupDescriptor,
    pub placement: SubnetKind,
    pub engine: &'static str,
    pub engine_version: String,
    pub instance_class: String,
    pub allocated_storage_gib: u32,
    pub port: u16,
    pub removal_policy: RemovalPolicy,
    pub secret: CredentialSecret,
    pub endpoint: Option<DatabaseEndpoint>,
}

/// Single instance in the private subnets with a generated secret.
///
/// # Errors
///
/// Returns a [`ConfigError`] for an invalid database name or username,
/// storage below 20 GiB, or a rotation window outside 1..=365 days.
pub fn compose_database(
    ctx: &CompositionContext,
    network: &Arc<NetworkDescriptor>,
    params: &DatabaseParams,
) -> Result<DatabaseDescriptor> {
    validate_identifier("database.database_name", &params.database_name)?;
    validate_identifier("database.username", &params.username)?;
    if params.allocated_storage_gib < 20 {
        return Err(ConfigError::InvalidValue {
            key: "database.allocated_storage_gib".into(),
            value: params.allocated_storage_gib.to_string(),
            expected: "at least 20".into(),
        }
        .into());
    }
    if !(1..=365).contains(&params.rotation_days) {
        return Err(ConfigError::InvalidValue {
            key: "database.rotation_days".into(),
            value: params.rotation_days.to_string(),
            expected: "1..=365".into(),
        }
        .into());
    }

    let rotation_group = AccessControlGroupDescriptor::new(
        ROTATION_SG_ID,
        GroupKind::Database,
        &network.id,
        &format!("{} credential rotation", ctx.qualified_name()),
    );
    let security_group = AccessControlGroupDescriptor::new(
        DATABASE_SG_ID,
        GroupKind::Database,
        &network.id,
        &format!("{} database", ctx.qualified_name()),
    )
    .with_rule(AccessRule::tcp(
        Direction::Ingress,
        DATABASE_PORT,
        Peer::Group(rotation_group.handle()),
        "Credential rotation",
    ));

    Ok(DatabaseDescriptor {
        id: DATABASE_ID.to_string(),
        network: Arc::clone(network),
        security_group,
        rotation_group,
        placement: SubnetKind::Private,
        engine: DATABASE_ENGINE,
        engine_version: params.engine_version.clone(),
        instance_class: params.instance_class.clone(),
        allocated_storage_gib: params.allocated_storage_gib,
        port: DATABASE_PORT,
        removal_policy: params.removal_policy,
        secret: CredentialSecret {
            id: DATABASE_SECRET_ID.to_string(),
            username: params.username.clone(),
            database_name: params.database_name.clone(),
            rotation_days: params.rotation_days,
            removal_policy: params.removal_policy.for_secret(),
        },
        endpoint: Some(DatabaseEndpoint {
            address: Handle::attribute(GroupKind::Database, DATABASE_ID, "Endpoint.Address"),
            port: Handle::attribute(GroupKind::Database, DATABASE_ID, "Endpoint.Port"),
        }),
    })
}

/// Names must start with a letter and contain only letters, digits and `_`.
fn validate_identifier(key: &str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && value.len() <= 16;
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: "1-16 characters, starting with a letter, letters/digits/_ only".into(),
        })
    }
}
