//! Shared file-share composition.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stackweave_common::GroupKind;

use crate::domain::access::AccessControlGroupDescriptor;
use crate::domain::error::ConfigError;
use crate::domain::graph::CompositionContext;
use crate::domain::handle::Handle;
use crate::domain::network::{NetworkDescriptor, SubnetKind};

pub const NFS_PORT: u16 = 2049;
pub const FILE_SYSTEM_ID: &str = "FileSystem";
pub const FILE_SYSTEM_SG_ID: &str = "FileSystemSecurityGroup";

/// Storage section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageParams {
    pub performance_mode: PerformanceMode,
    pub throughput_mode: ThroughputMode,
    pub encrypted: bool,
}

impl Default for StorageParams {
    fn default() -> Self {
        Self {
            performance_mode: PerformanceMode::GeneralPurpose,
            throughput_mode: ThroughputMode::Bursting,
            encrypted: true,
        }
    }
}

impl StorageParams {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for elastic throughput on a
    /// max-I/O share; the engine only offers elastic throughput with general
    /// purpose performance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.throughput_mode == ThroughputMode::Elastic
            && self.performance_mode != PerformanceMode::GeneralPurpose
        {
            return Err(ConfigError::InvalidValue {
                key: "storage.throughput_mode".into(),
                value: self.throughput_mode.as_str().into(),
                expected: format!(
                    "bursting when performance_mode is {}",
                    self.performance_mode.as_str()
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceMode {
    #[serde(rename = "generalPurpose")]
    GeneralPurpose,
    #[serde(rename = "maxIO")]
    MaxIo,
}

impl PerformanceMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceMode::GeneralPurpose => "generalPurpose",
            PerformanceMode::MaxIo => "maxIO",
        }
    }
}

/// Throughput scaling. `Bursting` grows with accumulated credits instead of
/// a statically provisioned rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThroughputMode {
    Bursting,
    Elastic,
}

impl ThroughputMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ThroughputMode::Bursting => "bursting",
            ThroughputMode::Elastic => "elastic",
        }
    }
}

/// One network attachment point of the share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTarget {
    pub id: String,
    pub subnet: Handle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileShareDescriptor {
    pub id: String,
    pub network: Arc<NetworkDescriptor>,
    pub security_group: AccessControlGroupDescriptor,
    pub performance_mode: PerformanceMode,
    pub throughput_mode: ThroughputMode,
    pub encrypted: bool,
    pub port: u16,
    pub mount_targets: Vec<MountTarget>,
    pub share_id: Option<Handle>,
}

/// File share reachable from every private subnet.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the performance and throughput modes
/// cannot be combined.
pub fn compose_file_share(
    ctx: &CompositionContext,
    network: &Arc<NetworkDescriptor>,
    params: &StorageParams,
) -> Result<FileShareDescriptor, ConfigError> {
    params.validate()?;
    let security_group = AccessControlGroupDescriptor::new(
        FILE_SYSTEM_SG_ID,
        GroupKind::Storage,
        &network.id,
        &format!("{} file share", ctx.qualified_name()),
    );
    let mount_targets = network
        .subnets(SubnetKind::Private)
        .iter()
        .map(|subnet| MountTarget {
            id: format!("MountTarget{}", subnet.az_index + 1),
            subnet: subnet.handle(),
        })
        .collect();

    Ok(FileShareDescriptor {
        id: FILE_SYSTEM_ID.to_string(),
        network: Arc::clone(network),
        security_group,
        performance_mode: params.performance_mode,
        throughput_mode: params.throughput_mode,
        encrypted: params.encrypted,
        port: NFS_PORT,
        mount_targets,
        share_id: Some(Handle::reference(GroupKind::Storage, FILE_SYSTEM_ID)),
    })
}
