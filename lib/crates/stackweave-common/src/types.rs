use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five composition groups, in dependency order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Network,
    Balancer,
    Database,
    Storage,
    Application,
}

impl GroupKind {
    /// All groups in the order they are composed and deployed.
    pub const ALL: [GroupKind; 5] = [
        GroupKind::Network,
        GroupKind::Balancer,
        GroupKind::Database,
        GroupKind::Storage,
        GroupKind::Application,
    ];

    /// Groups this group consumes handles from.
    #[must_use]
    pub fn dependencies(self) -> &'static [GroupKind] {
        match self {
            GroupKind::Network => &[],
            GroupKind::Balancer | GroupKind::Database | GroupKind::Storage => {
                &[GroupKind::Network]
            }
            GroupKind::Application => &[
                GroupKind::Network,
                GroupKind::Balancer,
                GroupKind::Database,
                GroupKind::Storage,
            ],
        }
    }

    /// PascalCase label used in stack names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GroupKind::Network => "VPC",
            GroupKind::Balancer => "LoadBalancer",
            GroupKind::Database => "Database",
            GroupKind::Storage => "FileSystem",
            GroupKind::Application => "Application",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupKind::Network => "network",
            GroupKind::Balancer => "balancer",
            GroupKind::Database => "database",
            GroupKind::Storage => "storage",
            GroupKind::Application => "application",
        };
        f.write_str(s)
    }
}

/// Outcome of deploying or deleting one stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackResult {
    pub stack: String,
    pub group: GroupKind,
    pub status: StackStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StackStatus {
    Deployed,
    Deleted,
    Absent,
}

/// Summary returned by `stackweave deploy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployReport {
    pub application: String,
    pub environment: String,
    pub stacks: Vec<StackResult>,
    /// Public DNS name of the load balancer, read back from the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer_dns: Option<String>,
    pub finished_at: DateTime<Utc>,
}

/// Outputs of one deployed stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackOutputs {
    pub stack: String,
    pub group: GroupKind,
    pub outputs: BTreeMap<String, String>,
}
