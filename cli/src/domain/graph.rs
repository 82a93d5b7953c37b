//! The dependency-ordered composition graph.
//!
//! Composition is a single straight-line pass: network, balancer, database,
//! file share, application. Each composer receives the upstream descriptors
//! by shared reference and the network as the same `Arc` throughout.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use stackweave_common::{GroupKind, standard_tags};

use crate::domain::access::AccessPolicy;
use crate::domain::application::{ApplicationDescriptor, ApplicationInputs, compose_application};
use crate::domain::balancer::{LoadBalancerDescriptor, compose_load_balancer};
use crate::domain::config::{StackConfig, validate_name};
use crate::domain::database::{DatabaseDescriptor, compose_database};
use crate::domain::error::ConfigError;
use crate::domain::network::{NetworkDescriptor, SubnetKind, compose_network};
use crate::domain::storage::{FileShareDescriptor, compose_file_share};

/// Identity of one composition run, resolved once and threaded through every
/// composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionContext {
    pub application: String,
    pub environment: String,
    /// Tags applied to every stack, standard keys included.
    pub tags: BTreeMap<String, String>,
    /// Content digest of the image asset, when the image is built locally.
    pub image_tag: Option<String>,
}

impl CompositionContext {
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the application name or the
    /// environment tag cannot be used in stack names.
    pub fn resolve(config: &StackConfig) -> Result<Self, ConfigError> {
        let app = &config.application;
        validate_name("application.name", &app.name)?;
        validate_name("application.environment", &app.environment)?;
        Ok(Self {
            application: app.name.clone(),
            environment: app.environment.clone(),
            tags: standard_tags(&app.name, &app.environment, &app.tags),
            image_tag: None,
        })
    }

    #[must_use]
    pub fn with_image_tag(mut self, tag: impl Into<String>) -> Self {
        self.image_tag = Some(tag.into());
        self
    }

    /// `{application}{environment}`, used in resource descriptions.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}{}", self.application, self.environment)
    }

    /// `{application}{group}{environment}`, e.g. `MoodleVPCDEV`.
    #[must_use]
    pub fn stack_name(&self, group: GroupKind) -> String {
        format!("{}{}{}", self.application, group.label(), self.environment)
    }

    #[cfg(test)]
    #[allow(clippy::expect_used)]
    pub fn for_tests() -> Self {
        Self::resolve(&StackConfig::default()).expect("default config resolves")
    }
}

/// Every descriptor of one deployment, immutable after [`compose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentGraph {
    pub context: CompositionContext,
    pub network: Arc<NetworkDescriptor>,
    pub balancer: LoadBalancerDescriptor,
    pub database: DatabaseDescriptor,
    pub file_share: FileShareDescriptor,
    pub application: ApplicationDescriptor,
}

/// Compose the whole graph in dependency order.
///
/// # Errors
///
/// Propagates the first configuration or composition error. Nothing is
/// returned for later groups once an earlier one fails.
pub fn compose(ctx: &CompositionContext, config: &StackConfig) -> Result<DeploymentGraph> {
    let network = Arc::new(compose_network(&config.network)?);
    let balancer = compose_load_balancer(ctx, &network);
    let database = compose_database(ctx, &network, &config.database)?;
    let file_share = compose_file_share(ctx, &network, &config.storage)?;
    let application = compose_application(
        ctx,
        &ApplicationInputs {
            network: &network,
            balancer: &balancer,
            database: &database,
            file_share: &file_share,
            params: &config.service,
        },
    )?;
    Ok(DeploymentGraph {
        context: ctx.clone(),
        network,
        balancer,
        database,
        file_share,
        application,
    })
}

impl DeploymentGraph {
    /// Groups in the order they are deployed.
    #[must_use]
    pub fn deploy_order(&self) -> Vec<GroupKind> {
        GroupKind::ALL.to_vec()
    }

    /// Groups in the order they are deleted.
    #[must_use]
    pub fn destroy_order(&self) -> Vec<GroupKind> {
        let mut order = self.deploy_order();
        order.reverse();
        order
    }

    #[must_use]
    pub fn access_policy(&self) -> &AccessPolicy {
        &self.application.access_policy
    }

    #[must_use]
    pub fn stack_name(&self, group: GroupKind) -> String {
        self.context.stack_name(group)
    }

    /// Serializable overview for `stackweave plan`.
    #[must_use]
    pub fn plan(&self) -> Plan {
        let stacks = self
            .deploy_order()
            .into_iter()
            .map(|group| PlannedStack {
                stack: self.stack_name(group),
                group,
                depends_on: group
                    .dependencies()
                    .iter()
                    .map(|dep| self.stack_name(*dep))
                    .collect(),
            })
            .collect();
        let subnets = [SubnetKind::Public, SubnetKind::Private]
            .into_iter()
            .flat_map(|kind| self.network.subnets(kind))
            .map(|s| PlannedSubnet {
                id: s.id.clone(),
                kind: s.kind,
                zone: s.az_index,
                cidr: s.cidr.to_string(),
                nat_gateway: match s.kind {
                    SubnetKind::Public => None,
                    SubnetKind::Private => {
                        self.network.nat_route_for(s.az_index).map(|n| n.id.clone())
                    }
                },
            })
            .collect();
        Plan {
            application: self.context.application.clone(),
            environment: self.context.environment.clone(),
            stacks,
            subnets,
            access: self
                .access_policy()
                .edges()
                .iter()
                .map(ToString::to_string)
                .collect(),
            image: self.application.task.container.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub application: String,
    pub environment: String,
    pub stacks: Vec<PlannedStack>,
    pub subnets: Vec<PlannedSubnet>,
    pub access: Vec<String>,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStack {
    pub stack: String,
    pub group: GroupKind,
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedSubnet {
    pub id: String,
    pub kind: SubnetKind,
    pub zone: u8,
    pub cidr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nat_gateway: Option<String>,
}
