//! Application composition: cluster, task, scaled service, listener and the
//! access policy that wires the service to its upstream groups.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use stackweave_common::GroupKind;

use crate::domain::access::{
    ANY_IPV4, AccessControlGroupDescriptor, AccessNode, AccessPolicy, AccessRule, Direction,
    GroupRule, Peer,
};
use crate::domain::balancer::{HealthCheck, Listener, LoadBalancerDescriptor, TargetGroup};
use crate::domain::database::{DatabaseDescriptor, SecretField};
use crate::domain::error::{CompositionError, ConfigError};
use crate::domain::graph::CompositionContext;
use crate::domain::handle::Handle;
use crate::domain::network::{NetworkDescriptor, SubnetKind};
use crate::domain::storage::FileShareDescriptor;

pub const CONTAINER_PORT: u16 = 8080;
pub const TASK_CPU_UNITS: u32 = 1024;
pub const TASK_MEMORY_MIB: u32 = 2048;
pub const PLATFORM_VERSION: &str = "1.4.0";
pub const DESIRED_COUNT: u32 = 1;
pub const HEALTH_CHECK_GRACE: Duration = Duration::from_secs(900);

pub const MIN_REPLICAS: u32 = 1;
pub const MAX_REPLICAS: u32 = 4;
pub const TARGET_CPU_PERCENT: u8 = 75;
pub const SCALING_COOLDOWN: Duration = Duration::from_secs(300);

pub const HEALTHY_THRESHOLD: u8 = 3;
pub const UNHEALTHY_THRESHOLD: u8 = 2;
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10);
pub const SUCCESS_CODES: &str = "200-299,301,302";

pub const CLUSTER_ID: &str = "Cluster";
pub const LOG_GROUP_ID: &str = "LogGroup";
pub const ADMIN_SECRET_ID: &str = "AdminSecret";
pub const EXECUTION_ROLE_ID: &str = "TaskExecutionRole";
pub const TASK_ROLE_ID: &str = "TaskRole";
pub const TASK_DEFINITION_ID: &str = "TaskDefinition";
pub const SERVICE_ID: &str = "Service";
pub const SERVICE_SG_ID: &str = "ServiceSecurityGroup";
pub const SCALABLE_TARGET_ID: &str = "ScalableTarget";
pub const SCALING_POLICY_ID: &str = "CpuScalingPolicy";
pub const TARGET_GROUP_ID: &str = "TargetGroup";
pub const LISTENER_ID: &str = "HttpListener";
pub const VOLUME_NAME: &str = "shared";
pub const DNS_OUTPUT: &str = "LoadBalancerDNSName";

pub const EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonECSTaskExecutionRolePolicy";

/// Retention windows the log service accepts.
const LOG_RETENTION_DAYS: [u16; 17] = [
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1827, 3653,
];

/// Substrings that mark a plain environment variable as a credential.
const SECRET_MARKERS: [&str; 4] = ["PASSWORD", "SECRET", "TOKEN", "PRIVATE_KEY"];

// ── Configuration ────────────────────────────────────────────────────────────

/// Service section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceParams {
    pub image: ImageSource,
    /// In-container path where the share is mounted.
    pub mount_path: String,
    /// Database driver name handed to the application.
    pub database_kind: String,
    /// Extra plain environment variables. Credential-looking keys are refused.
    pub environment: BTreeMap<String, String>,
    pub admin: AdminParams,
    pub env_names: EnvNames,
    pub log_retention_days: u16,
    pub log_stream_prefix: String,
}

impl Default for ServiceParams {
    fn default() -> Self {
        let environment = [
            ("ALLOW_EMPTY_PASSWORD", "no"),
            ("BITNAMI_DEBUG", "false"),
            ("PHP_ENABLE_OPCACHE", "yes"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            image: ImageSource::default(),
            mount_path: "/bitnami".to_string(),
            database_kind: "mysqli".to_string(),
            environment,
            admin: AdminParams::default(),
            env_names: EnvNames::default(),
            log_retention_days: 5,
            log_stream_prefix: "ecs-moodle".to_string(),
        }
    }
}

impl ServiceParams {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a credential-looking plain variable, a
    /// plain variable that shadows a managed one, clashing managed names, a
    /// relative mount path, an unsupported log retention or an empty prefix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(key) = self
            .environment
            .keys()
            .find(|k| looks_like_secret(k.as_str()))
        {
            return Err(ConfigError::PlaintextSecret(key.clone()));
        }
        self.env_names.validate()?;
        if let Some((binding, name)) = self
            .env_names
            .bindings()
            .into_iter()
            .find(|(_, name)| self.environment.contains_key(*name))
        {
            return Err(ConfigError::ReservedEnvName {
                name: name.to_string(),
                binding,
            });
        }
        if !self.mount_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "service.mount_path".into(),
                value: self.mount_path.clone(),
                expected: "an absolute path".into(),
            });
        }
        if !LOG_RETENTION_DAYS.contains(&self.log_retention_days) {
            return Err(ConfigError::InvalidValue {
                key: "service.log_retention_days".into(),
                value: self.log_retention_days.to_string(),
                expected: format!("one of {LOG_RETENTION_DAYS:?}"),
            });
        }
        if self.log_stream_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "service.log_stream_prefix".into(),
                value: self.log_stream_prefix.clone(),
                expected: "a non-empty prefix".into(),
            });
        }
        if let ImageSource::Asset(asset) = &self.image {
            if asset.repository.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "service.image.asset.repository".into(),
                    value: asset.repository.clone(),
                    expected: "a registry repository URI".into(),
                });
            }
        }
        Ok(())
    }
}

fn looks_like_secret(key: &str) -> bool {
    let upper = key.to_ascii_uppercase();
    upper != "ALLOW_EMPTY_PASSWORD" && SECRET_MARKERS.iter().any(|m| upper.contains(m))
}

/// Where the container image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// A prebuilt image reference.
    Registry(String),
    /// A local build context, built and pushed before deploy and tagged with
    /// the digest of its contents.
    Asset(ImageAsset),
}

impl Default for ImageSource {
    fn default() -> Self {
        ImageSource::Registry("bitnami/moodle:latest".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub directory: PathBuf,
    #[serde(default = "default_dockerfile")]
    pub dockerfile: String,
    /// Repository URI the built image is pushed to.
    pub repository: String,
}

fn default_dockerfile() -> String {
    "Dockerfile".to_string()
}

impl ImageAsset {
    #[must_use]
    pub fn image_uri(&self, tag: &str) -> String {
        format!("{}:{tag}", self.repository)
    }
}

/// Initial administrator identity. The password is always generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminParams {
    pub username: String,
    pub email: String,
}

impl Default for AdminParams {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@localhost.localdomain".to_string(),
        }
    }
}

/// Environment variable names the container image reads its settings from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvNames {
    pub admin_username: String,
    pub admin_password: String,
    pub admin_email: String,
    pub database_kind: String,
    pub database_host: String,
    pub database_port: String,
    pub database_name: String,
    pub database_user: String,
    pub database_password: String,
}

impl EnvNames {
    /// Every managed variable name with the setting that binds it.
    #[must_use]
    pub fn bindings(&self) -> [(&'static str, &str); 9] {
        [
            ("admin_username", self.admin_username.as_str()),
            ("admin_password", self.admin_password.as_str()),
            ("admin_email", self.admin_email.as_str()),
            ("database_kind", self.database_kind.as_str()),
            ("database_host", self.database_host.as_str()),
            ("database_port", self.database_port.as_str()),
            ("database_name", self.database_name.as_str()),
            ("database_user", self.database_user.as_str()),
            ("database_password", self.database_password.as_str()),
        ]
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateEnvName`] when two settings name the
    /// same variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bindings = self.bindings();
        for (i, (first, name)) in bindings.iter().enumerate() {
            if let Some((second, _)) = bindings[i + 1..].iter().find(|(_, other)| other == name) {
                return Err(ConfigError::DuplicateEnvName {
                    name: (*name).to_string(),
                    first: *first,
                    second: *second,
                });
            }
        }
        Ok(())
    }
}

impl Default for EnvNames {
    fn default() -> Self {
        Self {
            admin_username: "MOODLE_USERNAME".to_string(),
            admin_password: "MOODLE_PASSWORD".to_string(),
            admin_email: "MOODLE_EMAIL".to_string(),
            database_kind: "MOODLE_DATABASE_TYPE".to_string(),
            database_host: "MOODLE_DATABASE_HOST".to_string(),
            database_port: "MOODLE_DATABASE_PORT_NUMBER".to_string(),
            database_name: "MOODLE_DATABASE_NAME".to_string(),
            database_user: "MOODLE_DATABASE_USER".to_string(),
            database_password: "MOODLE_DATABASE_PASSWORD".to_string(),
        }
    }
}

// ── Descriptor ───────────────────────────────────────────────────────────────

/// Value of a plain environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvValue {
    Literal(String),
    /// Resolved by the engine at deploy time.
    Handle(Handle),
}

/// A variable injected from a secret at task start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretRef {
    pub secret: Handle,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: String,
    pub container_insights: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroup {
    pub id: String,
    pub retention_days: u16,
    pub stream_prefix: String,
}

/// Generated administrator credentials, consumed by reference only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSecret {
    pub id: String,
    pub username: String,
}

impl AdminSecret {
    #[must_use]
    pub fn handle(&self) -> Handle {
        Handle::reference(GroupKind::Application, &self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyResource {
    Any,
    Handle(Handle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    pub actions: Vec<&'static str>,
    pub resources: Vec<PolicyResource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub managed_policies: Vec<&'static str>,
    pub statements: Vec<PolicyStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    pub volume: String,
    pub container_path: String,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub port: u16,
    pub environment: BTreeMap<String, EnvValue>,
    pub secrets: BTreeMap<String, SecretRef>,
    pub mount: MountPoint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub name: String,
    pub share: Handle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub id: String,
    pub cpu_units: u32,
    pub memory_mib: u32,
    pub volume: Volume,
    pub container: ContainerSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub id: String,
    pub security_group: AccessControlGroupDescriptor,
    pub placement: SubnetKind,
    pub platform_version: &'static str,
    pub desired_count: u32,
    pub health_check_grace: Duration,
    pub execute_command: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingPolicy {
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub target_cpu_percent: u8,
    pub scale_in_cooldown: Duration,
    pub scale_out_cooldown: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDescriptor {
    pub network: Arc<NetworkDescriptor>,
    pub cluster: Cluster,
    pub log_group: LogGroup,
    pub admin_secret: AdminSecret,
    pub execution_role: Role,
    pub task_role: Role,
    pub task: TaskSpec,
    pub service: ServiceSpec,
    pub scaling: ScalingPolicy,
    pub balancer: Handle,
    pub listener: Listener,
    pub access_policy: AccessPolicy,
    /// Materialized policy plus the balancer's public inbound rule.
    pub group_rules: Vec<GroupRule>,
    pub dns_name: Handle,
}

impl ApplicationDescriptor {
    /// Rules attached to the balancer's group by this composer.
    pub fn balancer_rules<'a>(
        &'a self,
        balancer: &'a LoadBalancerDescriptor,
    ) -> impl Iterator<Item = &'a GroupRule> {
        let group = balancer.security_group.handle();
        self.group_rules.iter().filter(move |r| r.group == group)
    }
}

/// Upstream descriptors the application is wired to.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationInputs<'a> {
    pub network: &'a Arc<NetworkDescriptor>,
    pub balancer: &'a LoadBalancerDescriptor,
    pub database: &'a DatabaseDescriptor,
    pub file_share: &'a FileShareDescriptor,
    pub params: &'a ServiceParams,
}

// ── Composer ─────────────────────────────────────────────────────────────────

/// Compose the application group.
///
/// Every upstream descriptor is checked before anything is built, so a
/// malformed input never yields a partial task or service.
///
/// # Errors
///
/// Returns [`CompositionError`] when an upstream descriptor belongs to another
/// network or lacks a provisioned handle, or when an asset image has no
/// resolved tag. Returns [`ConfigError`] for invalid service parameters.
pub fn compose_application(
    ctx: &CompositionContext,
    inputs: &ApplicationInputs<'_>,
) -> Result<ApplicationDescriptor> {
    let ApplicationInputs {
        network,
        balancer,
        database,
        file_share,
        params,
    } = *inputs;

    if !Arc::ptr_eq(&balancer.network, network) {
        return Err(CompositionError::ForeignNetwork("load balancer").into());
    }
    if !Arc::ptr_eq(&database.network, network) {
        return Err(CompositionError::ForeignNetwork("database").into());
    }
    if !Arc::ptr_eq(&file_share.network, network) {
        return Err(CompositionError::ForeignNetwork("file share").into());
    }
    let endpoint = database
        .endpoint
        .as_ref()
        .ok_or_else(|| CompositionError::MissingEndpoint(database.id.clone()))?;
    let share_id = file_share
        .share_id
        .clone()
        .ok_or_else(|| CompositionError::MissingShareId(file_share.id.clone()))?;
    let dns_name = balancer
        .dns_name
        .clone()
        .ok_or_else(|| CompositionError::MissingDnsName(balancer.id.clone()))?;
    params.validate()?;
    let image = resolve_image(ctx, &params.image)?;

    let admin_secret = AdminSecret {
        id: ADMIN_SECRET_ID.to_string(),
        username: params.admin.username.clone(),
    };
    let names = &params.env_names;

    let mut environment: BTreeMap<String, EnvValue> = params
        .environment
        .iter()
        .map(|(k, v)| (k.clone(), EnvValue::Literal(v.clone())))
        .collect();
    for (key, value) in [
        (&names.admin_username, EnvValue::Literal(params.admin.username.clone())),
        (&names.admin_email, EnvValue::Literal(params.admin.email.clone())),
        (&names.database_kind, EnvValue::Literal(params.database_kind.clone())),
        (&names.database_host, EnvValue::Handle(endpoint.address.clone())),
        (&names.database_port, EnvValue::Handle(endpoint.port.clone())),
    ] {
        environment.insert(key.clone(), value);
    }

    let db_secret = database.secret.handle();
    let secrets: BTreeMap<String, SecretRef> = [
        (&names.database_name, db_secret.clone(), SecretField::DbName.key()),
        (&names.database_user, db_secret.clone(), SecretField::Username.key()),
        (&names.database_password, db_secret.clone(), SecretField::Password.key()),
        (&names.admin_password, admin_secret.handle(), SecretField::Password.key()),
    ]
    .into_iter()
    .map(|(name, secret, field)| (name.clone(), SecretRef { secret, field }))
    .collect();

    let execution_role = Role {
        id: EXECUTION_ROLE_ID.to_string(),
        managed_policies: vec![EXECUTION_POLICY],
        statements: vec![PolicyStatement {
            actions: vec!["secretsmanager:GetSecretValue"],
            resources: vec![
                PolicyResource::Handle(db_secret),
                PolicyResource::Handle(admin_secret.handle()),
            ],
        }],
    };
    let task_role = Role {
        id: TASK_ROLE_ID.to_string(),
        managed_policies: Vec::new(),
        statements: vec![PolicyStatement {
            actions: vec![
                "ssmmessages:CreateControlChannel",
                "ssmmessages:CreateDataChannel",
                "ssmmessages:OpenControlChannel",
                "ssmmessages:OpenDataChannel",
            ],
            resources: vec![PolicyResource::Any],
        }],
    };

    let task = TaskSpec {
        id: TASK_DEFINITION_ID.to_string(),
        cpu_units: TASK_CPU_UNITS,
        memory_mib: TASK_MEMORY_MIB,
        volume: Volume {
            name: VOLUME_NAME.to_string(),
            share: share_id,
        },
        container: ContainerSpec {
            name: ctx.application.to_ascii_lowercase(),
            image,
            port: CONTAINER_PORT,
            environment,
            secrets,
            mount: MountPoint {
                volume: VOLUME_NAME.to_string(),
                container_path: params.mount_path.clone(),
                read_only: false,
            },
        },
    };

    let service_group = AccessControlGroupDescriptor::new(
        SERVICE_SG_ID,
        GroupKind::Application,
        &network.id,
        &format!("{} service", ctx.qualified_name()),
    );

    let access_policy =
        AccessPolicy::for_application(database.port, file_share.port, CONTAINER_PORT);
    let mut group_rules = access_policy.materialize(|node| match node {
        AccessNode::LoadBalancer => &balancer.security_group,
        AccessNode::Service => &service_group,
        AccessNode::Database => &database.security_group,
        AccessNode::FileShare => &file_share.security_group,
    });
    group_rules.push(GroupRule {
        id: format!("{}FromAnyIpv4{}", balancer.security_group.id, balancer.http_port),
        group: balancer.security_group.handle(),
        rule: AccessRule::tcp(
            Direction::Ingress,
            balancer.http_port,
            Peer::AnyIpv4,
            &format!("Allow inbound {} from {ANY_IPV4}", balancer.http_port),
        ),
    });

    let listener = Listener {
        id: LISTENER_ID.to_string(),
        port: balancer.http_port,
        target: TargetGroup {
            id: TARGET_GROUP_ID.to_string(),
            port: CONTAINER_PORT,
            health_check: HealthCheck {
                path: "/".to_string(),
                success_codes: SUCCESS_CODES.to_string(),
                healthy_threshold: HEALTHY_THRESHOLD,
                unhealthy_threshold: UNHEALTHY_THRESHOLD,
                interval: HEALTH_CHECK_INTERVAL,
            },
        },
    };
    listener.target.health_check.validate()?;

    Ok(ApplicationDescriptor {
        network: Arc::clone(network),
        cluster: Cluster {
            id: CLUSTER_ID.to_string(),
            container_insights: true,
        },
        log_group: LogGroup {
            id: LOG_GROUP_ID.to_string(),
            retention_days: params.log_retention_days,
            stream_prefix: params.log_stream_prefix.clone(),
        },
        admin_secret,
        execution_role,
        task_role,
        task,
        service: ServiceSpec {
            id: SERVICE_ID.to_string(),
            security_group: service_group,
            placement: SubnetKind::Private,
            platform_version: PLATFORM_VERSION,
            desired_count: DESIRED_COUNT,
            health_check_grace: HEALTH_CHECK_GRACE,
            execute_command: true,
        },
        scaling: ScalingPolicy {
            min_replicas: MIN_REPLICAS,
            max_replicas: MAX_REPLICAS,
            target_cpu_percent: TARGET_CPU_PERCENT,
            scale_in_cooldown: SCALING_COOLDOWN,
            scale_out_cooldown: SCALING_COOLDOWN,
        },
        balancer: balancer.handle(),
        listener,
        access_policy,
        group_rules,
        dns_name,
    })
}

fn resolve_image(
    ctx: &CompositionContext,
    source: &ImageSource,
) -> Result<String, CompositionError> {
    match source {
        ImageSource::Registry(uri) => Ok(uri.clone()),
        ImageSource::Asset(asset) => ctx
            .image_tag
            .as_deref()
            .map(|tag| asset.image_uri(tag))
            .ok_or_else(|| {
                CompositionError::UnresolvedImage(asset.directory.display().to_string())
            }),
    }
}
