//! Synthesis of a [`DeploymentGraph`] into one stack template per group.
//!
//! A handle used inside its owning stack becomes a `Ref`/`Fn::GetAtt`; used
//! anywhere else it becomes an `Fn::ImportValue` of `{stack}-{export key}`,
//! and the owning stack gets a matching exported output in a second pass.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use serde_json::{Value, json};
use stackweave_common::{GroupKind, Manifest, ManifestEntry, Resource, Template, intrinsic};

use crate::domain::access::{ANY_IPV4, AccessControlGroupDescriptor, AccessRule, Direction, Peer};
use crate::domain::application::{
    ADMIN_SECRET_ID, ApplicationDescriptor, CLUSTER_ID, DNS_OUTPUT, EnvValue, LOG_GROUP_ID,
    PolicyResource, Role, SCALABLE_TARGET_ID, SCALING_POLICY_ID,
};
use crate::domain::balancer::LoadBalancerDescriptor;
use crate::domain::database::{DatabaseDescriptor, SecretField};
use crate::domain::error::CompositionError;
use crate::domain::graph::{CompositionContext, DeploymentGraph};
use crate::domain::handle::Handle;
use crate::domain::network::{NetworkDescriptor, Subnet, SubnetKind};
use crate::domain::storage::FileShareDescriptor;

pub const SECRETS_TRANSFORM: &str = "AWS::SecretsManager-2020-07-23";
pub const VPC_OUTPUT: &str = "VpcId";
const ROTATION_TYPE: &str = "MySQLSingleUser";
const EXCLUDED_PASSWORD_CHARS: &str = " %+~`#$&*()|[]{}:;<>?!'/@\"\\";

/// One synthesized stack.
#[derive(Debug, Clone, PartialEq)]
pub struct StackTemplate {
    pub name: String,
    pub group: GroupKind,
    /// Names of the stacks whose exports this one imports.
    pub depends_on: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub template: Template,
}

impl StackTemplate {
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.template.json", self.name)
    }

    /// Pretty-printed template body with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be serialized.
    pub fn render(&self) -> Result<String> {
        let mut body = serde_json::to_string_pretty(&self.template)?;
        body.push('\n');
        Ok(body)
    }
}

/// Result of one synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// Stacks in deploy order.
    pub stacks: Vec<StackTemplate>,
    pub manifest: Manifest,
}

impl Synthesis {
    #[must_use]
    pub fn stack(&self, group: GroupKind) -> Option<&StackTemplate> {
        self.stacks.iter().find(|s| s.group == group)
    }
}

/// Synthesize every group of `graph` into a stack template.
///
/// # Errors
///
/// Returns [`CompositionError::Template`] if two resources in one stack share
/// a logical id.
pub fn synthesize(graph: &DeploymentGraph) -> Result<Synthesis> {
    let ctx = &graph.context;
    let mut imports: BTreeMap<GroupKind, BTreeSet<Handle>> = BTreeMap::new();
    let mut templates: BTreeMap<GroupKind, Template> = BTreeMap::new();

    for group in graph.deploy_order() {
        let mut stack = StackBuilder::new(ctx, group, &mut imports);
        match group {
            GroupKind::Network => stack.network(&graph.network)?,
            GroupKind::Balancer => stack.balancer(&graph.balancer)?,
            GroupKind::Database => stack.database(&graph.database)?,
            GroupKind::Storage => stack.file_share(&graph.file_share)?,
            GroupKind::Application => stack.application(&graph.application)?,
        }
        templates.insert(group, stack.template);
    }

    for (group, handles) in &imports {
        let Some(template) = templates.get_mut(group) else {
            continue;
        };
        for handle in handles {
            template
                .add_output(
                    &handle.export_key(),
                    local_value(handle),
                    Some(export_name(ctx, handle)),
                )
                .map_err(CompositionError::from)?;
        }
    }

    let mut stacks = Vec::with_capacity(templates.len());
    for group in graph.deploy_order() {
        let Some(template) = templates.remove(&group) else {
            continue;
        };
        stacks.push(StackTemplate {
            name: ctx.stack_name(group),
            group,
            depends_on: group
                .dependencies()
                .iter()
                .map(|dep| ctx.stack_name(*dep))
                .collect(),
            tags: ctx.tags.clone(),
            template,
        });
    }

    let manifest = Manifest {
        application: ctx.application.clone(),
        environment: ctx.environment.clone(),
        stacks: stacks
            .iter()
            .map(|s| ManifestEntry {
                stack: s.name.clone(),
                group: s.group,
                template_file: s.file_name(),
                depends_on: s.depends_on.clone(),
            })
            .collect(),
    };
    Ok(Synthesis { stacks, manifest })
}

/// Export name under which `handle`'s owning stack publishes it.
#[must_use]
pub fn export_name(ctx: &CompositionContext, handle: &Handle) -> String {
    format!("{}-{}", ctx.stack_name(handle.group), handle.export_key())
}

fn local_value(handle: &Handle) -> Value {
    match &handle.attribute {
        None => intrinsic::reference(&handle.resource),
        Some(attr) => intrinsic::get_att(&handle.resource, attr),
    }
}

// ── Stack builder ────────────────────────────────────────────────────────────

struct StackBuilder<'a> {
    ctx: &'a CompositionContext,
    group: GroupKind,
    imports: &'a mut BTreeMap<GroupKind, BTreeSet<Handle>>,
    template: Template,
}

impl<'a> StackBuilder<'a> {
    fn new(
        ctx: &'a CompositionContext,
        group: GroupKind,
        imports: &'a mut BTreeMap<GroupKind, BTreeSet<Handle>>,
    ) -> Self {
        let description = format!(
            "{} {} resources ({})",
            ctx.application,
            group.label(),
            ctx.environment
        );
        Self {
            ctx,
            group,
            imports,
            template: Template::new(&description),
        }
    }

    /// Local reference or cross-stack import, depending on who owns `handle`.
    fn value(&mut self, handle: &Handle) -> Value {
        if handle.group == self.group {
            local_value(handle)
        } else {
            self.imports
                .entry(handle.group)
                .or_default()
                .insert(handle.clone());
            intrinsic::import_value(&export_name(self.ctx, handle))
        }
    }

    fn subnet_ids(&mut self, subnets: &[Subnet]) -> Vec<Value> {
        subnets.iter().map(|s| self.value(&s.handle())).collect()
    }

    fn add(&mut self, id: &str, resource: Resource) -> Result<()> {
        self.template
            .add_resource(id, resource)
            .map_err(CompositionError::from)?;
        Ok(())
    }

    fn rule(&mut self, rule: &AccessRule) -> Value {
        let mut v = json!({
            "IpProtocol": rule.protocol.as_str(),
            "FromPort": rule.port,
            "ToPort": rule.port,
            "Description": rule.description,
        });
        match (&rule.peer, rule.direction) {
            (Peer::AnyIpv4, _) => v["CidrIp"] = json!(ANY_IPV4),
            (Peer::Group(h), Direction::Ingress) => v["SourceSecurityGroupId"] = self.value(h),
            (Peer::Group(h), Direction::Egress) => v["DestinationSecurityGroupId"] = self.value(h),
        }
        v
    }

    fn security_group(&mut self, sg: &AccessControlGroupDescriptor) -> Result<()> {
        let vpc = self.value(&Handle::reference(GroupKind::Network, &sg.network_id));
        let mut props = json!({
            "GroupDescription": sg.description,
            "VpcId": vpc,
        });
        let ingress: Vec<Value> = sg.ingress_rules().map(|r| self.rule(r)).collect();
        if !ingress.is_empty() {
            props["SecurityGroupIngress"] = json!(ingress);
        }
        if !sg.allow_all_outbound {
            let egress: Vec<Value> = sg.egress_rules().map(|r| self.rule(r)).collect();
            props["SecurityGroupEgress"] = json!(egress);
        }
        self.add(&sg.id, Resource::new("AWS::EC2::SecurityGroup", props))
    }

    // ── Network ──────────────────────────────────────────────────────────────

    fn network(&mut self, net: &NetworkDescriptor) -> Result<()> {
        self.add(
            &net.id,
            Resource::new(
                "AWS::EC2::VPC",
                json!({
                    "CidrBlock": net.cidr.to_string(),
                    "EnableDnsHostnames": true,
                    "EnableDnsSupport": true,
                }),
            ),
        )?;
        self.add("InternetGateway", Resource::new("AWS::EC2::InternetGateway", json!({})))?;
        self.add(
            "InternetGatewayAttachment",
            Resource::new(
                "AWS::EC2::VPCGatewayAttachment",
                json!({
                    "VpcId": intrinsic::reference(&net.id),
                    "InternetGatewayId": intrinsic::reference("InternetGateway"),
                }),
            ),
        )?;

        for subnet in net.subnets(SubnetKind::Public) {
            self.subnet(net, subnet, true)?;
            self.add(
                &format!("{}DefaultRoute", subnet.id),
                Resource::new(
                    "AWS::EC2::Route",
                    json!({
                        "RouteTableId": intrinsic::reference(&format!("{}RouteTable", subnet.id)),
                        "DestinationCidrBlock": ANY_IPV4,
                        "GatewayId": intrinsic::reference("InternetGateway"),
                    }),
                )
                .depends_on("InternetGatewayAttachment"),
            )?;
        }

        for nat in &net.nat_gateways {
            let eip = format!("{}Eip", nat.id);
            self.add(
                &eip,
                Resource::new("AWS::EC2::EIP", json!({ "Domain": "vpc" }))
                    .depends_on("InternetGatewayAttachment"),
            )?;
            let public = net
                .subnets(SubnetKind::Public)
                .iter()
                .find(|s| s.az_index == nat.az_index)
                .map(|s| s.id.clone())
                .unwrap_or_default();
            self.add(
                &nat.id,
                Resource::new(
                    "AWS::EC2::NatGateway",
                    json!({
                        "AllocationId": intrinsic::get_att(&eip, "AllocationId"),
                        "SubnetId": intrinsic::reference(&public),
                    }),
                ),
            )?;
        }

        for subnet in net.subnets(SubnetKind::Private) {
            self.subnet(net, subnet, false)?;
            if let Some(nat) = net.nat_route_for(subnet.az_index) {
                let route_table = format!("{}RouteTable", subnet.id);
                self.add(
                    &format!("{}DefaultRoute", subnet.id),
                    Resource::new(
                        "AWS::EC2::Route",
                        json!({
                            "RouteTableId": intrinsic::reference(&route_table),
                            "DestinationCidrBlock": ANY_IPV4,
                            "NatGatewayId": intrinsic::reference(&nat.id),
                        }),
                    ),
                )?;
            }
        }

        self.template
            .add_output(VPC_OUTPUT, intrinsic::reference(&net.id), None)
            .map_err(CompositionError::from)?;
        Ok(())
    }

    fn subnet(&mut self, net: &NetworkDescriptor, subnet: &Subnet, public: bool) -> Result<()> {
        let table = format!("{}RouteTable", subnet.id);
        self.add(
            &subnet.id,
            Resource::new(
                "AWS::EC2::Subnet",
                json!({
                    "VpcId": intrinsic::reference(&net.id),
                    "CidrBlock": subnet.cidr.to_string(),
                    "AvailabilityZone": intrinsic::availability_zone(usize::from(subnet.az_index)),
                    "MapPublicIpOnLaunch": public,
                }),
            ),
        )?;
        self.add(
            &table,
            Resource::new(
                "AWS::EC2::RouteTable",
                json!({ "VpcId": intrinsic::reference(&net.id) }),
            ),
        )?;
        self.add(
            &format!("{}RouteTableAssociation", subnet.id),
            Resource::new(
                "AWS::EC2::SubnetRouteTableAssociation",
                json!({
                    "SubnetId": intrinsic::reference(&subnet.id),
                    "RouteTableId": intrinsic::reference(&table),
                }),
            ),
        )
    }

    // ── Load balancer ────────────────────────────────────────────────────────

    fn balancer(&mut self, lb: &LoadBalancerDescriptor) -> Result<()> {
        self.security_group(&lb.security_group)?;
        let subnets = self.subnet_ids(lb.network.subnets(lb.placement));
        let sg = self.value(&lb.security_group.handle());
        let scheme = if lb.internet_facing { "internet-facing" } else { "internal" };
        self.add(
            &lb.id,
            Resource::new(
                "AWS::ElasticLoadBalancingV2::LoadBalancer",
                json!({
                    "Type": "application",
                    "Scheme": scheme,
                    "Subnets": subnets,
                    "SecurityGroups": [sg],
                }),
            ),
        )
    }

    // ── Database ─────────────────────────────────────────────────────────────

    fn database(&mut self, db: &DatabaseDescriptor) -> Result<()> {
        self.template.transform = Some(SECRETS_TRANSFORM.to_string());
        let secret = &db.secret;
        let secret_template = json!({
            "username": secret.username,
            "dbname": secret.database_name,
        })
        .to_string();
        self.add(
            &secret.id,
            Resource::new(
                "AWS::SecretsManager::Secret",
                json!({
                    "Description": format!("{} database credentials", self.ctx.qualified_name()),
                    "GenerateSecretString": {
                        "SecretStringTemplate": secret_template,
                        "GenerateStringKey": SecretField::Password.key(),
                        "PasswordLength": 30,
                        "ExcludeCharacters": EXCLUDED_PASSWORD_CHARS,
                    },
                }),
            )
            .retain_policy(secret.removal_policy.as_str()),
        )?;

        self.security_group(&db.rotation_group)?;
        self.security_group(&db.security_group)?;

        let subnets = self.subnet_ids(db.network.subnets(db.placement));
        let subnet_group = format!("{}SubnetGroup", db.id);
        let description = format!("{} database subnets", self.ctx.qualified_name());
        self.add(
            &subnet_group,
            Resource::new(
                "AWS::RDS::DBSubnetGroup",
                json!({
                    "DBSubnetGroupDescription": description,
                    "SubnetIds": subnets,
                }),
            ),
        )?;

        let resolve = |field: SecretField| {
            intrinsic::sub(&format!(
                "{{{{resolve:secretsmanager:${{{}}}:SecretString:{}}}}}",
                secret.id,
                field.key()
            ))
        };
        let sg = self.value(&db.security_group.handle());
        self.add(
            &db.id,
            Resource::new(
                "AWS::RDS::DBInstance",
                json!({
                    "Engine": db.engine,
                    "EngineVersion": db.engine_version,
                    "DBInstanceClass": db.instance_class,
                    "AllocatedStorage": db.allocated_storage_gib.to_string(),
                    "DBName": secret.database_name,
                    "MasterUsername": resolve(SecretField::Username),
                    "MasterUserPassword": resolve(SecretField::Password),
                    "DBSubnetGroupName": intrinsic::reference(&subnet_group),
                    "VPCSecurityGroups": [sg],
                    "Port": db.port.to_string(),
                    "PubliclyAccessible": false,
                    "StorageEncrypted": true,
                }),
            )
            .retain_policy(db.removal_policy.as_str()),
        )?;

        let attachment = format!("{}Attachment", secret.id);
        self.add(
            &attachment,
            Resource::new(
                "AWS::SecretsManager::SecretTargetAttachment",
                json!({
                    "SecretId": intrinsic::reference(&secret.id),
                    "TargetId": intrinsic::reference(&db.id),
                    "TargetType": "AWS::RDS::DBInstance",
                }),
            ),
        )?;

        let rotation_sg = self.value(&db.rotation_group.handle());
        let private = self.subnet_ids(db.network.subnets(db.placement));
        self.add(
            &format!("{}Rotation", secret.id),
            Resource::new(
                "AWS::SecretsManager::RotationSchedule",
                json!({
                    "SecretId": intrinsic::reference(&attachment),
                    "HostedRotationLambda": {
                        "RotationType": ROTATION_TYPE,
                        "VpcSecurityGroupIds": rotation_sg,
                        "VpcSubnetIds": intrinsic::join(",", private),
                    },
                    "RotationRules": { "AutomaticallyAfterDays": secret.rotation_days },
                }),
            )
            .depends_on(&attachment),
        )
    }

    // ── File share ───────────────────────────────────────────────────────────

    fn file_share(&mut self, fs: &FileShareDescriptor) -> Result<()> {
        self.security_group(&fs.security_group)?;
        self.add(
            &fs.id,
            Resource::new(
                "AWS::EFS::FileSystem",
                json!({
                    "PerformanceMode": fs.performance_mode.as_str(),
                    "ThroughputMode": fs.throughput_mode.as_str(),
                    "Encrypted": fs.encrypted,
                }),
            )
            .retain_policy("Retain"),
        )?;
        let sg = self.value(&fs.security_group.handle());
        for target in &fs.mount_targets {
            let subnet = self.value(&target.subnet);
            self.add(
                &target.id,
                Resource::new(
                    "AWS::EFS::MountTarget",
                    json!({
                        "FileSystemId": intrinsic::reference(&fs.id),
                        "SubnetId": subnet,
                        "SecurityGroups": [sg.clone()],
                    }),
                ),
            )?;
        }
        Ok(())
    }

    // ── Application ──────────────────────────────────────────────────────────

    fn application(&mut self, app: &ApplicationDescriptor) -> Result<()> {
        let qualified = self.ctx.qualified_name();
        let insights = if app.cluster.container_insights { "enabled" } else { "disabled" };

        self.add(
            &app.cluster.id,
            Resource::new(
                "AWS::ECS::Cluster",
                json!({
                    "ClusterSettings": [{
                        "Name": "containerInsights",
                        "Value": insights,
                    }],
                }),
            ),
        )?;
        self.add(
            &app.log_group.id,
            Resource::new(
                "AWS::Logs::LogGroup",
                json!({ "RetentionInDays": app.log_group.retention_days }),
            ),
        )?;
        let admin_template = json!({ "username": app.admin_secret.username }).to_string();
        self.add(
            &app.admin_secret.id,
            Resource::new(
                "AWS::SecretsManager::Secret",
                json!({
                    "Description": format!("{qualified} administrator credentials"),
                    "GenerateSecretString": {
                        "SecretStringTemplate": admin_template,
                        "GenerateStringKey": SecretField::Password.key(),
                        "PasswordLength": 24,
                        "ExcludePunctuation": true,
                    },
                }),
            ),
        )?;
        self.role(&app.execution_role, "SecretAccess")?;
        self.role(&app.task_role, "ExecuteCommand")?;
        self.task_definition(app)?;

        self.security_group(&app.service.security_group)?;
        for rule in &app.group_rules {
            let group = self.value(&rule.group);
            let mut props = self.rule(&rule.rule);
            props["GroupId"] = group;
            let kind = match rule.rule.direction {
                Direction::Ingress => "AWS::EC2::SecurityGroupIngress",
                Direction::Egress => "AWS::EC2::SecurityGroupEgress",
            };
            self.add(&rule.id, Resource::new(kind, props))?;
        }

        let target = &app.listener.target;
        let hc = &target.health_check;
        let vpc = self.value(&app.network.vpc_handle());
        self.add(
            &target.id,
            Resource::new(
                "AWS::ElasticLoadBalancingV2::TargetGroup",
                json!({
                    "Port": target.port,
                    "Protocol": "HTTP",
                    "TargetType": "ip",
                    "VpcId": vpc,
                    "HealthCheckPath": hc.path,
                    "HealthCheckIntervalSeconds": hc.interval.as_secs(),
                    "HealthyThresholdCount": hc.healthy_threshold,
                    "UnhealthyThresholdCount": hc.unhealthy_threshold,
                    "Matcher": { "HttpCode": hc.success_codes },
                }),
            ),
        )?;
        let balancer = self.value(&app.balancer);
        self.add(
            &app.listener.id,
            Resource::new(
                "AWS::ElasticLoadBalancingV2::Listener",
                json!({
                    "LoadBalancerArn": balancer,
                    "Port": app.listener.port,
                    "Protocol": "HTTP",
                    "DefaultActions": [{
                        "Type": "forward",
                        "TargetGroupArn": intrinsic::reference(&target.id),
                    }],
                }),
            ),
        )?;

        let svc = &app.service;
        let subnets = self.subnet_ids(app.network.subnets(svc.placement));
        let svc_sg = self.value(&svc.security_group.handle());
        self.add(
            &svc.id,
            Resource::new(
                "AWS::ECS::Service",
                json!({
                    "Cluster": intrinsic::reference(&app.cluster.id),
                    "TaskDefinition": intrinsic::reference(&app.task.id),
                    "LaunchType": "FARGATE",
                    "PlatformVersion": svc.platform_version,
                    "DesiredCount": svc.desired_count,
                    "HealthCheckGracePeriodSeconds": svc.health_check_grace.as_secs(),
                    "EnableExecuteCommand": svc.execute_command,
                    "NetworkConfiguration": {
                        "AwsvpcConfiguration": {
                            "AssignPublicIp": "DISABLED",
                            "Subnets": subnets,
                            "SecurityGroups": [svc_sg],
                        },
                    },
                    "LoadBalancers": [{
                        "ContainerName": app.task.container.name,
                        "ContainerPort": app.task.container.port,
                        "TargetGroupArn": intrinsic::reference(&target.id),
                    }],
                }),
            )
            .depends_on(&app.listener.id),
        )?;

        let scaling = &app.scaling;
        self.add(
            SCALABLE_TARGET_ID,
            Resource::new(
                "AWS::ApplicationAutoScaling::ScalableTarget",
                json!({
                    "MinCapacity": scaling.min_replicas,
                    "MaxCapacity": scaling.max_replicas,
                    "ResourceId": intrinsic::join("/", vec![
                        json!("service"),
                        intrinsic::reference(CLUSTER_ID),
                        intrinsic::get_att(&svc.id, "Name"),
                    ]),
                    "ScalableDimension": "ecs:service:DesiredCount",
                    "ServiceNamespace": "ecs",
                }),
            ),
        )?;
        self.add(
            SCALING_POLICY_ID,
            Resource::new(
                "AWS::ApplicationAutoScaling::ScalingPolicy",
                json!({
                    "PolicyName": format!("{qualified}CpuTracking"),
                    "PolicyType": "TargetTrackingScaling",
                    "ScalingTargetId": intrinsic::reference(SCALABLE_TARGET_ID),
                    "TargetTrackingScalingPolicyConfiguration": {
                        "PredefinedMetricSpecification": {
                            "PredefinedMetricType": "ECSServiceAverageCPUUtilization",
                        },
                        "TargetValue": scaling.target_cpu_percent,
                        "ScaleInCooldown": scaling.scale_in_cooldown.as_secs(),
                        "ScaleOutCooldown": scaling.scale_out_cooldown.as_secs(),
                    },
                }),
            ),
        )?;

        let dns = self.value(&app.dns_name);
        self.template
            .add_output(DNS_OUTPUT, dns, None)
            .map_err(CompositionError::from)?;
        Ok(())
    }

    fn role(&mut self, role: &Role, policy_name: &str) -> Result<()> {
        let mut statements = Vec::with_capacity(role.statements.len());
        for statement in &role.statements {
            let resources: Vec<Value> = statement
                .resources
                .iter()
                .map(|r| match r {
                    PolicyResource::Any => json!("*"),
                    PolicyResource::Handle(h) => self.value(h),
                })
                .collect();
            statements.push(json!({
                "Effect": "Allow",
                "Action": statement.actions,
                "Resource": resources,
            }));
        }
        let mut props = json!({
            "AssumeRolePolicyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Effect": "Allow",
                    "Principal": { "Service": "ecs-tasks.amazonaws.com" },
                    "Action": "sts:AssumeRole",
                }],
            },
        });
        if !role.managed_policies.is_empty() {
            props["ManagedPolicyArns"] = json!(role.managed_policies);
        }
        if !statements.is_empty() {
            props["Policies"] = json!([{
                "PolicyName": policy_name,
                "PolicyDocument": { "Version": "2012-10-17", "Statement": statements },
            }]);
        }
        self.add(&role.id, Resource::new("AWS::IAM::Role", props))
    }

    fn task_definition(&mut self, app: &ApplicationDescriptor) -> Result<()> {
        let task = &app.task;
        let container = &task.container;

        let mut environment = Vec::with_capacity(container.environment.len());
        for (name, value) in &container.environment {
            let value = match value {
                EnvValue::Literal(s) => json!(s),
                EnvValue::Handle(h) => self.value(h),
            };
            environment.push(json!({ "Name": name, "Value": value }));
        }
        let mut secrets = Vec::with_capacity(container.secrets.len());
        for (name, secret) in &container.secrets {
            let arn = self.value(&secret.secret);
            secrets.push(json!({
                "Name": name,
                "ValueFrom": intrinsic::join("", vec![arn, json!(format!(":{}::", secret.field))]),
            }));
        }
        let share = self.value(&task.volume.share);

        self.add(
            &task.id,
            Resource::new(
                "AWS::ECS::TaskDefinition",
                json!({
                    "Family": self.ctx.qualified_name(),
                    "Cpu": task.cpu_units.to_string(),
                    "Memory": task.memory_mib.to_string(),
                    "NetworkMode": "awsvpc",
                    "RequiresCompatibilities": ["FARGATE"],
                    "ExecutionRoleArn": intrinsic::get_att(&app.execution_role.id, "Arn"),
                    "TaskRoleArn": intrinsic::get_att(&app.task_role.id, "Arn"),
                    "Volumes": [{
                        "Name": task.volume.name,
                        "EFSVolumeConfiguration": {
                            "FilesystemId": share,
                            "TransitEncryption": "ENABLED",
                        },
                    }],
                    "ContainerDefinitions": [{
                        "Name": container.name,
                        "Image": container.image,
                        "Essential": true,
                        "PortMappings": [{ "ContainerPort": container.port, "Protocol": "tcp" }],
                        "Environment": environment,
                        "Secrets": secrets,
                        "MountPoints": [{
                            "SourceVolume": container.mount.volume,
                            "ContainerPath": container.mount.container_path,
                            "ReadOnly": container.mount.read_only,
                        }],
                        "LogConfiguration": {
                            "LogDriver": "awslogs",
                            "Options": {
                                "awslogs-group": intrinsic::reference(LOG_GROUP_ID),
                                "awslogs-region": intrinsic::reference("AWS::Region"),
                                "awslogs-stream-prefix": app.log_group.stream_prefix,
                            },
                        },
                    }],
                }),
            )
            .depends_on(ADMIN_SECRET_ID),
        )
    }
}
