//! Access-control groups, their rules, and the derived cross-resource policy.
//!
//! Groups are deny-by-default: only the listed rules are allowed. The
//! [`AccessPolicy`] is never stored on its own; it is derived by the
//! application composer and materialized into [`GroupRule`]s.

use std::fmt;

use serde::Serialize;
use stackweave_common::GroupKind;

use crate::domain::handle::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
        }
    }
}

/// The other side of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Peer {
    AnyIpv4,
    Group(Handle),
}

pub const ANY_IPV4: &str = "0.0.0.0/0";

/// One allow rule. Ports are `u16`, so every rule is within 0..=65535.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AccessRule {
    pub direction: Direction,
    pub protocol: Protocol,
    pub port: u16,
    pub peer: Peer,
    pub description: String,
}

impl AccessRule {
    #[must_use]
    pub fn tcp(direction: Direction, port: u16, peer: Peer, description: &str) -> Self {
        Self {
            direction,
            protocol: Protocol::Tcp,
            port,
            peer,
            description: description.to_string(),
        }
    }
}

/// A named set of allow rules attached to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessControlGroupDescriptor {
    pub id: String,
    pub owner: GroupKind,
    pub network_id: String,
    pub description: String,
    /// When false, outbound traffic is limited to the explicit egress rules.
    pub allow_all_outbound: bool,
    pub rules: Vec<AccessRule>,
}

impl AccessControlGroupDescriptor {
    #[must_use]
    pub fn new(id: &str, owner: GroupKind, network_id: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            owner,
            network_id: network_id.to_string(),
            description: description.to_string(),
            allow_all_outbound: true,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn restrict_outbound(mut self) -> Self {
        self.allow_all_outbound = false;
        self
    }

    #[must_use]
    pub fn with_rule(mut self, rule: AccessRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn ingress_rules(&self) -> impl Iterator<Item = &AccessRule> {
        self.rules.iter().filter(|r| r.direction == Direction::Ingress)
    }

    pub fn egress_rules(&self) -> impl Iterator<Item = &AccessRule> {
        self.rules.iter().filter(|r| r.direction == Direction::Egress)
    }

    /// Handle to the group's identifier, used as a rule peer or owner.
    #[must_use]
    pub fn handle(&self) -> Handle {
        Handle::attribute(self.owner, &self.id, "GroupId")
    }
}

// ── Policy ───────────────────────────────────────────────────────────────────

/// Parties of the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessNode {
    LoadBalancer,
    Service,
    Database,
    FileShare,
}

impl fmt::Display for AccessNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessNode::LoadBalancer => "load-balancer",
            AccessNode::Service => "service",
            AccessNode::Database => "database",
            AccessNode::FileShare => "file-share",
        };
        f.write_str(s)
    }
}

/// A directed permission: `from` may open connections to `to` on `port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AccessEdge {
    pub from: AccessNode,
    pub to: AccessNode,
    pub port: u16,
}

impl fmt::Display for AccessEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}:{}", self.from, self.to, self.port)
    }
}

/// The cross-resource permissions the deployed application needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPolicy {
    edges: Vec<AccessEdge>,
}

/// A rule attached to a group owned by another composition group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRule {
    /// Logical id of the standalone rule resource.
    pub id: String,
    pub group: Handle,
    pub rule: AccessRule,
}

impl AccessPolicy {
    /// The fixed three-edge policy of the application topology.
    #[must_use]
    pub fn for_application(database_port: u16, share_port: u16, service_port: u16) -> Self {
        Self {
            edges: vec![
                AccessEdge {
                    from: AccessNode::Service,
                    to: AccessNode::Database,
                    port: database_port,
                },
                AccessEdge {
                    from: AccessNode::Service,
                    to: AccessNode::FileShare,
                    port: share_port,
                },
                AccessEdge {
                    from: AccessNode::LoadBalancer,
                    to: AccessNode::Service,
                    port: service_port,
                },
            ],
        }
    }

    #[must_use]
    pub fn edges(&self) -> &[AccessEdge] {
        &self.edges
    }

    /// Turn every edge into an ingress rule on the target's group, plus an
    /// egress rule on the source's group when that group restricts outbound.
    ///
    /// `group_of` maps a node to its access-control group.
    #[must_use]
    pub fn materialize<'a>(
        &self,
        group_of: impl Fn(AccessNode) -> &'a AccessControlGroupDescriptor,
    ) -> Vec<GroupRule> {
        let mut rules = Vec::new();
        for edge in &self.edges {
            let from = group_of(edge.from);
            let to = group_of(edge.to);
            let description = format!("{edge}");
            rules.push(GroupRule {
                id: format!("{}From{}{}", to.id, from.id, edge.port),
                group: to.handle(),
                rule: AccessRule::tcp(
                    Direction::Ingress,
                    edge.port,
                    Peer::Group(from.handle()),
                    &description,
                ),
            });
            if !from.allow_all_outbound {
                rules.push(GroupRule {
                    id: format!("{}To{}{}", from.id, to.id, edge.port),
                    group: from.handle(),
                    rule: AccessRule::tcp(
                        Direction::Egress,
                        edge.port,
                        Peer::Group(to.handle()),
                        &description,
                    ),
                });
            }
        }
        rules
    }
}
