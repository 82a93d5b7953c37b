//! Load-balancer composition and listener/health-check types.
//!
//! The balancer's access-control group is created deny-by-default with a
//! single outbound rule. Its inbound rule is attached later, exactly once,
//! by the application composer.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use stackweave_common::GroupKind;

use crate::domain::access::{
    ANY_IPV4, AccessControlGroupDescriptor, AccessRule, Direction, Peer,
};
use crate::domain::error::ConfigError;
use crate::domain::graph::CompositionContext;
use crate::domain::handle::Handle;
use crate::domain::network::{NetworkDescriptor, SubnetKind};

pub const HTTP_PORT: u16 = 80;
pub const LOAD_BALANCER_ID: &str = "LoadBalancer";
pub const LOAD_BALANCER_SG_ID: &str = "LoadBalancerSecurityGroup";

/// Desired state of the public traffic distributor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerDescriptor {
    pub id: String,
    pub network: Arc<NetworkDescriptor>,
    pub security_group: AccessControlGroupDescriptor,
    pub placement: SubnetKind,
    pub internet_facing: bool,
    pub http_port: u16,
    pub dns_name: Option<Handle>,
}

impl LoadBalancerDescriptor {
    #[must_use]
    pub fn handle(&self) -> Handle {
        Handle::reference(GroupKind::Balancer, &self.id)
    }
}

// ── Listener ─────────────────────────────────────────────────────────────────

/// Health-check policy of a listener target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub path: String,
    /// Accepted status codes, e.g. `200-299,301,302`.
    pub success_codes: String,
    pub healthy_threshold: u8,
    pub unhealthy_threshold: u8,
    #[serde(with = "secs")]
    pub interval: Duration,
}

impl HealthCheck {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for zero thresholds, a zero interval or a
    /// malformed success-code set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.healthy_threshold == 0 {
            return Err(ConfigError::HealthCheck {
                field: "healthy_threshold",
            });
        }
        if self.unhealthy_threshold == 0 {
            return Err(ConfigError::HealthCheck {
                field: "unhealthy_threshold",
            });
        }
        if self.interval.is_zero() {
            return Err(ConfigError::HealthCheck { field: "interval" });
        }
        parse_success_codes(&self.success_codes)?;
        Ok(())
    }
}

/// Parse a success-code set into inclusive ranges.
///
/// # Errors
///
/// Returns [`ConfigError::SuccessCodes`] unless every comma-separated item is
/// an HTTP status code (100–599) or an ascending range of them.
pub fn parse_success_codes(codes: &str) -> Result<Vec<(u16, u16)>, ConfigError> {
    let invalid = || ConfigError::SuccessCodes(codes.to_string());
    let code = |s: &str| -> Result<u16, ConfigError> {
        let v: u16 = s.trim().parse().map_err(|_| invalid())?;
        if (100..=599).contains(&v) {
            Ok(v)
        } else {
            Err(invalid())
        }
    };
    let mut ranges = Vec::new();
    for item in codes.split(',') {
        let range = match item.split_once('-') {
            Some((lo, hi)) => (code(lo)?, code(hi)?),
            None => {
                let v = code(item)?;
                (v, v)
            }
        };
        if range.0 > range.1 {
            return Err(invalid());
        }
        ranges.push(range);
    }
    Ok(ranges)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroup {
    pub id: String,
    pub port: u16,
    pub health_check: HealthCheck,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub id: String,
    pub port: u16,
    pub target: TargetGroup,
}

// ── Composer ─────────────────────────────────────────────────────────────────

/// Internet-facing balancer in the public subnets.
///
/// The only rule on its group is outbound TCP 80 to any address. No inbound
/// rule is emitted here.
#[must_use]
pub fn compose_load_balancer(
    ctx: &CompositionContext,
    network: &Arc<NetworkDescriptor>,
) -> LoadBalancerDescriptor {
    let security_group = AccessControlGroupDescriptor::new(
        LOAD_BALANCER_SG_ID,
        GroupKind::Balancer,
        &network.id,
        &format!("{} load balancer", ctx.qualified_name()),
    )
    .restrict_outbound()
    .with_rule(AccessRule::tcp(
        Direction::Egress,
        HTTP_PORT,
        Peer::AnyIpv4,
        &format!("Allow outbound {HTTP_PORT} to {ANY_IPV4}"),
    ));

    LoadBalancerDescriptor {
        id: LOAD_BALANCER_ID.to_string(),
        network: Arc::clone(network),
        security_group,
        placement: SubnetKind::Public,
        internet_facing: true,
        http_port: HTTP_PORT,
        dns_name: Some(Handle::attribute(
            GroupKind::Balancer,
            LOAD_BALANCER_ID,
            "DNSName",
        )),
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
