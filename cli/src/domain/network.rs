//! Network composition: address plan, subnet groups and NAT routing.
//!
//! Pure functions only: no I/O and no async.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use stackweave_common::GroupKind;

use crate::domain::error::ConfigError;
use crate::domain::handle::Handle;

pub const MIN_SUBNET_MASK: u8 = 16;
pub const MAX_SUBNET_MASK: u8 = 28;
pub const MAX_ZONES: u8 = 6;

pub const VPC_ID: &str = "Vpc";

// ── Parameters ───────────────────────────────────────────────────────────────

/// Network section of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Address range of the whole network.
    pub cidr: String,
    /// Number of availability zones to spread subnets across.
    pub az_count: u8,
    pub public_mask: u8,
    pub private_mask: u8,
    /// Outbound gateways shared by the private subnets.
    pub nat_gateways: u8,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            cidr: "10.0.0.0/16".to_string(),
            az_count: 2,
            public_mask: 24,
            private_mask: 24,
            nat_gateways: 2,
        }
    }
}

// ── Address blocks ───────────────────────────────────────────────────────────

/// An IPv4 block with its host bits cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv4Block {
    base: u32,
    prefix: u8,
}

impl Ipv4Block {
    /// Parse `a.b.c.d/prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCidr`] for malformed input or when host
    /// bits are set.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidCidr(s.to_string());
        let (addr, prefix) = s.split_once('/').ok_or_else(invalid)?;
        let prefix = decimal(prefix).ok_or_else(invalid)?;
        if prefix > 32 {
            return Err(invalid());
        }
        let octets: Vec<&str> = addr.split('.').collect();
        if octets.len() != 4 {
            return Err(invalid());
        }
        let mut base: u32 = 0;
        for octet in octets {
            let v = decimal(octet).ok_or_else(invalid)?;
            base = (base << 8) | u32::from(v);
        }
        let block = Self { base, prefix };
        if base & !block.netmask() != 0 {
            return Err(invalid());
        }
        Ok(block)
    }

    #[must_use]
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    fn netmask(&self) -> u32 {
        if self.prefix == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(self.prefix))
        }
    }

    /// Number of addresses in the block.
    fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix))
    }

    fn end(&self) -> u64 {
        u64::from(self.base) + self.size()
    }

    /// True when `other` lies entirely inside this block.
    #[must_use]
    pub fn contains(&self, other: &Ipv4Block) -> bool {
        other.base >= self.base && other.end() <= self.end()
    }

    #[must_use]
    pub fn overlaps(&self, other: &Ipv4Block) -> bool {
        u64::from(self.base) < other.end() && u64::from(other.base) < self.end()
    }
}

/// Plain ASCII decimal; `str::parse` alone would also take a leading `+`.
fn decimal(part: &str) -> Option<u8> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for Ipv4Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.base.to_be_bytes();
        write!(f, "{}.{}.{}.{}/{}", b[0], b[1], b[2], b[3], self.prefix)
    }
}

// ── Descriptor ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetKind {
    Public,
    Private,
}

impl SubnetKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SubnetKind::Public => "Public",
            SubnetKind::Private => "Private",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subnet {
    pub id: String,
    pub kind: SubnetKind,
    pub az_index: u8,
    pub cidr: Ipv4Block,
}

impl Subnet {
    #[must_use]
    pub fn handle(&self) -> Handle {
        Handle::reference(GroupKind::Network, &self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetGroup {
    pub kind: SubnetKind,
    pub mask: u8,
    pub subnets: Vec<Subnet>,
}

/// An outbound gateway placed in the public subnet of its zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatGateway {
    pub id: String,
    pub az_index: u8,
}

/// Desired state of the isolated network all other groups live in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDescriptor {
    pub id: String,
    pub cidr: Ipv4Block,
    pub az_count: u8,
    pub public: SubnetGroup,
    pub private: SubnetGroup,
    pub nat_gateways: Vec<NatGateway>,
}

impl NetworkDescriptor {
    #[must_use]
    pub fn subnets(&self, kind: SubnetKind) -> &[Subnet] {
        match kind {
            SubnetKind::Public => &self.public.subnets,
            SubnetKind::Private => &self.private.subnets,
        }
    }

    /// The gateway a private subnet in zone `az_index` egresses through.
    ///
    /// Zones share gateways round-robin when there are fewer gateways than zones.
    #[must_use]
    pub fn nat_route_for(&self, az_index: u8) -> Option<&NatGateway> {
        if self.nat_gateways.is_empty() {
            return None;
        }
        let idx = usize::from(az_index) % self.nat_gateways.len();
        self.nat_gateways.get(idx)
    }

    #[must_use]
    pub fn vpc_handle(&self) -> Handle {
        Handle::reference(GroupKind::Network, &self.id)
    }
}

// ── Composer ─────────────────────────────────────────────────────────────────

/// Validate network parameters and lay out the address plan.
///
/// Public subnets are allocated first (one per zone), then private subnets,
/// each aligned to its own mask inside the network range.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the gateway count exceeds the zone count,
/// a mask is outside /16../28 or wider than the network, or the plan does not
/// fit in the network range.
pub fn compose_network(params: &NetworkParams) -> Result<NetworkDescriptor> {
    let cidr = Ipv4Block::parse(&params.cidr)?;

    if params.az_count == 0 || params.az_count > MAX_ZONES {
        return Err(ConfigError::ZoneCount {
            got: params.az_count,
            max: MAX_ZONES,
        }
        .into());
    }
    if params.nat_gateways > params.az_count {
        return Err(ConfigError::TooManyGateways {
            gateways: params.nat_gateways,
            zones: params.az_count,
        }
        .into());
    }
    if params.nat_gateways == 0 {
        return Err(ConfigError::NoGateways.into());
    }
    for (which, mask) in [("public", params.public_mask), ("private", params.private_mask)] {
        if !(MIN_SUBNET_MASK..=MAX_SUBNET_MASK).contains(&mask) {
            return Err(ConfigError::MaskOutOfRange { which, mask }.into());
        }
        if mask < cidr.prefix() {
            return Err(ConfigError::MaskWiderThanNetwork {
                which,
                mask,
                network: cidr.prefix(),
            }
            .into());
        }
    }

    let mut cursor = u64::from(cidr.base);
    let public = allocate_group(
        &cidr,
        SubnetKind::Public,
        params.public_mask,
        params.az_count,
        &mut cursor,
    )?;
    let private = allocate_group(
        &cidr,
        SubnetKind::Private,
        params.private_mask,
        params.az_count,
        &mut cursor,
    )?;
    check_disjoint(public.subnets.iter().chain(&private.subnets))?;

    let nat_gateways = (0..params.nat_gateways)
        .map(|i| NatGateway {
            id: format!("NatGateway{}", i + 1),
            az_index: i,
        })
        .collect();

    Ok(NetworkDescriptor {
        id: VPC_ID.to_string(),
        cidr,
        az_count: params.az_count,
        public,
        private,
        nat_gateways,
    })
}

fn allocate_group(
    network: &Ipv4Block,
    kind: SubnetKind,
    mask: u8,
    zones: u8,
    cursor: &mut u64,
) -> Result<SubnetGroup, ConfigError> {
    let size = 1u64 << (32 - u32::from(mask));
    let mut subnets = Vec::with_capacity(usize::from(zones));
    for az_index in 0..zones {
        let start = cursor.div_ceil(size) * size;
        if start + size > network.end() {
            return Err(ConfigError::AddressSpaceExhausted {
                network: network.to_string(),
                subnet: format!("/{mask}"),
            });
        }
        let base = u32::try_from(start).map_err(|_| ConfigError::AddressSpaceExhausted {
            network: network.to_string(),
            subnet: format!("/{mask}"),
        })?;
        *cursor = start + size;
        subnets.push(Subnet {
            id: format!("{}Subnet{}", kind.label(), az_index + 1),
            kind,
            az_index,
            cidr: Ipv4Block { base, prefix: mask },
        });
    }
    Ok(SubnetGroup { kind, mask, subnets })
}

fn check_disjoint<'a>(subnets: impl Iterator<Item = &'a Subnet>) -> Result<(), ConfigError> {
    let all: Vec<&Subnet> = subnets.collect();
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            if a.cidr.overlaps(&b.cidr) {
                return Err(ConfigError::OverlappingRanges {
                    a: a.cidr.to_string(),
                    b: b.cidr.to_string(),
                });
            }
        }
    }
    Ok(())
}
