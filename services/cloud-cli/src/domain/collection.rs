use crate::error::Error;
use crate::error::Result;
use common::model::Scope;

/// Compute collections the CLI can mutate, with the scope level they live at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceCollection {
    Instances,
    Disks,
    Firewalls,
    Addresses,
}

impl ResourceCollection {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Instances => "instances",
            Self::Disks => "disks",
            Self::Firewalls => "firewalls",
            Self::Addresses => "addresses",
        }
    }

    pub const fn singular(self) -> &'static str {
        match self {
            Self::Instances => "instance",
            Self::Disks => "disk",
            Self::Firewalls => "firewall",
            Self::Addresses => "address",
        }
    }

    /// Resolves the scope for this collection from the `--zone`/`--region` flags.
    pub fn scope(self, zone: Option<&str>, region: Option<&str>) -> Result<Scope> {
        match self {
            Self::Instances | Self::Disks => zone
                .map(|zone| Scope::Zone(zone.to_string()))
                .ok_or_else(|| Error::Client(format!("--zone is required for {}", self.path()))),
            Self::Addresses => region
                .map(|region| Scope::Region(region.to_string()))
                .ok_or_else(|| {
                    Error::Client(format!("--region is required for {}", self.path()))
                }),
            Self::Firewalls => Ok(Scope::Global),
        }
    }
}
