use core::fmt;

/// Where a Compute resource or operation lives inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Zone(String),
    Region(String),
}

impl Scope {
    const GLOBAL_SEGMENT: &'static str = "global";
    const ZONES_SEGMENT: &'static str = "zones";
    const REGIONS_SEGMENT: &'static str = "regions";

    /// Path segment(s) following `projects/{project}/`.
    pub fn path(&self) -> String {
        match self {
            Self::Global => Self::GLOBAL_SEGMENT.to_string(),
            Self::Zone(zone) => format!("{}/{zone}", Self::ZONES_SEGMENT),
            Self::Region(region) => format!("{}/{region}", Self::REGIONS_SEGMENT),
        }
    }

    /// Extracts the scope from a self link of the form
    /// `…/projects/{project}/{global | zones/{zone} | regions/{region}}/…`.
    pub fn from_self_link(self_link: &str) -> Option<Self> {
        let resource_path = &self_link[self_link.find("projects/")?..];
        let parts = resource_path.split('/').collect::<Vec<_>>();

        match parts.as_slice() {
            ["projects", _, Self::GLOBAL_SEGMENT, ..] => Some(Self::Global),
            ["projects", _, Self::ZONES_SEGMENT, zone, ..] if !zone.is_empty() => {
                Some(Self::Zone((*zone).to_string()))
            }
            ["projects", _, Self::REGIONS_SEGMENT, region, ..] if !region.is_empty() => {
                Some(Self::Region((*region).to_string()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
