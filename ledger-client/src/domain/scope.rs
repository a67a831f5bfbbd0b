use serde::{Serialize, Serializer};
use std::fmt;

/// Sentinel selecting every datacenter at once.
pub const ALL_DATACENTERS: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatacenterFilter {
    All,
    Named(String),
}

impl DatacenterFilter {
    pub fn matches(&self, datacenter: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => name == datacenter,
        }
    }
}

impl From<&str> for DatacenterFilter {
    fn from(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == ALL_DATACENTERS {
            Self::All
        } else {
            Self::Named(trimmed.to_string())
        }
    }
}

impl fmt::Display for DatacenterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_DATACENTERS),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl Serialize for DatacenterFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
