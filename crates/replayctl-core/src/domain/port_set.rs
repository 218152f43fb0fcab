//! The fixed set of TCP ports the replayer binds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered, de-duplicated set of TCP ports (inbound + outbound).
///
/// Order is preserved from construction so diagnostics list ports the way
/// they were configured. Resolution results never depend on the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortSet(Vec<u16>);

impl PortSet {
    /// Build a port set, dropping duplicates but keeping first-seen order.
    pub fn new(ports: impl IntoIterator<Item = u16>) -> Self {
        let mut unique = Vec::new();
        for port in ports {
            if !unique.contains(&port) {
                unique.push(port);
            }
        }
        Self(unique)
    }

    /// Port set for a replayer with one inbound and one outbound listener.
    pub fn inbound_outbound(inbound: u16, outbound: u16) -> Self {
        Self::new([inbound, outbound])
    }

    pub fn ports(&self) -> &[u16] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PortSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "[{joined}]")
    }
}

impl FromIterator<u16> for PortSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self::new(iter)
    }
}
