//! Graph configuration and graph-level properties.
//!
//! `GraphProperties` travel with the graph (they are part of every
//! serialized snapshot). The rest of `GraphConfig` tunes how the island
//! manager reacts to mutations and is never serialized with the graph.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::types::IslandOperations;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config JSON could not be parsed.
    #[error("Invalid graph config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Graph-level properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphProperties {
    /// Maintain islands automatically as edges are added.
    ///
    /// A vertex that never had an edge is never given an island; islands
    /// only appear once a vertex is edged (or through explicit creation).
    pub generate_islands: bool,
}

impl Default for GraphProperties {
    fn default() -> Self {
        Self { generate_islands: true }
    }
}

/// Which component keeps the original island handle when an island splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitSurvivor {
    /// The component with the most vertices; ties go to the first visited.
    Largest,
    /// The component containing the island's lowest vertex index.
    FirstVisited,
}

impl Default for SplitSurvivor {
    fn default() -> Self {
        Self::Largest
    }
}

/// Configuration for a [`Graph`](crate::Graph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Graph-level properties.
    pub properties: GraphProperties,
    /// Run the remove-or-split check right after an edge or vertex removal.
    ///
    /// When `false`, islands keep their membership until
    /// `refresh_island_connectivity` or `refresh_all_islands` runs.
    pub split_on_removal: bool,
    /// Survivor rule for splits.
    pub split_survivor: SplitSurvivor,
    /// Operations granted to newly created islands.
    pub default_island_operations: IslandOperations,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            properties: GraphProperties::default(),
            split_on_removal: true,
            split_survivor: SplitSurvivor::default(),
            default_island_operations: IslandOperations::ALL,
        }
    }
}

impl GraphConfig {
    /// Config with island generation disabled.
    pub fn without_islands() -> Self {
        Self {
            properties: GraphProperties { generate_islands: false },
            ..Self::default()
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Deterministic hash of the config, for logging which config a graph ran with.
    pub fn fingerprint(&self) -> String {
        canonical_hash_hex(self)
    }
}
