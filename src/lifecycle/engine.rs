//! Lifecycle Engine
//!
//! Pure validation of asset state transitions. Given an asset's current state
//! and record, the engine answers which states it may move to next and whether
//! one specific move is allowed. Nothing here performs I/O or holds mutable
//! state; every call is deterministic for its inputs.
//!
//! Rejection reasons are shown to users verbatim, so their wording is part of
//! the contract.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::types::{Asset, AssetState, EdrStatus, TransitionValidation};

/// One adjacency entry as it appears in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdges {
    pub from: AssetState,
    pub to: Vec<AssetState>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Terminal state '{0}' cannot have outgoing transitions")]
    TerminalHasEdges(AssetState),
    #[error("Self-transition on '{0}' is not allowed")]
    SelfLoop(AssetState),
}

/// Adjacency table of allowed transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleGraph {
    edges: BTreeMap<AssetState, BTreeSet<AssetState>>,
}

impl Default for LifecycleGraph {
    fn default() -> Self {
        use AssetState::*;

        let table: [(AssetState, &[AssetState]); 7] = [
            (Ordered, &[Received, Lost]),
            (Received, &[InStaging, InService, InRepair, Lost, Disposed]),
            (InStaging, &[InService, InRepair, Lost, Disposed]),
            (InService, &[InStaging, InRepair, Lost, Disposed]),
            (InRepair, &[InStaging, InService, Lost, Disposed]),
            (Lost, &[InStaging, Disposed]),
            (Disposed, &[]),
        ];

        let edges = table
            .iter()
            .map(|(from, to)| (*from, to.iter().copied().collect()))
            .collect();

        Self { edges }
    }
}

impl LifecycleGraph {
    /// Build a graph from configured edges. States without an entry get no
    /// outgoing transitions.
    pub fn from_edges(entries: &[GraphEdges]) -> Result<Self, GraphError> {
        let mut edges: BTreeMap<AssetState, BTreeSet<AssetState>> = AssetState::ALL
            .iter()
            .map(|state| (*state, BTreeSet::new()))
            .collect();

        for entry in entries {
            if entry.to.is_empty() {
                continue;
            }
            if entry.from.is_terminal() {
                return Err(GraphError::TerminalHasEdges(entry.from));
            }
            if entry.to.contains(&entry.from) {
                return Err(GraphError::SelfLoop(entry.from));
            }
            edges
                .entry(entry.from)
                .or_default()
                .extend(entry.to.iter().copied());
        }

        Ok(Self { edges })
    }

    pub fn has_edge(&self, from: AssetState, to: AssetState) -> bool {
        self.edges
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    /// Targets of `from` in canonical state order
    pub fn targets(&self, from: AssetState) -> impl Iterator<Item = AssetState> + '_ {
        self.edges.get(&from).into_iter().flatten().copied()
    }

    pub fn to_edges(&self) -> Vec<GraphEdges> {
        self.edges
            .iter()
            .map(|(from, to)| GraphEdges {
                from: *from,
                to: to.iter().copied().collect(),
            })
            .collect()
    }
}

/// Validates transitions against a [`LifecycleGraph`] and the asset's context
#[derive(Debug, Clone, Default)]
pub struct LifecycleEngine {
    graph: LifecycleGraph,
}

impl LifecycleEngine {
    pub fn new(graph: LifecycleGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &LifecycleGraph {
        &self.graph
    }

    /// States reachable from `current` for this asset, in canonical order.
    ///
    /// Always equal to the set of `to` for which [`Self::is_valid_transition`]
    /// reports valid.
    pub fn get_valid_next_states(&self, current: AssetState, asset: &Asset) -> Vec<AssetState> {
        AssetState::ALL
            .iter()
            .copied()
            .filter(|to| self.is_valid_transition(current, *to, asset).valid)
            .collect()
    }

    /// Validate one candidate edge. Never fails; rejections carry a reason.
    pub fn is_valid_transition(
        &self,
        from: AssetState,
        to: AssetState,
        asset: &Asset,
    ) -> TransitionValidation {
        if from.is_terminal() {
            return TransitionValidation::rejected(format!(
                "'{from}' is a terminal state; no further transitions are permitted"
            ));
        }

        if from == to {
            return TransitionValidation::rejected(format!("Asset is already in state '{from}'"));
        }

        if !self.graph.has_edge(from, to) {
            return TransitionValidation::rejected(format!(
                "Transition from '{from}' to '{to}' is not allowed"
            ));
        }

        if let Some(reason) = contextual_rejection(to, asset) {
            return TransitionValidation::rejected(reason);
        }

        TransitionValidation::allowed()
    }
}

/// Rules that depend on the asset record rather than the graph
fn contextual_rejection(to: AssetState, asset: &Asset) -> Option<String> {
    match to {
        AssetState::InService if asset.security.edr_status == EdrStatus::NonCompliant => Some(
            format!("Asset cannot enter '{to}' while EDR status is non-compliant"),
        ),
        _ => None,
    }
}

static DEFAULT_ENGINE: std::sync::LazyLock<LifecycleEngine> =
    std::sync::LazyLock::new(LifecycleEngine::default);

/// [`LifecycleEngine::get_valid_next_states`] on the default graph
pub fn get_valid_next_states(current: AssetState, asset: &Asset) -> Vec<AssetState> {
    DEFAULT_ENGINE.get_valid_next_states(current, asset)
}

/// [`LifecycleEngine::is_valid_transition`] on the default graph
pub fn is_valid_transition(from: AssetState, to: AssetState, asset: &Asset) -> TransitionValidation {
    DEFAULT_ENGINE.is_valid_transition(from, to, asset)
}
