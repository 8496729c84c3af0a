//! Deciding which bundle groups a run has to recompute.

use crate::ops::ELECTROSTATIC_FEATURES;
use std::collections::BTreeSet;
use std::fmt;

/// Logical groups of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Group {
    /// `V`, `F`, and `N`.
    Geometry,
    /// `X` and `feature_names`.
    Features,
    /// `Y_<name>` and `Y_<name>_classes`.
    Labels(String),
    /// The sibling adjacency artifact.
    Adjacency,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geometry => write!(f, "geometry"),
            Self::Features => write!(f, "features"),
            Self::Labels(name) => write!(f, "labels[{}]", name),
            Self::Adjacency => write!(f, "adjacency"),
        }
    }
}

/// What an existing bundle (and its adjacency artifact) already holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleState {
    pub geometry: bool,
    /// Feature column names, when a feature matrix is present.
    pub features: Option<Vec<String>>,
    pub labels: BTreeSet<String>,
    pub adjacency: bool,
}

/// What the caller wants the bundle to contain after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub features: bool,
    /// Whether the feature matrix must carry the electrostatic columns.
    pub electrostatics: bool,
    /// Classifier name to label with, if any.
    pub labels: Option<String>,
    pub adjacency: bool,
    /// Recompute requested groups even when present.
    pub refresh: bool,
}

/// Groups to recompute for one structure.
///
/// A group is recomputed when it is requested and it is either absent or a refresh is
/// forced. Geometry is always requested, and recomputing it invalidates every requested
/// vertex-indexed group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshPlan {
    pub geometry: bool,
    pub features: bool,
    pub labels: Option<String>,
    pub adjacency: bool,
}

impl RefreshPlan {
    pub fn new(request: &Request, state: &BundleState) -> Self {
        let geometry = request.refresh || !state.geometry;

        let features_complete = state.features.as_ref().is_some_and(|names| {
            !request.electrostatics
                || ELECTROSTATIC_FEATURES
                    .iter()
                    .all(|c| names.iter().any(|n| n == c))
        });
        let features = request.features && (geometry || !features_complete);

        let labels = request
            .labels
            .as_ref()
            .filter(|name| geometry || !state.labels.contains(*name))
            .cloned();

        let adjacency = request.adjacency && (geometry || !state.adjacency);

        Self {
            geometry,
            features,
            labels,
            adjacency,
        }
    }

    /// True when nothing has to be recomputed.
    pub fn is_noop(&self) -> bool {
        !self.geometry && !self.features && self.labels.is_none() && !self.adjacency
    }

    pub fn groups(&self) -> Vec<Group> {
        let mut groups = Vec::new();
        if self.geometry {
            groups.push(Group::Geometry);
        }
        if self.features {
            groups.push(Group::Features);
        }
        if let Some(name) = &self.labels {
            groups.push(Group::Labels(name.clone()));
        }
        if self.adjacency {
            groups.push(Group::Adjacency);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> Request {
        Request {
            features: true,
            electrostatics: true,
            labels: Some("DNA".to_string()),
            adjacency: true,
            refresh: false,
        }
    }

    fn full_state() -> BundleState {
        BundleState {
            geometry: true,
            features: Some(vec!["cv_fine".into(), "pot".into(), "acc".into()]),
            labels: BTreeSet::from(["DNA".to_string()]),
            adjacency: true,
        }
    }

    #[test]
    fn populated_bundle_needs_nothing() {
        let plan = RefreshPlan::new(&full_request(), &full_state());
        assert!(plan.is_noop());
        assert!(plan.groups().is_empty());
    }

    #[test]
    fn empty_bundle_needs_everything_requested() {
        let plan = RefreshPlan::new(&full_request(), &BundleState::default());
        assert_eq!(
            plan.groups(),
            vec![
                Group::Geometry,
                Group::Features,
                Group::Labels("DNA".into()),
                Group::Adjacency
            ]
        );
    }

    #[test]
    fn refresh_recomputes_only_requested_groups() {
        let request = Request {
            features: false,
            labels: None,
            refresh: true,
            ..full_request()
        };
        let plan = RefreshPlan::new(&request, &full_state());
        assert_eq!(plan.groups(), vec![Group::Geometry, Group::Adjacency]);
    }

    #[test]
    fn new_classifier_adds_only_labels() {
        let request = Request {
            labels: Some("RNA".to_string()),
            ..full_request()
        };
        let plan = RefreshPlan::new(&request, &full_state());
        assert_eq!(plan.groups(), vec![Group::Labels("RNA".into())]);
    }

    #[test]
    fn features_without_electrostatics_are_incomplete_when_required() {
        let mut state = full_state();
        state.features = Some(vec!["cv_fine".into()]);

        let plan = RefreshPlan::new(&full_request(), &state);
        assert_eq!(plan.groups(), vec![Group::Features]);

        let request = Request {
            electrostatics: false,
            ..full_request()
        };
        assert!(RefreshPlan::new(&request, &state).is_noop());
    }

    #[test]
    fn missing_geometry_invalidates_vertex_groups() {
        let mut state = full_state();
        state.geometry = false;

        let plan = RefreshPlan::new(&full_request(), &state);
        assert!(plan.geometry && plan.features && plan.adjacency);
        assert_eq!(plan.labels.as_deref(), Some("DNA"));
    }

    #[test]
    fn group_names_are_readable() {
        assert_eq!(Group::Labels("DNA".into()).to_string(), "labels[DNA]");
        assert_eq!(Group::Adjacency.to_string(), "adjacency");
    }
}
