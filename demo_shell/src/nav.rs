//! Navigation state.
//!
//! Route keys are the path with surrounding slashes removed, so `/joints`,
//! `joints` and `joints/` all name the same route and the root is the empty
//! key.

use std::fmt;

use demo_shared::ui::NavItem;

use crate::registry::SceneRegistry;

/// Canonical route key for a path.
pub fn normalize(path: &str) -> String {
    let path = path.trim();
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// The current navigation target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Location {
    key: String,
}

impl Location {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> Self {
        Self {
            key: normalize(path),
        }
    }

    /// Normalized route key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display path, always starting with `/`.
    pub fn path(&self) -> String {
        format!("/{}", self.key)
    }

    pub fn is_root(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.key)
    }
}

/// One link per registered route, in registration order.
#[derive(Debug, Clone, Default)]
pub struct NavStrip {
    links: Vec<(String, String)>,
}

impl NavStrip {
    pub fn from_registry(registry: &SceneRegistry) -> Self {
        Self {
            links: registry
                .iter()
                .map(|route| (route.label().to_string(), route.key().to_string()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links as drawn for `current`; at most one is active.
    pub fn items(&self, current: &Location) -> Vec<NavItem> {
        self.links
            .iter()
            .map(|(label, key)| NavItem {
                label: label.clone(),
                path: format!("/{key}"),
                active: key == current.key(),
            })
            .collect()
    }
}
