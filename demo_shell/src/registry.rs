//! Scene registry.
//!
//! A static table from route key to scene constructor, filled once at
//! startup. Iteration order is registration order, which is also the order
//! of the navigation strip.

use std::fmt;

use crate::{
    nav::normalize,
    scene::{Scene, SceneContext},
};

/// Builds a scene into the context it is handed.
pub type SceneConstructor = Box<dyn Fn(&mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>>>;

/// A registered route.
pub struct Route {
    key: String,
    label: String,
    constructor: SceneConstructor,
}

impl Route {
    /// Normalized key; empty for the root route.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Link label shown in the navigation strip.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> String {
        format!("/{}", self.key)
    }

    pub fn constructor(&self) -> &SceneConstructor {
        &self.constructor
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("key", &self.key)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Startup-time registry errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The key was already registered.
    Duplicate(String),
    /// No constructor for the root route.
    MissingRoot,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Duplicate(key) => write!(f, "route '/{key}' registered twice"),
            RegistryError::MissingRoot => write!(f, "no scene registered for the root route '/'"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Lookup of a key nothing was registered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteNotFound(pub String);

impl fmt::Display for RouteNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no route registered for '/{}'", self.0)
    }
}

impl std::error::Error for RouteNotFound {}

/// Route key to scene constructor.
#[derive(Default)]
pub struct SceneRegistry {
    routes: Vec<Route>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ten example rooms.
    pub fn demos() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        crate::scenes::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Registers `constructor` under `key` (normalized).
    pub fn register<F>(&mut self, key: &str, label: &str, constructor: F) -> Result<(), RegistryError>
    where
        F: Fn(&mut SceneContext<'_>) -> anyhow::Result<Box<dyn Scene>> + 'static,
    {
        let key = normalize(key);
        if self.position(&key).is_some() {
            return Err(RegistryError::Duplicate(key));
        }
        self.routes.push(Route {
            key,
            label: label.to_string(),
            constructor: Box::new(constructor),
        });
        Ok(())
    }

    pub fn lookup(&self, key: &str) -> Result<&SceneConstructor, RouteNotFound> {
        self.route(key)
            .map(Route::constructor)
            .ok_or_else(|| RouteNotFound(normalize(key)))
    }

    pub fn route(&self, key: &str) -> Option<&Route> {
        let key = normalize(key);
        self.position(&key).map(|i| &self.routes[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.route(key).is_some()
    }

    pub fn has_root(&self) -> bool {
        self.position("").is_some()
    }

    /// Routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.routes.iter().map(Route::key).collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.routes.iter().position(|r| r.key == key)
    }
}

impl fmt::Debug for SceneRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.routes.iter()).finish()
    }
}
