//! Entity/component scene graph (minimal ECS).
//!
//! This is a deliberately small ECS holding the renderable scene graph. It is
//! not archetype-based; instead it uses typed component storages keyed by
//! entity id. Hierarchy is expressed with a [`Parent`] component and world
//! transforms are resolved by walking the parent chain.

use std::{
    any::{Any, TypeId},
    collections::{BTreeMap, HashMap},
};

use serde::{Deserialize, Serialize};

use crate::math::Transform;

/// Opaque entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Links a scene-graph node to its parent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub EntityId);

/// Human-readable node name, used in logs and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

/// Deepest parent chain followed when resolving world transforms.
const MAX_HIERARCHY_DEPTH: usize = 64;

trait Storage: Any {
    fn remove_entity(&mut self, entity: EntityId) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> Storage for BTreeMap<EntityId, T> {
    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.remove(&entity).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Simple world that can store typed components.
#[derive(Default)]
pub struct World {
    next_id: u64,
    alive: BTreeMap<EntityId, ()>,
    storages: HashMap<TypeId, Box<dyn Storage>>,
}

impl World {
    /// Creates a new entity.
    pub fn spawn(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.alive.insert(id, ());
        id
    }

    /// Removes an entity and all of its components.
    ///
    /// Children are not despawned; their [`Parent`] link dangles and they are
    /// treated as roots from then on.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if self.alive.remove(&entity).is_none() {
            return false;
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        true
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.alive.contains_key(&entity)
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    /// Inserts/replaces a component for an entity.
    pub fn insert<T: 'static>(&mut self, entity: EntityId, component: T) {
        debug_assert!(self.contains(entity), "insert on dead entity {entity:?}");
        let storage = self
            .storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(BTreeMap::<EntityId, T>::new()));

        let storage = storage
            .as_any_mut()
            .downcast_mut::<BTreeMap<EntityId, T>>()
            .expect("storage type mismatch");

        storage.insert(entity, component);
    }

    /// Removes a single component from an entity.
    pub fn remove<T: 'static>(&mut self, entity: EntityId) -> Option<T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<BTreeMap<EntityId, T>>())
            .and_then(|storage| storage.remove(&entity))
    }

    /// Gets a component reference.
    pub fn get<T: 'static>(&self, entity: EntityId) -> Option<&T> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<BTreeMap<EntityId, T>>())
            .and_then(|storage| storage.get(&entity))
    }

    /// Gets a mutable component reference.
    pub fn get_mut<T: 'static>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<BTreeMap<EntityId, T>>())
            .and_then(|storage| storage.get_mut(&entity))
    }

    /// Iterates entities with a given component, in entity id order.
    pub fn iter<T: 'static>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any().downcast_ref::<BTreeMap<EntityId, T>>())
            .into_iter()
            .flat_map(|storage| storage.iter().map(|(k, v)| (*k, v)))
    }

    /// Iterates mutable components of a given type, in entity id order.
    pub fn iter_mut<T: 'static>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.as_any_mut().downcast_mut::<BTreeMap<EntityId, T>>())
            .into_iter()
            .flat_map(|storage| storage.iter_mut().map(|(k, v)| (*k, v)))
    }

    /// Resolves the world transform of `entity` by composing its parent chain.
    ///
    /// Entities without a [`Transform`] contribute the identity.
    pub fn global_transform(&self, entity: EntityId) -> Transform {
        let mut chain = Vec::new();
        let mut cursor = Some(entity);
        while let Some(current) = cursor {
            if chain.len() >= MAX_HIERARCHY_DEPTH || !self.contains(current) {
                break;
            }
            chain.push(current);
            cursor = self.get::<Parent>(current).map(|p| p.0);
        }

        chain.iter().rev().fold(Transform::IDENTITY, |acc, id| {
            let local = self.get::<Transform>(*id).copied().unwrap_or_default();
            acc.compose(&local)
        })
    }

    /// Direct children of `entity`, in entity id order.
    pub fn children(&self, entity: EntityId) -> Vec<EntityId> {
        self.iter::<Parent>()
            .filter(|(_, parent)| parent.0 == entity)
            .map(|(id, _)| id)
            .collect()
    }
}
