//! Generation-tracked registry of star systems

use super::components::{
    distance_to_sol, Categories, EntityKind, Pickability, Position, SystemInfo, SystemRecord,
    SystemSnapshot,
};
use crate::scene::MaterialRole;
use glam::DVec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

/// Handle to a registered entity, valid only for the generation it was issued in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemRef {
    generation: u64,
    entity: Entity,
}

impl SystemRef {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }
}

/// How a disabled category affects the systems tagged with it
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// Filtered systems disappear and cannot be picked
    #[default]
    Hide,
    /// Filtered systems stay drawn in the disabled material but cannot be picked
    Recolor,
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("system '{name}' at {position} is registered twice in generation {generation}")]
    DuplicateEntity {
        name: String,
        position: DVec3,
        generation: u64,
    },
}

/// Name plus bit pattern of the coordinates
type SystemKey = (String, [u64; 3]);

fn system_key(name: &str, position: DVec3) -> SystemKey {
    (
        name.to_string(),
        [
            position.x.to_bits(),
            position.y.to_bits(),
            position.z.to_bits(),
        ],
    )
}

/// Set the filter flag under `policy` and return the material to draw with
fn apply_filter(
    policy: CategoryPolicy,
    filtered: bool,
    pickability: &mut Pickability,
) -> MaterialRole {
    pickability.filtered = filtered;
    match policy {
        CategoryPolicy::Hide => {
            pickability.visible = !filtered;
            MaterialRole::Default
        }
        CategoryPolicy::Recolor => {
            pickability.visible = true;
            if filtered {
                MaterialRole::DisabledCategory
            } else {
                MaterialRole::Default
            }
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Owns every system of the current data set
pub struct SystemRegistry {
    world: hecs::World,
    /// Insertion order, used for lookups and next/previous stepping
    order: Vec<Entity>,
    keys: HashMap<SystemKey, Entity>,
    generation: u64,
    policy: CategoryPolicy,
    disabled_categories: HashSet<String>,
}

impl Default for SystemRegistry {
    fn default() -> Self {
        Self::new(CategoryPolicy::default())
    }
}

impl SystemRegistry {
    pub fn new(policy: CategoryPolicy) -> Self {
        Self {
            world: hecs::World::new(),
            order: Vec::new(),
            keys: HashMap::new(),
            generation: 0,
            policy,
            disabled_categories: HashSet::new(),
        }
    }

    /// Current generation; bumped by every [`replace_all`](Self::replace_all)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of entities, decorations included
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn policy(&self) -> CategoryPolicy {
        self.policy
    }

    /// Switch the category policy and re-apply current filters under it
    pub fn set_policy(&mut self, policy: CategoryPolicy) {
        if self.policy == policy {
            return;
        }
        self.policy = policy;
        self.refresh_filters(None);
    }

    /// Insert a single system into the current generation
    pub fn register(&mut self, record: SystemRecord) -> Result<SystemRef, RegistryError> {
        let key = system_key(&record.name, record.position);
        if self.keys.contains_key(&key) {
            return Err(RegistryError::DuplicateEntity {
                name: record.name,
                position: record.position,
                generation: self.generation,
            });
        }
        let entity = self.spawn_system(record);
        self.keys.insert(key, entity);
        Ok(self.reference(entity))
    }

    /// Swap the whole system set for `records`
    ///
    /// The batch is checked for identity collisions before anything changes,
    /// so a failed call leaves the previous set and generation untouched.
    pub fn replace_all<I>(&mut self, records: I) -> Result<u64, RegistryError>
    where
        I: IntoIterator<Item = SystemRecord>,
    {
        let records: Vec<SystemRecord> = records.into_iter().collect();
        let next_generation = self.generation + 1;

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(system_key(&record.name, record.position)) {
                return Err(RegistryError::DuplicateEntity {
                    name: record.name.clone(),
                    position: record.position,
                    generation: next_generation,
                });
            }
        }

        self.world.clear();
        self.order.clear();
        self.keys.clear();
        self.generation = next_generation;

        for record in records {
            let key = system_key(&record.name, record.position);
            let entity = self.spawn_system(record);
            self.keys.insert(key, entity);
        }

        info!(
            generation = self.generation,
            systems = self.order.len(),
            "Replaced system set"
        );
        Ok(self.generation)
    }

    /// Add a non-pickable marker (e.g. the galaxy center)
    pub fn add_decoration(&mut self, name: impl Into<String>, position: DVec3) -> SystemRef {
        let entity = self.world.spawn((
            SystemInfo {
                name: name.into(),
                description: None,
            },
            Position(position),
            Categories::default(),
            EntityKind::Decoration,
            Pickability::default(),
            MaterialRole::Default,
        ));
        self.order.push(entity);
        self.reference(entity)
    }

    fn spawn_system(&mut self, record: SystemRecord) -> Entity {
        let categories = Categories(record.categories);
        let filtered = categories
            .0
            .iter()
            .any(|c| self.disabled_categories.contains(c));
        let mut pickability = Pickability::default();
        let material = apply_filter(self.policy, filtered, &mut pickability);

        let entity = self.world.spawn((
            SystemInfo {
                name: record.name,
                description: record.description,
            },
            Position(record.position),
            categories,
            EntityKind::System,
            pickability,
            material,
        ));
        self.order.push(entity);
        entity
    }

    fn reference(&self, entity: Entity) -> SystemRef {
        SystemRef {
            generation: self.generation,
            entity,
        }
    }

    /// True if the reference belongs to the current generation and still exists
    pub fn contains(&self, system: SystemRef) -> bool {
        system.generation == self.generation && self.world.contains(system.entity)
    }

    /// Owned snapshot of an entity, `None` for stale references
    pub fn get(&self, system: SystemRef) -> Option<SystemSnapshot> {
        if !self.contains(system) {
            return None;
        }
        let info = self.world.get::<&SystemInfo>(system.entity).ok()?;
        let position = self.world.get::<&Position>(system.entity).ok()?;
        let categories = self.world.get::<&Categories>(system.entity).ok()?;
        let kind = self.world.get::<&EntityKind>(system.entity).ok()?;
        Some(SystemSnapshot {
            system,
            name: info.name.clone(),
            description: info.description.clone(),
            position: position.0,
            categories: categories.0.clone(),
            kind: *kind,
            distance_to_sol: distance_to_sol(position.0),
        })
    }

    pub fn position(&self, system: SystemRef) -> Option<DVec3> {
        if !self.contains(system) {
            return None;
        }
        self.world
            .get::<&Position>(system.entity)
            .ok()
            .map(|p| p.0)
    }

    pub fn pickability(&self, system: SystemRef) -> Option<Pickability> {
        if !self.contains(system) {
            return None;
        }
        self.world
            .get::<&Pickability>(system.entity)
            .ok()
            .map(|p| *p)
    }

    pub fn material(&self, system: SystemRef) -> Option<MaterialRole> {
        if !self.contains(system) {
            return None;
        }
        self.world
            .get::<&MaterialRole>(system.entity)
            .ok()
            .map(|m| *m)
    }

    /// Current-generation system that is pickable and visible
    pub fn is_pickable(&self, system: SystemRef) -> bool {
        if !self.contains(system) {
            return false;
        }
        let Ok(mut query) = self
            .world
            .query_one::<(&EntityKind, &Pickability)>(system.entity)
        else {
            return false;
        };
        matches!(query.get(), Some((EntityKind::System, p)) if p.is_candidate())
    }

    /// Visit every pickable, visible system with its position
    pub fn for_each_candidate(&self, mut visit: impl FnMut(SystemRef, DVec3)) {
        let generation = self.generation;
        for (entity, (position, kind, pickability)) in self
            .world
            .query::<(&Position, &EntityKind, &Pickability)>()
            .iter()
        {
            if *kind == EntityKind::System && pickability.is_candidate() {
                visit(SystemRef { generation, entity }, position.0);
            }
        }
    }

    /// First system in insertion order whose name matches
    ///
    /// Without `exact_match` both sides are trimmed and lower-cased before
    /// comparing. With `visible_only` hidden systems are skipped.
    pub fn find_by_name(
        &self,
        name: &str,
        exact_match: bool,
        visible_only: bool,
    ) -> Option<SystemRef> {
        let wanted = if exact_match {
            name.to_string()
        } else {
            normalize_name(name)
        };

        self.order.iter().copied().find_map(|entity| {
            let mut query = self
                .world
                .query_one::<(&SystemInfo, &EntityKind, &Pickability)>(entity)
                .ok()?;
            let (info, kind, pickability) = query.get()?;
            if *kind != EntityKind::System || (visible_only && !pickability.visible) {
                return None;
            }
            let matches = if exact_match {
                info.name == wanted
            } else {
                normalize_name(&info.name) == wanted
            };
            matches.then(|| self.reference(entity))
        })
    }

    pub fn is_category_enabled(&self, category: &str) -> bool {
        !self.disabled_categories.contains(category)
    }

    /// Enable or disable a category; returns how many systems carry it
    ///
    /// A system stays filtered while any of its categories is disabled.
    pub fn set_category_pickable(&mut self, category: &str, enabled: bool) -> usize {
        let changed = if enabled {
            self.disabled_categories.remove(category)
        } else {
            self.disabled_categories.insert(category.to_string())
        };
        if !changed {
            return self.category_count(category);
        }
        let affected = self.refresh_filters(Some(category));
        debug!(category, enabled, affected, "Category filter changed");
        affected
    }

    fn refresh_filters(&mut self, only: Option<&str>) -> usize {
        let disabled = &self.disabled_categories;
        let policy = self.policy;
        let mut affected = 0;
        for (_, (categories, kind, pickability, material)) in self
            .world
            .query_mut::<(&Categories, &EntityKind, &mut Pickability, &mut MaterialRole)>()
        {
            if *kind != EntityKind::System {
                continue;
            }
            if let Some(category) = only {
                if !categories.contains(category) {
                    continue;
                }
            }
            affected += 1;
            let filtered = categories.0.iter().any(|c| disabled.contains(c));
            *material = apply_filter(policy, filtered, pickability);
        }
        affected
    }

    /// Number of systems tagged with `category`
    pub fn category_count(&self, category: &str) -> usize {
        self.world
            .query::<(&Categories, &EntityKind)>()
            .iter()
            .filter(|(_, (categories, kind))| {
                **kind == EntityKind::System && categories.contains(category)
            })
            .count()
    }

    /// Turn far-view picking suppression on or off for every system
    pub fn set_lod_suppressed(&mut self, suppressed: bool) {
        for (_, pickability) in self.world.query_mut::<&mut Pickability>() {
            pickability.lod_suppressed = suppressed;
        }
    }

    /// Next (or previous) visible system after `from`, wrapping around
    ///
    /// Starting from `None` yields the first (or last) visible system.
    pub fn step_visible(&self, from: Option<SystemRef>, forward: bool) -> Option<SystemRef> {
        let count = self.order.len();
        if count == 0 {
            return None;
        }
        let start = from
            .filter(|r| self.contains(*r))
            .and_then(|r| self.order.iter().position(|e| *e == r.entity));

        let visible = |entity: Entity| {
            self.world
                .query_one::<(&EntityKind, &Pickability)>(entity)
                .ok()
                .and_then(|mut q| {
                    q.get()
                        .map(|(kind, p)| *kind == EntityKind::System && p.visible)
                })
                .unwrap_or(false)
        };

        for step in 1..=count {
            let index = match (start, forward) {
                (Some(s), true) => (s + step) % count,
                (Some(s), false) => (s + count - step % count) % count,
                (None, true) => step - 1,
                (None, false) => count - step,
            };
            let entity = self.order[index];
            if visible(entity) {
                return Some(self.reference(entity));
            }
        }
        None
    }

    /// References of every entity in insertion order
    pub fn iter(&self) -> impl Iterator<Item = SystemRef> + '_ {
        self.order.iter().map(|e| self.reference(*e))
    }
}
