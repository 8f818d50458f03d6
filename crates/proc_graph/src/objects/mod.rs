//! Procedural objects and the arena that owns them.
//!
//! Objects are addressed by generation-checked [`ObjectId`]s. Moving an
//! object between interface queues moves its id; copies are only made by
//! [`ObjectArena::duplicate`] when one output feeds several consumers.
use std::collections::BTreeMap;
use std::fmt;

use crate::value::Value;

pub mod geometry;
pub mod interface;

pub use geometry::Geometry;
pub use interface::{Direction, InterfaceTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    index: u32,
    generation: u32,
}

impl ObjectId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A unit of generated content: optional geometry plus named attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProceduralObject {
    pub geometry: Option<Geometry>,
    pub attributes: BTreeMap<String, Value>,
}

impl ProceduralObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geometry(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            attributes: BTreeMap::new(),
        }
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    object: Option<ProceduralObject>,
}

/// Owns every live object of a graph.
#[derive(Debug, Clone, Default)]
pub struct ObjectArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    created: u64,
}

impl ObjectArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: ProceduralObject) -> ObjectId {
        self.live += 1;
        self.created += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return ObjectId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectId {
            index,
            generation: 0,
        }
    }

    fn slot(&self, id: ObjectId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ObjectId) -> Option<&ProceduralObject> {
        self.slot(id)?.object.as_ref()
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ProceduralObject> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)?
            .object
            .as_mut()
    }

    /// Removes an object. Its id, and any copy of it, becomes stale.
    pub fn remove(&mut self, id: ObjectId) -> Option<ProceduralObject> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)?;
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(object)
    }

    /// Inserts a copy of `id`, returning the copy's id.
    pub fn duplicate(&mut self, id: ObjectId) -> Option<ObjectId> {
        let copy = self.get(id)?.clone();
        Some(self.insert(copy))
    }

    /// Removes every id in `ids`, returning how many were live.
    pub fn discard(&mut self, ids: impl IntoIterator<Item = ObjectId>) -> usize {
        ids.into_iter().filter(|id| self.remove(*id).is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of objects ever inserted.
    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.object.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &ProceduralObject)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.object.as_ref().map(|o| {
                (
                    ObjectId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    o,
                )
            })
        })
    }
}
