//! The generic object heap shared by the concrete and concolic semantics
//! (§3 "Heap object"). Sign-lattice analysis does not allocate cells on
//! this heap at all — its arrays/objects are tracked structurally in
//! `semantics::sign` instead, since it never needs concrete cell storage.

use std::collections::HashMap;

use crate::instr::ElementType;

/// Opaque handle to a heap object, unique within one analysis run.
pub type HeapId = usize;

#[derive(Debug, Clone)]
pub enum HeapObject<T> {
    Array {
        element_type: ElementType,
        cells: Vec<T>,
    },
    ClassInstance {
        class: String,
        fields: HashMap<String, T>,
    },
}

/// Objects are appended on `new`/`newarray` and never reclaimed: analysis
/// runs are short-lived (§3 "Lifecycle").
#[derive(Debug, Clone, Default)]
pub struct Heap<T> {
    objects: Vec<HeapObject<T>>,
}

impl<T> Heap<T> {
    pub fn new() -> Self {
        Self { objects: Vec::new() }
    }

    pub fn alloc(&mut self, object: HeapObject<T>) -> HeapId {
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn get(&self, id: HeapId) -> &HeapObject<T> {
        &self.objects[id]
    }

    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapObject<T> {
        &mut self.objects[id]
    }

    pub fn class_name(&self, id: HeapId) -> Option<&str> {
        match &self.objects[id] {
            HeapObject::ClassInstance { class, .. } => Some(class.as_str()),
            HeapObject::Array { .. } => None,
        }
    }
}
