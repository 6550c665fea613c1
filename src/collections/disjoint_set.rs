// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Union-find over arbitrary hashable elements

use ahash::AHashMap;
use std::hash::Hash;

/// Partition of registered elements into disjoint sets.
///
/// Roots are elements whose parent is themselves. Lookups compress the path they walk,
/// and joins hang the smaller tree under the larger one.
#[derive(Debug, Clone)]
pub struct DisjointSet<T> {
    parent: AHashMap<T, T>,
    /// Tree size, only meaningful for roots
    size: AHashMap<T, usize>,
}

impl<T> Default for DisjointSet<T>
where
    T: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DisjointSet<T>
where
    T: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            parent: AHashMap::new(),
            size: AHashMap::new(),
        }
    }

    /// Register `element` as a singleton set; no-op if it is already known
    pub fn add(&mut self, element: T) {
        if self.parent.contains_key(&element) {
            return;
        }
        self.parent.insert(element.clone(), element.clone());
        self.size.insert(element, 1);
    }

    pub fn contains(&self, element: &T) -> bool {
        self.parent.contains_key(element)
    }

    /// Number of registered elements
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Merge the sets containing `a` and `b`, registering either one if needed
    pub fn join(&mut self, a: T, b: T) {
        self.add(a.clone());
        self.add(b.clone());

        let root_a = self.get_root(&a);
        let root_b = self.get_root(&b);
        if root_a == root_b {
            return;
        }

        let size_a = self.size.get(&root_a).copied().unwrap_or(1);
        let size_b = self.size.get(&root_b).copied().unwrap_or(1);
        let (child, parent) = if size_a < size_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };

        self.size.remove(&child);
        self.size.insert(parent.clone(), size_a + size_b);
        self.parent.insert(child, parent);
    }

    /// Representative of the set containing `element`.
    ///
    /// Every ancestor visited on the way is re-pointed straight at the root.
    ///
    /// # Panics
    /// Panics if `element` was never added.
    pub fn get_root(&mut self, element: &T) -> T {
        let mut root = match self.parent.get(element) {
            Some(parent) => parent.clone(),
            None => panic!("disjoint-set lookup of an element that was never added"),
        };
        loop {
            let next = &self.parent[&root];
            if *next == root {
                break;
            }
            root = next.clone();
        }

        let mut current = element.clone();
        while current != root {
            let next = self.parent[&current].clone();
            self.parent.insert(current, root.clone());
            current = next;
        }

        root
    }

    /// True iff both elements are registered and share a root
    pub fn are_in_same_set(&mut self, a: &T, b: &T) -> bool {
        if !self.contains(a) || !self.contains(b) {
            return false;
        }
        self.get_root(a) == self.get_root(b)
    }

    /// All sets, each listed as its members
    pub fn sets(&mut self) -> Vec<Vec<T>> {
        let elements: Vec<T> = self.parent.keys().cloned().collect();
        let mut groups: AHashMap<T, Vec<T>> = AHashMap::new();
        for element in elements {
            let root = self.get_root(&element);
            groups.entry(root).or_default().push(element);
        }
        groups.into_values().collect()
    }
}
