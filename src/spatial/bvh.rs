// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy partitioner
//! Items live in a flat map; the tree is rebuilt on the first query after a mutation

use super::partitioner::Partitioner;
use crate::error::SpatialError;
use crate::geometry::BoundingBox;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use std::cmp::Ordering;

const MAX_DEPTH: usize = 32;

/// BVH node
#[derive(Debug, Clone)]
struct BvhNode {
    bbox: BoundingBox,
    left: Option<Box<BvhNode>>,
    right: Option<Box<BvhNode>>,
    /// Items stored at a leaf
    items: Vec<(i32, BoundingBox)>,
}

impl BvhNode {
    fn leaf(items: Vec<(i32, BoundingBox)>) -> Self {
        Self {
            bbox: union_bbox(&items),
            left: None,
            right: None,
            items,
        }
    }

    fn internal(left: Box<BvhNode>, right: Box<BvhNode>) -> Self {
        Self {
            bbox: left.bbox.union(&right.bbox),
            left: Some(left),
            right: Some(right),
            items: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Median-split hierarchy over the longest axis
#[derive(Debug, Clone)]
pub struct BvhPartitioner {
    items: AHashMap<i32, BoundingBox>,
    root: Option<BvhNode>,
    dirty: bool,
    leaf_size: usize,
}

impl BvhPartitioner {
    pub fn new(leaf_size: usize) -> Self {
        Self {
            items: AHashMap::new(),
            root: None,
            dirty: false,
            leaf_size: leaf_size.max(1),
        }
    }

    /// Depth of the current tree, rebuilding it first if needed
    pub fn depth(&mut self) -> usize {
        fn node_depth(node: &BvhNode) -> usize {
            let left = node.left.as_deref().map_or(0, node_depth);
            let right = node.right.as_deref().map_or(0, node_depth);
            1 + left.max(right)
        }
        self.ensure_built();
        self.root.as_ref().map_or(0, node_depth)
    }

    fn ensure_built(&mut self) {
        if !self.dirty {
            return;
        }
        let items: Vec<(i32, BoundingBox)> = self.items.iter().map(|(id, b)| (*id, *b)).collect();
        self.root = if items.is_empty() {
            None
        } else {
            Some(Self::build_recursive(items, 0, self.leaf_size))
        };
        self.dirty = false;
    }

    fn build_recursive(mut items: Vec<(i32, BoundingBox)>, depth: usize, leaf_size: usize) -> BvhNode {
        if items.len() <= leaf_size || depth >= MAX_DEPTH {
            return BvhNode::leaf(items);
        }

        let axis = longest_axis(&union_bbox(&items));
        items.sort_by(|(_, a), (_, b)| {
            a.center()[axis]
                .partial_cmp(&b.center()[axis])
                .unwrap_or(Ordering::Equal)
        });

        let right_items = items.split_off(items.len() / 2);
        let left = Box::new(Self::build_recursive(items, depth + 1, leaf_size));
        let right = Box::new(Self::build_recursive(right_items, depth + 1, leaf_size));
        BvhNode::internal(left, right)
    }

    /// Walk every node overlapping `query`, handing leaf items to `accept` until `out` is full
    fn query<F>(&mut self, query: &BoundingBox, out: &mut [i32], accept: F) -> usize
    where
        F: Fn(&BoundingBox) -> bool,
    {
        self.ensure_built();
        let mut count = 0;
        if let Some(root) = &self.root {
            Self::query_recursive(root, query, out, &mut count, &accept);
        }
        count
    }

    fn query_recursive<F>(node: &BvhNode, query: &BoundingBox, out: &mut [i32], count: &mut usize, accept: &F)
    where
        F: Fn(&BoundingBox) -> bool,
    {
        if *count == out.len() || !node.bbox.intersects(query) {
            return;
        }

        if node.is_leaf() {
            for (id, bounds) in &node.items {
                if *count == out.len() {
                    return;
                }
                if accept(bounds) {
                    out[*count] = *id;
                    *count += 1;
                }
            }
            return;
        }

        if let Some(left) = &node.left {
            Self::query_recursive(left, query, out, count, accept);
        }
        if let Some(right) = &node.right {
            Self::query_recursive(right, query, out, count, accept);
        }
    }
}

impl Default for BvhPartitioner {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Partitioner for BvhPartitioner {
    fn add_item(&mut self, id: i32, center: Point3<f32>, extents: Vector3<f32>) -> Result<(), SpatialError> {
        if self.items.contains_key(&id) {
            return Err(SpatialError::AlreadyPresent);
        }
        self.items
            .insert(id, BoundingBox::from_center_extents(center, extents));
        self.dirty = true;
        Ok(())
    }

    fn update_item(&mut self, id: i32, center: Point3<f32>, extents: Vector3<f32>) -> Result<(), SpatialError> {
        let bounds = self.items.get_mut(&id).ok_or(SpatialError::NotPresent)?;
        *bounds = BoundingBox::from_center_extents(center, extents);
        self.dirty = true;
        Ok(())
    }

    fn remove_item(&mut self, id: i32) -> Result<(), SpatialError> {
        self.items.remove(&id).ok_or(SpatialError::NotPresent)?;
        self.dirty = true;
        Ok(())
    }

    fn contained_by(&mut self, center: Point3<f32>, extents: Vector3<f32>, out: &mut [i32]) -> usize {
        let query = BoundingBox::from_center_extents(center, extents);
        self.query(&query, out, |bounds| query.contains(bounds))
    }

    fn intersected_by(&mut self, center: Point3<f32>, extents: Vector3<f32>, out: &mut [i32]) -> usize {
        let query = BoundingBox::from_center_extents(center, extents);
        self.query(&query, out, |bounds| query.intersects(bounds))
    }

    fn has_item(&self, id: i32) -> bool {
        self.items.contains_key(&id)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

fn union_bbox(items: &[(i32, BoundingBox)]) -> BoundingBox {
    items
        .iter()
        .fold(BoundingBox::empty(), |acc, (_, bounds)| acc.union(bounds))
}

fn longest_axis(bbox: &BoundingBox) -> usize {
    let size = bbox.size();
    if size.x >= size.y && size.x >= size.z {
        0
    } else if size.y >= size.z {
        1
    } else {
        2
    }
}
