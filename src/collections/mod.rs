// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Generic containers used by validation and face grouping

mod disjoint_set;
mod multimap;

pub use disjoint_set::DisjointSet;
pub use multimap::MultiMap;
