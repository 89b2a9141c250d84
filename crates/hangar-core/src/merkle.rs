// Copyright [2026] [Joseph Verdicchio]
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// Copyright (c) 2026 Joseph Verdicchio and Hangar Contributors
// SPDX-License-Identifier: Apache-2.0

//! Allowance commitments: sorted-pair Merkle trees over
//! `(address, free_allowance, paid_allowance)` leaves.
//!
//! Inner nodes hash the lexicographically smaller child first, so a proof is a
//! bare list of sibling hashes with no direction bits. Leaves and nodes carry
//! distinct one-byte domain prefixes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::{Address, Hash32};

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

fn sha256(bytes: &[u8]) -> Hash32 {
    let mut h = Sha256::new();
    h.update(bytes);
    h.finalize().into()
}

pub fn allowance_leaf(address: &Address, free_allowance: u64, paid_allowance: u64) -> Hash32 {
    let mut buf = [0u8; 1 + 20 + 8 + 8];
    buf[0] = LEAF_PREFIX;
    buf[1..21].copy_from_slice(address.as_bytes());
    buf[21..29].copy_from_slice(&free_allowance.to_be_bytes());
    buf[29..37].copy_from_slice(&paid_allowance.to_be_bytes());
    sha256(&buf)
}

pub fn sorted_node_hash(a: &Hash32, b: &Hash32) -> Hash32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 65];
    buf[0] = NODE_PREFIX;
    buf[1..33].copy_from_slice(lo);
    buf[33..65].copy_from_slice(hi);
    sha256(&buf)
}

/// Folds `proof` onto `leaf` and returns the implied root.
pub fn process_proof(proof: &[Hash32], leaf: &Hash32) -> Hash32 {
    proof
        .iter()
        .fold(*leaf, |acc, sibling| sorted_node_hash(&acc, sibling))
}

pub fn verify_proof(proof: &[Hash32], leaf: &Hash32, root: &Hash32) -> bool {
    &process_proof(proof, leaf) == root
}

pub fn empty_root() -> Hash32 {
    sha256(b"")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowlistEntry {
    pub address: Address,
    pub free_allowance: u64,
    pub paid_allowance: u64,
}

impl AllowlistEntry {
    pub fn new(address: Address, free_allowance: u64, paid_allowance: u64) -> Self {
        Self {
            address,
            free_allowance,
            paid_allowance,
        }
    }

    pub fn leaf(&self) -> Hash32 {
        allowance_leaf(&self.address, self.free_allowance, self.paid_allowance)
    }
}

/// In-memory tree used to derive a phase root and per-address proofs.
///
/// An odd node at any level is carried to the next level unchanged, so its
/// proof simply has no sibling for that level.
#[derive(Debug, Clone)]
pub struct AllowlistTree {
    levels: Vec<Vec<Hash32>>,
    positions: HashMap<Address, usize>,
}

impl AllowlistTree {
    /// Returns `None` when an address appears more than once.
    pub fn build(entries: &[AllowlistEntry]) -> Option<Self> {
        let mut positions = HashMap::with_capacity(entries.len());
        let mut leaves = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if positions.insert(entry.address, idx).is_some() {
                return None;
            }
            leaves.push(entry.leaf());
        }

        let mut levels = vec![leaves];
        while levels.last().map_or(0, Vec::len) > 1 {
            let prev = levels.last().map(Vec::as_slice).unwrap_or_default();
            let next: Vec<Hash32> = prev
                .chunks(2)
                .map(|pair| match pair.get(1) {
                    Some(right) => sorted_node_hash(&pair[0], right),
                    None => pair[0],
                })
                .collect();
            levels.push(next);
        }
        Some(Self { levels, positions })
    }

    pub fn root(&self) -> Hash32 {
        match self.levels.last().and_then(|top| top.first()) {
            Some(root) => *root,
            None => empty_root(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn proof(&self, address: &Address) -> Option<Vec<Hash32>> {
        let mut idx = *self.positions.get(address)?;
        let mut proof = Vec::new();
        for level in &self.levels[..self.levels.len().saturating_sub(1)] {
            let sibling = idx ^ 1;
            if let Some(hash) = level.get(sibling) {
                proof.push(*hash);
            }
            idx /= 2;
        }
        Some(proof)
    }
}
