// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Node equivalence classes induced by shared-DOF constraints
//!
//! A union-find over mesh node ids. Every class carries the set of degrees
//! of freedom its nodes share; tying a node into a class with a different
//! set is a conflict.

use fire_lite_model::{EntityId, Error, NodeId, PropertySnapshot, Result};
use rustc_hash::FxHashMap;

/// Set of degrees of freedom, one bit per problem DOF
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DofMask(u8);

impl DofMask {
    /// DOFs whose flag is set to 1 (`YES`) in a snapshot
    pub fn from_snapshot(snapshot: &PropertySnapshot, dofs: &[&str]) -> Self {
        let bits = dofs
            .iter()
            .enumerate()
            .filter(|(_, dof)| snapshot.get(dof).and_then(|v| v.as_int()) == Some(1))
            .fold(0u8, |bits, (index, _)| bits | (1 << index));
        DofMask(bits)
    }

    /// Whether the DOF at `index` is shared
    pub fn contains(&self, index: usize) -> bool {
        index < 8 && self.0 & (1 << index) != 0
    }

    /// Whether no DOF is shared
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Names of the shared DOFs joined with `+`
    pub fn describe(&self, dofs: &[&str]) -> String {
        let names: Vec<&str> = dofs
            .iter()
            .enumerate()
            .filter(|(index, _)| self.contains(*index))
            .map(|(_, dof)| *dof)
            .collect();
        if names.is_empty() {
            "nothing".to_string()
        } else {
            names.join("+")
        }
    }
}

#[derive(Clone, Debug)]
struct ClassData {
    mask: DofMask,
    entities: Vec<EntityId>,
}

/// One equivalence class
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquivalenceClass {
    /// Member nodes, ascending
    pub nodes: Vec<NodeId>,
    /// Shared DOFs
    pub mask: DofMask,
    /// Entities whose elements tied the nodes, ascending
    pub entities: Vec<EntityId>,
}

/// Partition of the constrained mesh nodes
#[derive(Clone, Debug)]
pub struct NodeEquivalenceGroups {
    dofs: &'static [&'static str],
    parent: FxHashMap<NodeId, NodeId>,
    size: FxHashMap<NodeId, usize>,
    classes: FxHashMap<NodeId, ClassData>,
}

impl NodeEquivalenceGroups {
    /// Empty partition over the given problem DOFs
    pub fn new(dofs: &'static [&'static str]) -> Self {
        Self {
            dofs,
            parent: FxHashMap::default(),
            size: FxHashMap::default(),
            classes: FxHashMap::default(),
        }
    }

    /// Representative of a node's class
    pub fn find(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let parent = *self.parent.get(&current)?;
            if parent == current {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Whether two nodes share a class
    pub fn same_class(&self, a: NodeId, b: NodeId) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(ra), Some(rb)) => ra == rb,
            _ => false,
        }
    }

    /// DOFs shared by a node's class
    pub fn mask_of(&self, node: NodeId) -> Option<DofMask> {
        self.find(node)
            .and_then(|root| self.classes.get(&root))
            .map(|class| class.mask)
    }

    /// Tie nodes together on the DOFs of `mask`
    ///
    /// Fails without changing anything when a node already belongs to a
    /// class sharing other DOFs.
    pub fn tie(&mut self, nodes: &[NodeId], mask: DofMask, entity: EntityId) -> Result<()> {
        for &node in nodes {
            let Some(root) = self.find(node) else {
                continue;
            };
            if let Some(class) = self.classes.get(&root) {
                if class.mask != mask {
                    let owners: Vec<String> =
                        class.entities.iter().map(|e| e.to_string()).collect();
                    return Err(Error::consistency(format!(
                        "node {} is tied on {} by {} but on {} by {}",
                        node,
                        class.mask.describe(self.dofs),
                        owners.join(", "),
                        mask.describe(self.dofs),
                        entity
                    )));
                }
            }
        }

        let Some((&first, rest)) = nodes.split_first() else {
            return Ok(());
        };
        self.insert(first, mask, entity);
        for &node in rest {
            self.insert(node, mask, entity);
            self.union(first, node);
        }
        Ok(())
    }

    fn insert(&mut self, node: NodeId, mask: DofMask, entity: EntityId) {
        if !self.parent.contains_key(&node) {
            self.parent.insert(node, node);
            self.size.insert(node, 1);
            self.classes.insert(
                node,
                ClassData {
                    mask,
                    entities: Vec::new(),
                },
            );
        }
        if let Some(class) = self.find(node).and_then(|root| self.classes.get_mut(&root)) {
            if !class.entities.contains(&entity) {
                class.entities.push(entity);
            }
        }
    }

    fn union(&mut self, a: NodeId, b: NodeId) {
        let (Some(ra), Some(rb)) = (self.find(a), self.find(b)) else {
            return;
        };
        if ra == rb {
            return;
        }
        let size_a = self.size.get(&ra).copied().unwrap_or(1);
        let size_b = self.size.get(&rb).copied().unwrap_or(1);
        let (root, child) = if size_a >= size_b { (ra, rb) } else { (rb, ra) };
        self.parent.insert(child, root);
        self.size.insert(root, size_a + size_b);
        if let Some(absorbed) = self.classes.remove(&child) {
            if let Some(class) = self.classes.get_mut(&root) {
                for entity in absorbed.entities {
                    if !class.entities.contains(&entity) {
                        class.entities.push(entity);
                    }
                }
            }
        }
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no node is tied
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// All classes, ordered by their lowest node
    pub fn classes(&self) -> Vec<EquivalenceClass> {
        let mut members: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
        for &node in self.parent.keys() {
            if let Some(root) = self.find(node) {
                members.entry(root).or_default().push(node);
            }
        }
        let mut classes: Vec<EquivalenceClass> = members
            .into_iter()
            .filter_map(|(root, mut nodes)| {
                let data = self.classes.get(&root)?;
                nodes.sort();
                let mut entities = data.entities.clone();
                entities.sort();
                Some(EquivalenceClass {
                    nodes,
                    mask: data.mask,
                    entities,
                })
            })
            .collect();
        classes.sort_by_key(|class| class.nodes.first().copied());
        classes
    }
}
