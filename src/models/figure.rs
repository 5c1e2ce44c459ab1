use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Publication status of a figure element.
///
/// Variant order is the rollup order: a container's derived status is the
/// worst (lowest) status found in its subtree.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FigureStatus {
    #[default]
    Draft,
    Ready,
    Submitted,
    Published,
}

impl FigureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Ready => "ready",
            Self::Submitted => "submitted",
            Self::Published => "published",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "ready" => Some(Self::Ready),
            "submitted" => Some(Self::Submitted),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

/// One source contributing to a figure: a panel, a generated plot, a raw
/// micrograph, a manual composite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureElement {
    /// Label, unique within its sibling set (e.g. `1a`, `boxplot`).
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Script path or software name that produced this element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub status: FigureStatus,
}

/// Opaque handle to a node in a [`FigureTree`].
///
/// Handles are stable for the lifetime of the tree value: slots are never
/// reused after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FigureId(usize);

#[derive(Debug, Clone)]
struct Slot {
    element: FigureElement,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena-backed tree of figure elements, unbounded depth.
///
/// Nodes hold integer parent/child links into the arena rather than owning
/// their children directly; the tree serializes to and from the natural
/// nested YAML form. Built top-down, so it is acyclic by construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FigureNodeRepr>", into = "Vec<FigureNodeRepr>")]
pub struct FigureTree {
    slots: Vec<Option<Slot>>,
    roots: Vec<usize>,
}

impl FigureTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes in the tree.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    pub fn get(&self, id: FigureId) -> Option<&FigureElement> {
        self.slot(id.0).map(|s| &s.element)
    }

    pub fn get_mut(&mut self, id: FigureId) -> Option<&mut FigureElement> {
        self.slots
            .get_mut(id.0)
            .and_then(|s| s.as_mut())
            .map(|s| &mut s.element)
    }

    /// Children of `parent`, or the root set when `parent` is `None`.
    pub fn children_of(&self, parent: Option<FigureId>) -> Vec<FigureId> {
        let indices = match parent {
            Some(id) => match self.slot(id.0) {
                Some(slot) => &slot.children,
                None => return Vec::new(),
            },
            None => &self.roots,
        };
        indices.iter().map(|&i| FigureId(i)).collect()
    }

    /// Insert an element under `parent` (or as a new root).
    ///
    /// Rejects an element whose id collides with an existing sibling.
    pub fn insert(
        &mut self,
        parent: Option<FigureId>,
        element: FigureElement,
    ) -> Result<FigureId, ValidationError> {
        if let Some(p) = parent {
            if self.slot(p.0).is_none() {
                return Err(ValidationError::referential(
                    self.path_label(parent),
                    "parent figure element does not exist",
                ));
            }
        }
        if self.sibling_id_taken(parent, &element.id, None) {
            return Err(ValidationError::referential(
                self.path_label(parent),
                format!("duplicate figure element id '{}' among siblings", element.id),
            ));
        }

        let index = self.slots.len();
        self.slots.push(Some(Slot {
            element,
            parent: parent.map(|p| p.0),
            children: Vec::new(),
        }));
        match parent {
            Some(p) => self.slot_mut(p.0).children.push(index),
            None => self.roots.push(index),
        }
        Ok(FigureId(index))
    }

    /// Move the subtree rooted at `node` under `new_parent` (or to the root
    /// set). Rejected when the destination lies inside the moved subtree,
    /// leaving the tree unchanged.
    pub fn move_to(
        &mut self,
        node: FigureId,
        new_parent: Option<FigureId>,
    ) -> Result<(), ValidationError> {
        let node_path = self.path_label(Some(node));
        if self.slot(node.0).is_none() {
            return Err(ValidationError::referential(
                node_path,
                "figure element does not exist",
            ));
        }
        if let Some(dest) = new_parent {
            if self.slot(dest.0).is_none() {
                return Err(ValidationError::referential(
                    self.path_label(new_parent),
                    "destination figure element does not exist",
                ));
            }
            if self.is_descendant_or_self(dest.0, node.0) {
                return Err(ValidationError::referential(
                    node_path,
                    "cannot move a figure element into its own subtree",
                ));
            }
        }
        let id = self.slot(node.0).expect("live slot").element.id.clone();
        if self.sibling_id_taken(new_parent, &id, Some(node.0)) {
            return Err(ValidationError::referential(
                self.path_label(new_parent),
                "destination already has a sibling with this id",
            ));
        }

        self.detach(node.0);
        match new_parent {
            Some(dest) => self.slot_mut(dest.0).children.push(node.0),
            None => self.roots.push(node.0),
        }
        self.slot_mut(node.0).parent = new_parent.map(|p| p.0);
        Ok(())
    }

    /// Remove the subtree rooted at `node`, returning how many elements
    /// were removed.
    pub fn remove(&mut self, node: FigureId) -> usize {
        if self.slot(node.0).is_none() {
            return 0;
        }
        self.detach(node.0);
        let mut stack = vec![node.0];
        let mut removed = 0;
        while let Some(index) = stack.pop() {
            if let Some(slot) = self.slots[index].take() {
                stack.extend(slot.children);
                removed += 1;
            }
        }
        removed
    }

    /// Depth-first traversal over all live nodes.
    ///
    /// The sequence is computed fresh for each call; it is not a live
    /// cursor over later mutations.
    pub fn iter(&self) -> FigureIter<'_> {
        let mut stack: Vec<(usize, usize)> =
            self.roots.iter().rev().map(|&i| (i, 0)).collect();
        stack.retain(|&(i, _)| self.slots[i].is_some());
        FigureIter { tree: self, stack }
    }

    /// Resolve a slash-separated id path (e.g. `fig1/1a/boxplot`).
    pub fn find(&self, path: &str) -> Option<FigureId> {
        let mut parent: Option<FigureId> = None;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            parent = self
                .children_of(parent)
                .into_iter()
                .find(|&c| self.get(c).map(|e| e.id.as_str()) == Some(segment));
            parent?;
        }
        parent
    }

    /// Slash-separated id path from the root to `node`.
    pub fn path_of(&self, node: FigureId) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(node.0);
        while let Some(index) = cursor {
            match self.slot(index) {
                Some(slot) => {
                    segments.push(slot.element.id.clone());
                    cursor = slot.parent;
                }
                None => break,
            }
        }
        segments.reverse();
        segments.join("/")
    }

    /// Worst status found in the subtree rooted at `node` (the original
    /// rollup rule: a figure is only as done as its least-done element).
    pub fn rollup_status(&self, node: FigureId) -> FigureStatus {
        let mut worst = match self.get(node) {
            Some(element) => element.status,
            None => return FigureStatus::Draft,
        };
        let mut stack = self.children_of(Some(node));
        while let Some(child) = stack.pop() {
            if let Some(element) = self.get(child) {
                worst = worst.min(element.status);
                stack.extend(self.children_of(Some(child)));
            }
        }
        worst
    }

    /// Paths of nodes whose id collides with a sibling, for validation.
    pub fn duplicate_sibling_paths(&self) -> Vec<String> {
        let mut duplicates = Vec::new();
        let mut queue: Vec<Option<FigureId>> = vec![None];
        while let Some(parent) = queue.pop() {
            let children = self.children_of(parent);
            let mut seen: Vec<&str> = Vec::new();
            for &child in &children {
                let Some(element) = self.get(child) else { continue };
                if seen.contains(&element.id.as_str()) {
                    duplicates.push(self.path_of(child));
                } else {
                    seen.push(element.id.as_str());
                }
                queue.push(Some(child));
            }
        }
        duplicates.sort();
        duplicates
    }

    fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index).and_then(|s| s.as_ref())
    }

    fn slot_mut(&mut self, index: usize) -> &mut Slot {
        self.slots[index].as_mut().expect("live slot")
    }

    fn detach(&mut self, index: usize) {
        match self.slot(index).and_then(|s| s.parent) {
            Some(parent) => self.slot_mut(parent).children.retain(|&c| c != index),
            None => self.roots.retain(|&r| r != index),
        }
    }

    fn is_descendant_or_self(&self, candidate: usize, ancestor: usize) -> bool {
        let mut cursor = Some(candidate);
        while let Some(index) = cursor {
            if index == ancestor {
                return true;
            }
            cursor = self.slot(index).and_then(|s| s.parent);
        }
        false
    }

    fn sibling_id_taken(&self, parent: Option<FigureId>, id: &str, skip: Option<usize>) -> bool {
        self.children_of(parent).iter().any(|&c| {
            Some(c.0) != skip && self.get(c).map(|e| e.id.as_str()) == Some(id)
        })
    }

    fn path_label(&self, node: Option<FigureId>) -> String {
        match node {
            Some(id) => self.path_of(id),
            None => String::from("<root>"),
        }
    }
}

/// Depth-first iterator over a [`FigureTree`]; yields `(depth, id, element)`.
pub struct FigureIter<'a> {
    tree: &'a FigureTree,
    stack: Vec<(usize, usize)>,
}

impl<'a> Iterator for FigureIter<'a> {
    type Item = (usize, FigureId, &'a FigureElement);

    fn next(&mut self) -> Option<Self::Item> {
        let (index, depth) = self.stack.pop()?;
        let slot = self.tree.slot(index)?;
        for &child in slot.children.iter().rev() {
            if self.tree.slots[child].is_some() {
                self.stack.push((child, depth + 1));
            }
        }
        Some((depth, FigureId(index), &slot.element))
    }
}

// Serialized form: the natural nested YAML document.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FigureNodeRepr {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub status: FigureStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FigureNodeRepr>,
}

impl From<Vec<FigureNodeRepr>> for FigureTree {
    fn from(reprs: Vec<FigureNodeRepr>) -> Self {
        fn add(tree: &mut FigureTree, parent: Option<usize>, repr: FigureNodeRepr) {
            let index = tree.slots.len();
            tree.slots.push(Some(Slot {
                element: FigureElement {
                    id: repr.id,
                    title: repr.title,
                    source: repr.source,
                    status: repr.status,
                },
                parent,
                children: Vec::new(),
            }));
            match parent {
                Some(p) => tree.slot_mut(p).children.push(index),
                None => tree.roots.push(index),
            }
            for child in repr.children {
                add(tree, Some(index), child);
            }
        }

        let mut tree = FigureTree::new();
        for repr in reprs {
            add(&mut tree, None, repr);
        }
        tree
    }
}

impl From<FigureTree> for Vec<FigureNodeRepr> {
    fn from(tree: FigureTree) -> Self {
        fn collect(tree: &FigureTree, id: FigureId) -> FigureNodeRepr {
            let element = tree.get(id).expect("live node").clone();
            FigureNodeRepr {
                id: element.id,
                title: element.title,
                source: element.source,
                status: element.status,
                children: tree
                    .children_of(Some(id))
                    .into_iter()
                    .map(|c| collect(tree, c))
                    .collect(),
            }
        }

        tree.children_of(None)
            .into_iter()
            .map(|id| collect(&tree, id))
            .collect()
    }
}
