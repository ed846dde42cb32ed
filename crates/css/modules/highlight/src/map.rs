//! The per-view highlights map: named groups of entries ordered by creation.
//! Spec: <https://drafts.csswg.org/css-highlight-api-1/#highlight-registry>
//!
//! The map owns every entry it hands out a handle for. Groups are kept in a
//! `BTreeMap` keyed by creation order, so iteration is creation order and a
//! group keeps its slot for as long as it exists. Every mutation queues an
//! [`InvalidationRequest`]; the host drains them with
//! [`HighlightsMap::take_invalidations`].

use crate::entry::{EntryId, HighlightEntry};
use crate::error::HighlightError;
use crate::invalidation::InvalidationRequest;
use crate::range::LiveRange;
use core::cmp::Ordering;
use core::iter::once;
use core::mem::{replace, take};
use css_style_attr::PropertyMap;
use dom::{BoundaryPoint, DocumentId, NodeKey, TreeMutation, TreeOrder};
use log::{debug, trace, warn};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::vec::IntoIter;

/// Monotonic rank assigned to a group name when it is first used.
pub type CreationOrder = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightGroup {
    name: String,
    creation_order: CreationOrder,
    entries: Vec<EntryId>,
}

impl HighlightGroup {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn creation_order(&self) -> CreationOrder {
        self.creation_order
    }

    /// Entries in insertion order.
    #[inline]
    pub fn entries(&self) -> &[EntryId] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Highlight groups and entries for one document.
#[derive(Debug)]
pub struct HighlightsMap {
    document: DocumentId,
    /// Groups by creation order.
    groups: BTreeMap<CreationOrder, HighlightGroup>,
    /// Group name to creation order.
    slots: HashMap<String, CreationOrder>,
    next_creation_order: CreationOrder,
    entries: HashMap<EntryId, HighlightEntry>,
    next_entry: u64,
    /// Boundary node to the entries with a boundary in it.
    boundary_index: HashMap<NodeKey, HashSet<EntryId>>,
    pending: Vec<InvalidationRequest>,
}

impl HighlightsMap {
    pub fn new(document: DocumentId) -> Self {
        Self {
            document,
            groups: BTreeMap::new(),
            slots: HashMap::new(),
            next_creation_order: 0,
            entries: HashMap::new(),
            next_entry: 1,
            boundary_index: HashMap::new(),
            pending: Vec::new(),
        }
    }

    #[inline]
    pub const fn document(&self) -> DocumentId {
        self.document
    }

    /// Number of groups.
    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn group(&self, name: &str) -> Option<&HighlightGroup> {
        let order = self.slots.get(name)?;
        self.groups.get(order)
    }

    fn group_mut(&mut self, name: &str) -> Option<&mut HighlightGroup> {
        let order = self.slots.get(name)?;
        self.groups.get_mut(order)
    }

    pub fn creation_order(&self, name: &str) -> Option<CreationOrder> {
        self.slots.get(name).copied()
    }

    // ============================
    // Entry lifecycle
    // ============================

    /// Create a detached entry with priority 0 and no inline style.
    /// Detached entries track their range but never paint.
    pub fn create_entry(&mut self, range: LiveRange) -> EntryId {
        let id = EntryId(self.next_entry);
        self.next_entry = self.next_entry.saturating_add(1);
        if range.document != self.document {
            debug!(
                "HighlightsMap({:?}): entry {id:?} targets {:?} and stays inert in this view",
                self.document, range.document
            );
        }
        self.subscribe(id, &range);
        self.entries.insert(id, HighlightEntry::new(range));
        trace!("HighlightsMap({:?}): created {id:?}", self.document);
        id
    }

    /// Remove an entry from its group (if any) and free it.
    ///
    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] if `id` is not owned by this map.
    pub fn release_entry(&mut self, id: EntryId) -> Result<(), HighlightError> {
        self.require(id)?;
        self.delete_entry(id);
        if let Some(entry) = self.entries.remove(&id) {
            self.unsubscribe(id, &entry.range);
        }
        trace!("HighlightsMap({:?}): released {id:?}", self.document);
        Ok(())
    }

    pub fn entry(&self, id: EntryId) -> Option<&HighlightEntry> {
        self.entries.get(&id)
    }

    /// Name of the group currently holding `id`.
    pub fn group_of(&self, id: EntryId) -> Option<&str> {
        self.entries.get(&id).and_then(HighlightEntry::group)
    }

    // ============================
    // Map contract
    // ============================

    /// First entry of the group, in insertion order.
    pub fn get(&self, name: &str) -> Option<EntryId> {
        self.group(name)?.entries.first().copied()
    }

    /// All entries of the group in insertion order; empty if the group is absent.
    pub fn get_all(&self, name: &str) -> Vec<EntryId> {
        self.group(name)
            .map(|group| group.entries.clone())
            .unwrap_or_default()
    }

    /// True iff the group exists, even when empty.
    pub fn has(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Replace the group's entries. A new group gets the next creation slot;
    /// an existing group keeps its slot.
    ///
    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] before mutating anything if
    /// any handle is not owned by this map.
    pub fn set(&mut self, name: &str, ids: &[EntryId]) -> Result<(), HighlightError> {
        let wanted = self.validated(ids)?;
        if self.group(name).is_some_and(|group| group.entries == wanted) {
            trace!("HighlightsMap: set({name:?}) leaves the group unchanged");
            return Ok(());
        }
        self.ensure_group(name);
        let previous = self.get_all(name);
        for id in &previous {
            if !wanted.contains(id) {
                self.damage_entry(*id);
                if let Some(entry) = self.entries.get_mut(id) {
                    entry.group = None;
                }
            }
        }
        for id in &wanted {
            if !previous.contains(id) {
                self.detach_for(*id, name);
                self.attach(*id, name);
                self.damage_entry(*id);
            }
        }
        if let Some(group) = self.group_mut(name) {
            group.entries = wanted;
        }
        self.pending.push(InvalidationRequest::Group(name.to_owned()));
        trace!("HighlightsMap: set({name:?}) -> {:?}", self.get_all(name));
        Ok(())
    }

    /// Append entries to the group, creating it in the next creation slot if
    /// absent. An entry already in the group moves to the end.
    ///
    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] before mutating anything if
    /// any handle is not owned by this map.
    pub fn append(&mut self, name: &str, ids: &[EntryId]) -> Result<(), HighlightError> {
        let wanted = self.validated(ids)?;
        let created = !self.has(name);
        self.ensure_group(name);
        for id in &wanted {
            self.detach_for(*id, name);
            self.attach(*id, name);
            if let Some(group) = self.group_mut(name) {
                group.entries.push(*id);
            }
            self.damage_entry(*id);
        }
        if created || !wanted.is_empty() {
            self.pending.push(InvalidationRequest::Group(name.to_owned()));
        }
        trace!("HighlightsMap: append({name:?}) -> {:?}", self.get_all(name));
        Ok(())
    }

    /// Insert entries so the first lands at `index` of the current sequence.
    /// An absent group has length 0, so index 0 creates it.
    ///
    /// # Errors
    /// Returns [`HighlightError::IndexOutOfBounds`] if `index` is past the
    /// end of the group, or [`HighlightError::UnknownEntry`] for a foreign
    /// handle. Nothing is mutated on error.
    pub fn insert(
        &mut self,
        name: &str,
        index: usize,
        ids: &[EntryId],
    ) -> Result<(), HighlightError> {
        let wanted = self.validated(ids)?;
        let current = self.get_all(name);
        if index > current.len() {
            return Err(HighlightError::IndexOutOfBounds {
                group: name.to_owned(),
                index,
                len: current.len(),
            });
        }
        // Entries moving forward within the group shift the insertion point.
        let moved_before = current
            .iter()
            .take(index)
            .filter(|id| wanted.contains(*id))
            .count();
        let target = index - moved_before;

        self.ensure_group(name);
        for id in &wanted {
            self.detach_for(*id, name);
        }
        for (offset, id) in wanted.iter().enumerate() {
            self.attach(*id, name);
            if let Some(group) = self.group_mut(name) {
                group.entries.insert(target + offset, *id);
            }
            self.damage_entry(*id);
        }
        self.pending.push(InvalidationRequest::Group(name.to_owned()));
        trace!("HighlightsMap: insert({name:?}, {index}) -> {:?}", self.get_all(name));
        Ok(())
    }

    /// Remove a group and its creation slot. Its entries become detached.
    /// Returns whether the group existed.
    pub fn delete_group(&mut self, name: &str) -> bool {
        let Some(order) = self.slots.remove(name) else {
            return false;
        };
        let Some(group) = self.groups.remove(&order) else {
            return false;
        };
        for id in &group.entries {
            self.damage_entry(*id);
            if let Some(entry) = self.entries.get_mut(id) {
                entry.group = None;
            }
        }
        self.pending.push(InvalidationRequest::Group(name.to_owned()));
        trace!("HighlightsMap: deleted group {name:?}");
        true
    }

    /// Remove one entry from whichever group holds it. Siblings keep their
    /// order. Returns whether the entry was in a group.
    pub fn delete_entry(&mut self, id: EntryId) -> bool {
        let Some(name) = self.entries.get(&id).and_then(|entry| entry.group.clone()) else {
            return false;
        };
        self.damage_entry(id);
        if let Some(group) = self.group_mut(&name) {
            group.entries.retain(|member| *member != id);
        }
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.group = None;
        }
        self.pending.push(InvalidationRequest::Group(name));
        true
    }

    /// Remove every group. Entries stay alive, detached. Creation order keeps
    /// counting from where it was.
    pub fn clear(&mut self) {
        if self.groups.is_empty() {
            return;
        }
        for entry in self.entries.values_mut() {
            entry.group = None;
        }
        self.groups.clear();
        self.slots.clear();
        self.pending.push(InvalidationRequest::Everything);
        trace!("HighlightsMap({:?}): cleared", self.document);
    }

    /// `(name, entries)` in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EntryId])> + '_ {
        self.groups
            .values()
            .map(|group| (group.name.as_str(), group.entries.as_slice()))
    }

    /// An owned copy of the current groups for iterating while mutating.
    pub fn snapshot(&self) -> HighlightsSnapshot {
        HighlightsSnapshot {
            groups: self
                .iter()
                .map(|(name, entries)| (name.to_owned(), entries.to_vec()))
                .collect(),
        }
    }

    /// Every grouped entry with its group and index in that group.
    pub(crate) fn grouped_entries(
        &self,
    ) -> impl Iterator<Item = (&HighlightGroup, usize, EntryId, &HighlightEntry)> + '_ {
        self.groups.values().flat_map(move |group| {
            group
                .entries
                .iter()
                .enumerate()
                .filter_map(move |(index, id)| {
                    self.entries
                        .get(id)
                        .map(|entry| (group, index, *id, entry))
                })
        })
    }

    // ============================
    // Entry mutators
    // ============================

    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] if `id` is not owned by this map.
    pub fn set_priority(&mut self, id: EntryId, priority: u32) -> Result<(), HighlightError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(HighlightError::UnknownEntry(id))?;
        if entry.priority == priority {
            return Ok(());
        }
        entry.priority = priority;
        self.damage_if_grouped(id);
        Ok(())
    }

    /// Set one inline style property; returns the previous value.
    ///
    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] if `id` is not owned by this map.
    pub fn set_style_property(
        &mut self,
        id: EntryId,
        property: &str,
        value: &str,
    ) -> Result<Option<String>, HighlightError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(HighlightError::UnknownEntry(id))?;
        let previous = entry.style.set(property, value);
        self.damage_if_grouped(id);
        Ok(previous)
    }

    /// Remove one inline style property; returns its value.
    ///
    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] if `id` is not owned by this map.
    pub fn remove_style_property(
        &mut self,
        id: EntryId,
        property: &str,
    ) -> Result<Option<String>, HighlightError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(HighlightError::UnknownEntry(id))?;
        let previous = entry.style.remove(property);
        if previous.is_some() {
            self.damage_if_grouped(id);
        }
        Ok(previous)
    }

    /// Replace the whole inline style with a parsed declaration block.
    ///
    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] if `id` is not owned by this map.
    pub fn set_style_text(&mut self, id: EntryId, css: &str) -> Result<(), HighlightError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(HighlightError::UnknownEntry(id))?;
        entry.style = PropertyMap::parse(css);
        self.damage_if_grouped(id);
        Ok(())
    }

    /// Move the start boundary; an end before the new start collapses onto it.
    /// Spec: <https://dom.spec.whatwg.org/#concept-range-bp-set>
    ///
    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] if `id` is not owned by this map.
    pub fn set_start<Order: TreeOrder + ?Sized>(
        &mut self,
        id: EntryId,
        point: BoundaryPoint,
        order: &Order,
    ) -> Result<(), HighlightError> {
        let mut range = self.require(id)?.range.clone();
        range.start = point;
        if order.compare_points(range.start, range.end) == Some(Ordering::Greater) {
            range.end = point;
        }
        self.replace_range(id, range);
        Ok(())
    }

    /// Move the end boundary; a start after the new end collapses onto it.
    ///
    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] if `id` is not owned by this map.
    pub fn set_end<Order: TreeOrder + ?Sized>(
        &mut self,
        id: EntryId,
        point: BoundaryPoint,
        order: &Order,
    ) -> Result<(), HighlightError> {
        let mut range = self.require(id)?.range.clone();
        range.end = point;
        if order.compare_points(range.start, range.end) == Some(Ordering::Greater) {
            range.start = point;
        }
        self.replace_range(id, range);
        Ok(())
    }

    /// Replace both boundaries (and possibly the document). A range whose
    /// end precedes its start is collapsed to its start.
    ///
    /// # Errors
    /// Returns [`HighlightError::UnknownEntry`] if `id` is not owned by this map.
    pub fn set_range<Order: TreeOrder + ?Sized>(
        &mut self,
        id: EntryId,
        mut range: LiveRange,
        order: &Order,
    ) -> Result<(), HighlightError> {
        self.require(id)?;
        if order.compare_points(range.start, range.end) == Some(Ordering::Greater) {
            range.end = range.start;
        }
        self.replace_range(id, range);
        Ok(())
    }

    // ============================
    // Live range maintenance
    // ============================

    /// Run the live range update steps for every entry with a boundary in a
    /// node touched by `mutation`.
    pub fn apply_mutation(&mut self, mutation: &TreeMutation) {
        let watched: Vec<NodeKey> = match mutation {
            TreeMutation::ChildInserted { parent, .. } => vec![*parent],
            TreeMutation::ChildRemoved {
                parent, subtree, ..
            } => once(*parent).chain(subtree.iter().copied()).collect(),
            TreeMutation::TextReplaced { node, .. } => vec![*node],
            TreeMutation::AttributeChanged { .. } => return,
        };
        let mut affected: Vec<EntryId> = watched
            .iter()
            .filter_map(|node| self.boundary_index.get(node))
            .flatten()
            .copied()
            .collect();
        affected.sort_unstable();
        affected.dedup();
        for id in affected {
            let Some(entry) = self.entries.get(&id) else {
                continue;
            };
            let mut range = entry.range.clone();
            if range.adjust_for(mutation) {
                debug!(
                    "HighlightsMap: {id:?} boundaries moved from {:?} to {range:?}",
                    entry.range
                );
                self.replace_range(id, range);
            }
        }
    }

    // ============================
    // Invalidation queue
    // ============================

    /// Drain the queued invalidation requests.
    pub fn take_invalidations(&mut self) -> Vec<InvalidationRequest> {
        take(&mut self.pending)
    }

    pub fn pending_invalidations(&self) -> &[InvalidationRequest] {
        &self.pending
    }

    // ============================
    // Internals
    // ============================

    fn require(&self, id: EntryId) -> Result<&HighlightEntry, HighlightError> {
        self.entries
            .get(&id)
            .ok_or(HighlightError::UnknownEntry(id))
    }

    /// Check every handle and drop repeats, keeping first occurrences.
    fn validated(&self, ids: &[EntryId]) -> Result<Vec<EntryId>, HighlightError> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            self.require(*id)?;
            if seen.insert(*id) {
                out.push(*id);
            }
        }
        Ok(out)
    }

    fn ensure_group(&mut self, name: &str) {
        if self.slots.contains_key(name) {
            return;
        }
        let order = self.next_creation_order;
        self.next_creation_order = self.next_creation_order.saturating_add(1);
        self.slots.insert(name.to_owned(), order);
        self.groups.insert(
            order,
            HighlightGroup {
                name: name.to_owned(),
                creation_order: order,
                entries: Vec::new(),
            },
        );
        trace!("HighlightsMap: created group {name:?} at slot {order}");
    }

    /// Take `id` out of its current group before it joins `target`.
    fn detach_for(&mut self, id: EntryId, target: &str) {
        let Some(current) = self.entries.get(&id).and_then(|entry| entry.group.clone()) else {
            return;
        };
        if let Some(group) = self.group_mut(&current) {
            group.entries.retain(|member| *member != id);
        }
        if current != target {
            warn!("HighlightsMap: moving {id:?} from group {current:?} to {target:?}");
            self.pending.push(InvalidationRequest::Group(current));
        }
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.group = None;
        }
    }

    fn attach(&mut self, id: EntryId, name: &str) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.group = Some(name.to_owned());
        }
    }

    fn damage_entry(&mut self, id: EntryId) {
        if let Some(entry) = self.entries.get(&id) {
            self.pending
                .push(InvalidationRequest::Range(entry.range.clone()));
        }
    }

    fn damage_if_grouped(&mut self, id: EntryId) {
        if self.group_of(id).is_some() {
            self.damage_entry(id);
        }
    }

    fn replace_range(&mut self, id: EntryId, range: LiveRange) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        let prior = replace(&mut entry.range, range.clone());
        let grouped = entry.group.is_some();
        self.unsubscribe(id, &prior);
        self.subscribe(id, &range);
        if grouped {
            self.pending.push(InvalidationRequest::Range(prior));
            self.pending.push(InvalidationRequest::Range(range));
        }
    }

    /// Register `id` for mutations of its boundary nodes. Ranges in other
    /// documents are never adjusted by this view.
    fn subscribe(&mut self, id: EntryId, range: &LiveRange) {
        if range.document != self.document {
            return;
        }
        for node in range.boundary_nodes() {
            self.boundary_index.entry(node).or_default().insert(id);
        }
    }

    fn unsubscribe(&mut self, id: EntryId, range: &LiveRange) {
        for node in range.boundary_nodes() {
            if let Some(watchers) = self.boundary_index.get_mut(&node) {
                watchers.remove(&id);
                if watchers.is_empty() {
                    self.boundary_index.remove(&node);
                }
            }
        }
    }
}

/// Groups and their entries captured at one point in time, in creation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighlightsSnapshot {
    groups: Vec<(String, Vec<EntryId>)>,
}

impl HighlightsSnapshot {
    /// Restartable: each call walks the captured groups from the start.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EntryId])> + '_ {
        self.groups
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl IntoIterator for HighlightsSnapshot {
    type Item = (String, Vec<EntryId>);
    type IntoIter = IntoIter<(String, Vec<EntryId>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
