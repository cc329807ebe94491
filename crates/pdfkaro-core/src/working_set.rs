//! Ordered working set shared by every tool page
//!
//! Order is significant: it is the order of the submitted output. All
//! mutation goes through identity-based or index-based moves that keep the
//! set a permutation of what was added.

use crate::error::PdfKaroError;
use crate::page::{EntryId, PageEntry};

/// Anything that can live in a working set
pub trait Entry {
    fn id(&self) -> EntryId;
}

impl Entry for PageEntry {
    fn id(&self) -> EntryId {
        self.id
    }
}

#[derive(Debug, Clone)]
pub struct WorkingSet<T> {
    entries: Vec<T>,
}

impl<T> Default for WorkingSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Entry> WorkingSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push(entry);
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, entries: I) {
        self.entries.extend(entries);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id() == id)
    }

    pub fn get(&self, id: EntryId) -> Option<&T> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntryId) -> Option<&mut T> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    /// Remove at `from`, insert at `to`. Equal indices leave the set untouched.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<(), PdfKaroError> {
        let len = self.entries.len();
        for index in [from, to] {
            if index >= len {
                return Err(PdfKaroError::IndexOutOfBounds { index, len });
            }
        }
        if from == to {
            return Ok(());
        }
        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        Ok(())
    }

    /// Drag-and-drop form of [`move_entry`](Self::move_entry): move `active`
    /// to the slot currently held by `over`
    pub fn move_by_id(&mut self, active: EntryId, over: EntryId) -> Result<(), PdfKaroError> {
        if active == over {
            return Ok(());
        }
        let from = self
            .position(active)
            .ok_or(PdfKaroError::UnknownEntry(active.0))?;
        let to = self
            .position(over)
            .ok_or(PdfKaroError::UnknownEntry(over.0))?;
        self.move_entry(from, to)
    }

    /// Apply a full permutation: `new_order` lists current indices in the
    /// desired order
    pub fn reorder(&mut self, new_order: &[usize]) -> Result<(), PdfKaroError> {
        let len = self.entries.len();
        if new_order.len() != len {
            return Err(PdfKaroError::Validation(
                "Invalid order: wrong number of indices".into(),
            ));
        }

        let mut seen = vec![false; len];
        for &idx in new_order {
            if idx >= len {
                return Err(PdfKaroError::IndexOutOfBounds { index: idx, len });
            }
            if seen[idx] {
                return Err(PdfKaroError::Validation(
                    "Invalid order: duplicate index".into(),
                ));
            }
            seen[idx] = true;
        }

        let mut slots: Vec<Option<T>> = self.entries.drain(..).map(Some).collect();
        self.entries = new_order
            .iter()
            .filter_map(|&idx| slots[idx].take())
            .collect();
        Ok(())
    }

    pub fn remove(&mut self, id: EntryId) -> Result<T, PdfKaroError> {
        let pos = self.position(id).ok_or(PdfKaroError::UnknownEntry(id.0))?;
        Ok(self.entries.remove(pos))
    }
}

impl WorkingSet<PageEntry> {
    /// Rotate one page a quarter turn clockwise
    pub fn rotate(&mut self, id: EntryId) -> Result<(), PdfKaroError> {
        let entry = self
            .get_mut(id)
            .ok_or(PdfKaroError::UnknownEntry(id.0))?;
        entry.rotation = entry.rotation.rotate_cw();
        Ok(())
    }
}

impl<'a, T> IntoIterator for &'a WorkingSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
