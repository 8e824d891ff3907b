//! Arena of layers linked by parent indices.
//!
//! Records are appended in creation order, so a child always sits after its
//! parent. Detaching only clears the `attached` flag: the record stays valid
//! for work items already queued in the running pass, and children keep
//! reaching ancestors through it. [`Hierarchy::compact`] drops records
//! nothing can reach once a pass is over.

use crate::effects::{Layer, LayerId};

struct Record {
    // Taken out while the layer walks.
    layer: Option<Layer>,
    parent: Option<usize>,
    attached: bool,
}

#[derive(Default)]
pub(crate) struct Hierarchy {
    records: Vec<Record>,
}

impl Hierarchy {
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn attach_root(&mut self, layer: Layer) -> usize {
        self.push(layer, None)
    }

    pub fn attach_child(&mut self, parent: usize, layer: Layer) -> usize {
        self.push(layer, Some(parent))
    }

    fn push(&mut self, layer: Layer, parent: Option<usize>) -> usize {
        self.records.push(Record {
            layer: Some(layer),
            parent,
            attached: true,
        });
        self.records.len() - 1
    }

    pub fn is_attached(&self, slot: usize) -> bool {
        self.records.get(slot).is_some_and(|r| r.attached)
    }

    pub fn parent_of(&self, slot: usize) -> Option<usize> {
        self.records.get(slot).and_then(|r| r.parent)
    }

    /// Remove `slot` from the live graph. Parentless entries stay attached.
    pub fn detach(&mut self, slot: usize) {
        if let Some(record) = self.records.get_mut(slot) {
            if record.parent.is_some() {
                record.attached = false;
            }
        }
    }

    /// Attached slots in insertion order.
    pub fn attached(&self) -> impl Iterator<Item = usize> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.attached)
            .map(|(slot, _)| slot)
    }

    pub fn len(&self) -> usize {
        self.attached().count()
    }

    /// Attached slot holding the layer `id`.
    pub fn find(&self, id: &LayerId) -> Option<usize> {
        self.attached()
            .find(|&slot| self.layer(slot).is_some_and(|layer| layer.id() == *id))
    }

    /// Attached slots whose parent chain passes through `ancestor`.
    pub fn descendants(&self, ancestor: usize) -> Vec<usize> {
        self.attached()
            .filter(|&slot| self.ancestors(slot).any(|a| a == ancestor))
            .collect()
    }

    fn ancestors(&self, slot: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.parent_of(slot), move |&a| self.parent_of(a))
    }

    pub fn layer(&self, slot: usize) -> Option<&Layer> {
        self.records.get(slot).and_then(|r| r.layer.as_ref())
    }

    pub fn layer_mut(&mut self, slot: usize) -> Option<&mut Layer> {
        self.records.get_mut(slot).and_then(|r| r.layer.as_mut())
    }

    pub fn take(&mut self, slot: usize) -> Option<Layer> {
        self.records.get_mut(slot).and_then(|r| r.layer.take())
    }

    pub fn restore(&mut self, slot: usize, layer: Layer) {
        if let Some(record) = self.records.get_mut(slot) {
            record.layer = Some(layer);
        }
    }

    /// Drop detached records that no attached record descends from, and
    /// renumber the rest. Must not run while slots are referenced.
    pub fn compact(&mut self) {
        let mut keep = vec![false; self.records.len()];
        for slot in self.attached().collect::<Vec<_>>() {
            keep[slot] = true;
            for ancestor in self.ancestors(slot) {
                keep[ancestor] = true;
            }
        }

        if keep.iter().all(|&k| k) {
            return;
        }

        let mut remap = vec![None; self.records.len()];
        let mut next = 0;
        for (slot, kept) in keep.iter().enumerate() {
            if *kept {
                remap[slot] = Some(next);
                next += 1;
            }
        }

        let records = std::mem::take(&mut self.records);
        self.records = records
            .into_iter()
            .zip(keep)
            .filter(|(_, kept)| *kept)
            .map(|(mut record, _)| {
                record.parent = record.parent.and_then(|p| remap[p]);
                record
            })
            .collect();
    }

    #[cfg(test)]
    pub fn records(&self) -> usize {
        self.records.len()
    }
}
