//! The camp's shared stockpile.

use serde::{Deserialize, Serialize};

use crate::item::Item;

use super::blueprint::Components;

/// Items stored at a camp. Charge stacks merge; other items are kept one
/// per entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampInventory {
    items: Vec<Item>,
}

impl CampInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: Item) {
        if let Some(stack) = self.items.iter_mut().find(|s| s.stacks_with(&item)) {
            stack.charges += item.charges;
            return;
        }
        self.items.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = Item>) {
        for item in items {
            self.add(item);
        }
    }

    /// Units of `id` on hand.
    pub fn count(&self, id: &str) -> i64 {
        self.items.iter().filter(|i| i.type_id == id).map(Item::count).sum()
    }

    /// First component the stockpile can't cover `batch` times over, as
    /// `(id, needed, on hand)`.
    pub fn missing(&self, components: &Components, batch: i64) -> Option<(String, i64, i64)> {
        components.iter().find_map(|(id, &n)| {
            let need = n * batch;
            let have = self.count(id);
            (have < need).then(|| (id.clone(), need, have))
        })
    }

    /// Remove up to `count` units of `id`, splitting a charge stack if it
    /// holds more than asked for.
    pub fn take(&mut self, id: &str, count: i64) -> Vec<Item> {
        let mut taken = Vec::new();
        let mut left = count;
        let mut i = 0;
        while left > 0 && i < self.items.len() {
            if self.items[i].type_id != id {
                i += 1;
                continue;
            }
            let units = self.items[i].count();
            if units <= left {
                left -= units;
                taken.push(self.items.remove(i));
            } else {
                let stack = &mut self.items[i];
                stack.charges -= left as i32;
                let mut part = stack.clone();
                part.charges = left as i32;
                taken.push(part);
                left = 0;
            }
        }
        taken
    }

    /// Remove every component `batch` times over. Callers check
    /// [`CampInventory::missing`] first.
    pub fn consume(&mut self, components: &Components, batch: i64) -> Vec<Item> {
        components
            .iter()
            .flat_map(|(id, &n)| self.take(id, n * batch))
            .collect()
    }

    /// Take every item matching `pred`.
    pub fn drain_where(&mut self, mut pred: impl FnMut(&Item) -> bool) -> Vec<Item> {
        let (out, keep): (Vec<Item>, Vec<Item>) = std::mem::take(&mut self.items).into_iter().partition(|i| pred(i));
        self.items = keep;
        out
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
