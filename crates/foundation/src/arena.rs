use crate::ids::NodeIndex;

/// Append-only arena. Items are addressed by the [`NodeIndex`] returned from
/// [`Arena::alloc`] and live as long as the arena.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Arena { items: Vec::new() }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, v: T) -> NodeIndex {
        self.items.push(v);
        NodeIndex::new((self.items.len() - 1) as u32)
    }

    pub fn get(&self, idx: NodeIndex) -> Option<&T> {
        self.items.get(idx.index())
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> Option<&mut T> {
        self.items.get_mut(idx.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates `(index, item)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &T)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (NodeIndex::new(i as u32), v))
    }
}

impl<T> std::ops::Index<NodeIndex> for Arena<T> {
    type Output = T;

    fn index(&self, idx: NodeIndex) -> &T {
        &self.items[idx.index()]
    }
}

impl<T> std::ops::IndexMut<NodeIndex> for Arena<T> {
    fn index_mut(&mut self, idx: NodeIndex) -> &mut T {
        &mut self.items[idx.index()]
    }
}
