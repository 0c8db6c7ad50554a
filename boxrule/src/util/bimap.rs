use std::collections::HashMap;
use std::hash::Hash;

/// A one-to-one map. Neither side may hold a key twice, which is exactly the
/// injectivity requirement of an embedding.
#[derive(Debug, Clone)]
pub struct BiMap<L, R> {
    left_to_right: HashMap<L, R>,
    right_to_left: HashMap<R, L>,
}

impl<L: Eq + Hash + Clone, R: Eq + Hash + Clone> Default for BiMap<L, R> {
    fn default() -> Self {
        BiMap::new()
    }
}

impl<L: Eq + Hash + Clone, R: Eq + Hash + Clone> BiMap<L, R> {
    pub fn new() -> Self {
        BiMap {
            left_to_right: HashMap::new(),
            right_to_left: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.left_to_right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left_to_right.is_empty()
    }

    pub fn into_left_map(self) -> HashMap<L, R> {
        self.left_to_right
    }

    pub fn left_map(&self) -> &HashMap<L, R> {
        &self.left_to_right
    }

    /// Inserts the pair if neither side is already present.
    ///
    /// Returns `false` and leaves the map untouched otherwise.
    pub fn insert(&mut self, left: L, right: R) -> bool {
        if self.left_to_right.contains_key(&left) || self.right_to_left.contains_key(&right) {
            return false;
        }
        self.left_to_right.insert(left.clone(), right.clone());
        self.right_to_left.insert(right, left);
        true
    }

    pub fn get_left(&self, left: &L) -> Option<&R> {
        self.left_to_right.get(left)
    }

    pub fn get_right(&self, right: &R) -> Option<&L> {
        self.right_to_left.get(right)
    }

    pub fn contains_left(&self, left: &L) -> bool {
        self.left_to_right.contains_key(left)
    }

    pub fn contains_right(&self, right: &R) -> bool {
        self.right_to_left.contains_key(right)
    }

    pub fn remove_left(&mut self, left: &L) -> Option<R> {
        if let Some(right) = self.left_to_right.remove(left) {
            self.right_to_left.remove(&right);
            Some(right)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&L, &R)> {
        self.left_to_right.iter()
    }
}

impl<L: Eq + Hash + Clone, R: Eq + Hash + Clone> FromIterator<(L, R)> for BiMap<L, R> {
    /// Pairs that would break injectivity are dropped.
    fn from_iter<T: IntoIterator<Item = (L, R)>>(iter: T) -> Self {
        let mut map = BiMap::new();
        for (left, right) in iter {
            map.insert(left, right);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_second_image() {
        let mut map = BiMap::new();
        assert!(map.insert(1, 'a'));
        assert!(!map.insert(2, 'a'));
        assert!(!map.insert(1, 'b'));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_right(&'a'), Some(&1));
    }

    #[test]
    fn remove_frees_both_sides() {
        let mut map = BiMap::new();
        map.insert(1, 'a');
        assert_eq!(map.remove_left(&1), Some('a'));
        assert!(!map.contains_right(&'a'));
        assert!(map.insert(2, 'a'));
    }
}
