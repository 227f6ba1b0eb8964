//! Mechanism for searching free identifiers ("holes") in the index space

use crate::store::{Link, Store};

use std::collections::BTreeMap;


/// Location of a free identifier, as found by `search()`
///
/// Besides the free relative index itself, the hole remembers where an entry
/// carrying that index must be spliced into the sequential index, so that the
/// allocation does not need to search for it a second time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Hole {
    /// Lowest free relative index within the requested range
    pub index: usize,

    /// Position of that index within the sequential index
    pub link: Link,
}

/// Search the lowest free relative index within `[min, max)`
///
/// Index 0 is reserved, so `min` is raised to 1 if need be. Returns `None` if
/// every index of the range is taken, or if the range is empty.
///
/// The ordered index is used to find the entry at `min` (or the closest one
/// below it) in logarithmic time. If `min` is taken, the sequential index is
/// then walked forward from there until the first gap, which is cheap in the
/// common case where low identifiers are densely allocated.
pub(crate) fn search<T>(
    tree: &BTreeMap<usize, usize>,
    store: &Store<T>,
    min: usize,
    max: usize,
) -> Option<Hole> {
    let min = min.max(1);
    if min >= max {
        return None;
    }

    // Look up the entry with the greatest index <= min. If it is not an exact
    // match, min is free and goes right after that entry.
    let mut key = match tree.range(..=min).next_back() {
        Some((&index, &key)) if index == min => key,
        Some((_, &below_key)) => {
            return Some(Hole {
                index: min,
                link: store.link_after(below_key),
            });
        }
        None => {
            return Some(Hole {
                index: min,
                link: store.link_first(),
            });
        }
    };

    // Otherwise, follow the run of consecutive indices that starts at min
    for walk in (min + 1)..max {
        let next_key = match store.next_key(key) {
            Some(next_key) => next_key,
            None => {
                return Some(Hole {
                    index: walk,
                    link: Link::Tail,
                });
            }
        };
        if store[next_key].index != walk {
            return Some(Hole {
                index: walk,
                link: Link::Before(next_key),
            });
        }
        key = next_key;
    }

    // The run covers the end of the range
    None
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Origin;

    /// Build both indices with the given (sorted) set of taken indices
    fn indices_with(taken: &[usize]) -> (BTreeMap<usize, usize>, Store<()>) {
        let mut tree = BTreeMap::new();
        let mut store = Store::new(taken.len(), None);
        for &index in taken {
            let key = store.insert(index, (), Origin::Allocator, Link::Tail);
            tree.insert(index, key);
        }
        (tree, store)
    }

    fn key_of(tree: &BTreeMap<usize, usize>, index: usize) -> usize {
        tree[&index]
    }

    #[test]
    fn empty_space() {
        let (tree, store) = indices_with(&[]);
        assert_eq!(search(&tree, &store, 0, usize::MAX),
                   Some(Hole { index: 1, link: Link::Tail }));
        assert_eq!(search(&tree, &store, 7, 8),
                   Some(Hole { index: 7, link: Link::Tail }));
    }

    #[test]
    fn empty_range() {
        let (tree, store) = indices_with(&[]);
        assert_eq!(search(&tree, &store, 4, 4), None);
        assert_eq!(search(&tree, &store, 0, 1), None);
        assert_eq!(search(&tree, &store, 9, 3), None);
    }

    #[test]
    fn free_minimum() {
        let (tree, store) = indices_with(&[3, 4, 8]);

        // Below every entry
        assert_eq!(search(&tree, &store, 1, 10),
                   Some(Hole { index: 1, link: Link::Before(key_of(&tree, 3)) }));

        // Between two entries
        assert_eq!(search(&tree, &store, 6, 10),
                   Some(Hole { index: 6, link: Link::Before(key_of(&tree, 8)) }));

        // Above every entry
        assert_eq!(search(&tree, &store, 9, 10),
                   Some(Hole { index: 9, link: Link::Tail }));
    }

    #[test]
    fn walk_to_gap() {
        let (tree, store) = indices_with(&[1, 2, 3, 5, 6, 9]);

        assert_eq!(search(&tree, &store, 0, 100),
                   Some(Hole { index: 4, link: Link::Before(key_of(&tree, 5)) }));
        assert_eq!(search(&tree, &store, 5, 100),
                   Some(Hole { index: 7, link: Link::Before(key_of(&tree, 9)) }));
        assert_eq!(search(&tree, &store, 9, 100),
                   Some(Hole { index: 10, link: Link::Tail }));
    }

    #[test]
    fn walk_to_exhaustion() {
        let (tree, store) = indices_with(&[1, 2, 3, 5]);

        assert_eq!(search(&tree, &store, 1, 4), None);
        assert_eq!(search(&tree, &store, 0, 3), None);
        assert_eq!(search(&tree, &store, 5, 6), None);

        // One more slot at the end of the range is enough
        assert_eq!(search(&tree, &store, 1, 5),
                   Some(Hole { index: 4, link: Link::Before(key_of(&tree, 5)) }));
    }
}
