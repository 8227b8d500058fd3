//! The digraph set computation.
//!
//! Computes `F(x) = F'(x) ∪ ⋃ { F(y) | x R y }` over a relation `R` given as
//! a sparse adjacency map, in a single Tarjan-style traversal. `result`
//! enters holding `F'` and leaves holding `F`. Vertices of one strongly
//! connected component end up with equal sets; every non-trivial component
//! (size > 1) is returned so the caller can reject grammars whose cycles
//! carry non-empty sets.

use crate::types::{Map, Set as VertexSet};
use indexmap::map::Slice;
use std::{cmp, hash::Hash};

pub trait Set {
    fn union_with(&mut self, other: &Self);
}

impl<T> Set for VertexSet<T>
where
    T: Clone + Eq + Hash,
{
    fn union_with(&mut self, other: &Self) {
        self.extend(other.iter().cloned())
    }
}

pub fn digraph<K, T>(result: &mut Map<K, T>, edges: &Map<K, VertexSet<K>>) -> Vec<Vec<K>>
where
    K: Clone + Eq + Hash,
    T: Set,
{
    let keys: Vec<K> = result.keys().cloned().collect();
    // Successors resolved to slice indices up front; edges to vertices
    // outside `result` are ignored.
    let succ: Vec<Vec<usize>> = keys
        .iter()
        .map(|k| match edges.get(k) {
            Some(targets) => targets
                .iter()
                .filter_map(|y| result.get_index_of(y))
                .collect(),
            None => Vec::new(),
        })
        .collect();

    let mut traversal = Digraph {
        result: result.as_mut_slice(),
        succ: &succ,
        n: vec![0usize; keys.len()],
        stack: vec![],
        sccs: vec![],
    };
    traversal.run();
    let sccs = traversal.sccs;

    sccs.into_iter()
        .map(|component| component.into_iter().map(|i| keys[i].clone()).collect())
        .collect()
}

struct Digraph<'a, K, T> {
    result: &'a mut Slice<K, T>,
    succ: &'a [Vec<usize>],
    n: Vec<usize>,
    stack: Vec<usize>,
    sccs: Vec<Vec<usize>>,
}

impl<K, T> Digraph<'_, K, T>
where
    T: Set,
{
    fn run(&mut self) {
        for x in 0..self.succ.len() {
            if self.n[x] == 0 {
                self.traverse(x);
            }
        }
    }

    fn traverse(&mut self, x: usize) {
        self.stack.push(x);
        let d = self.stack.len();
        self.n[x] = d;

        let mut i = 0;
        while i < self.succ[x].len() {
            let y = self.succ[x][i];
            i += 1;

            if self.n[y] == 0 {
                self.traverse(y);
            }
            self.n[x] = cmp::min(self.n[x], self.n[y]);

            if x != y {
                // F(x) <- F(x) ∪ F(y)
                let (slot, added) = get_two_mut(&mut *self.result, x, y);
                slot.union_with(added);
            }
        }

        if self.n[x] != d {
            return;
        }

        let mut component = vec![x];
        while let Some(s) = self.stack.pop() {
            self.n[s] = usize::MAX;
            if s == x {
                break;
            }
            component.push(s);
            // F(s) <- F(x)
            let (slot, added) = get_two_mut(&mut *self.result, s, x);
            slot.union_with(added);
        }
        if component.len() > 1 {
            self.sccs.push(component);
        }
    }
}

fn get_two_mut<K, V>(slice: &mut Slice<K, V>, x: usize, y: usize) -> (&mut V, &mut V) {
    assert!(
        x != y && cmp::max(x, y) < slice.len(),
        "index condition not satisfied"
    );
    let i = (x + y) / 2 + 1;
    let (a, b) = slice.split_at_mut(i);
    if x < y {
        (&mut a[x], &mut b[y - i])
    } else {
        (&mut b[x - i], &mut a[y])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(
        base: &[(&'static str, &'static [u32])],
        edges: &[(&'static str, &'static str)],
    ) -> (
        Map<&'static str, VertexSet<u32>>,
        Map<&'static str, VertexSet<&'static str>>,
    ) {
        let mut result = Map::default();
        for (k, values) in base {
            result.insert(*k, values.iter().copied().collect::<VertexSet<u32>>());
        }
        let mut adjacency = Map::<_, VertexSet<&str>>::default();
        for (from, to) in edges {
            adjacency.entry(*from).or_default().insert(*to);
        }
        (result, adjacency)
    }

    #[test]
    fn propagates_along_a_chain() {
        let (mut result, edges) = setup(
            &[("a", &[1]), ("b", &[2]), ("c", &[3])],
            &[("a", "b"), ("b", "c")],
        );
        let sccs = digraph(&mut result, &edges);
        assert!(sccs.is_empty());
        assert_eq!(result["a"], [1, 2, 3].into_iter().collect::<VertexSet<u32>>());
        assert_eq!(result["b"], [2, 3].into_iter().collect::<VertexSet<u32>>());
        assert_eq!(result["c"], [3].into_iter().collect::<VertexSet<u32>>());
    }

    #[test]
    fn cycle_members_share_one_set() {
        let (mut result, edges) = setup(
            &[("a", &[1]), ("b", &[2]), ("c", &[3])],
            &[("a", "b"), ("b", "a"), ("b", "c")],
        );
        let sccs = digraph(&mut result, &edges);
        assert_eq!(sccs.len(), 1);
        let mut cycle = sccs[0].clone();
        cycle.sort();
        assert_eq!(cycle, ["a", "b"]);
        assert_eq!(result["a"], [1, 2, 3].into_iter().collect::<VertexSet<u32>>());
        assert_eq!(result["b"], [1, 2, 3].into_iter().collect::<VertexSet<u32>>());
        assert_eq!(result["c"], [3].into_iter().collect::<VertexSet<u32>>());
    }

    #[test]
    fn self_loop_is_a_trivial_component() {
        let (mut result, edges) = setup(&[("a", &[1])], &[("a", "a")]);
        let sccs = digraph(&mut result, &edges);
        assert!(sccs.is_empty());
        assert_eq!(result["a"], [1].into_iter().collect::<VertexSet<u32>>());
    }

    #[test]
    fn test_get_two_mut() {
        let mut map = Map::default();
        map.insert("a", "a");
        map.insert("b", "b");
        map.insert("c", "c");
        map.insert("d", "d");
        let slice = map.as_mut_slice();
        assert!(matches!(get_two_mut(slice, 0, 1), t if *t.0=="a" && *t.1=="b"));
        assert!(matches!(get_two_mut(slice, 1, 0), t if *t.0=="b" && *t.1=="a"));
        assert!(matches!(get_two_mut(slice, 0, 2), t if *t.0=="a" && *t.1=="c"));
        assert!(matches!(get_two_mut(slice, 2, 1), t if *t.0=="c" && *t.1=="b"));
        assert!(matches!(get_two_mut(slice, 3, 2), t if *t.0=="d" && *t.1=="c"));
    }
}
