use super::residue_type::BondGraph;
use std::collections::VecDeque;

/// Ring membership of the atoms of one residue type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RingData {
    /// `flags[i]` is set if atom `i` lies on a ring.
    pub flags: Vec<bool>,
    /// Rings as lists of residue-local atom indices.
    pub rings: Vec<Vec<usize>>,
    /// Indices into `rings` for every atom.
    pub atom_rings: Vec<Vec<usize>>,
}

impl RingData {
    /// Index of the first ring that contains both atoms.
    pub fn shared_ring(&self, a: usize, b: usize) -> Option<&[usize]> {
        self.atom_rings[a]
            .iter()
            .find(|ring| self.atom_rings[b].contains(ring))
            .map(|&ring| self.rings[ring].as_slice())
    }
}

/// Atoms traced along the predecessor chain from each end of a closing bond.
const MAX_TRACE_DEPTH: usize = 4;

struct RingSearch<'a> {
    graph: &'a BondGraph,
    visited: Vec<bool>,
    pred: Vec<Option<usize>>,
    color: Vec<usize>,
    current_color: usize,
    rings: Vec<Vec<usize>>,
}

impl RingSearch<'_> {
    /// Breadth-first search from `root`; every non-tree bond is tried as a ring closure.
    fn search_from(&mut self, root: usize) {
        let graph = self.graph;
        let mut queue = VecDeque::from([root]);
        self.visited[root] = true;

        while let Some(top) = queue.pop_front() {
            for &other in graph.neighbors(top) {
                if !self.visited[other] {
                    self.visited[other] = true;
                    self.pred[other] = Some(top);
                    queue.push_back(other);
                } else if top < other && self.pred[other] != Some(top) && self.pred[top] != Some(other) {
                    self.close_ring(top, other);
                }
            }
        }
    }

    /// Joins the predecessor chains of `a` and `b` at their nearest common atom.
    fn close_ring(&mut self, a: usize, b: usize) {
        self.current_color += 1;
        let color = self.current_color;

        let mut current = Some(a);
        for _ in 0..MAX_TRACE_DEPTH {
            let Some(atom) = current else { break };
            self.color[atom] = color;
            current = self.pred[atom];
        }

        let mut right = Vec::with_capacity(MAX_TRACE_DEPTH);
        let mut target = None;
        let mut current = Some(b);
        for _ in 0..MAX_TRACE_DEPTH {
            let Some(atom) = current else { break };
            if self.color[atom] == color {
                target = Some(atom);
                break;
            }
            right.push(atom);
            current = self.pred[atom];
        }
        let Some(target) = target else {
            return;
        };

        let mut ring = Vec::with_capacity(2 * MAX_TRACE_DEPTH);
        let mut current = Some(a);
        for _ in 0..MAX_TRACE_DEPTH {
            let Some(atom) = current else { break };
            ring.push(atom);
            if atom == target {
                break;
            }
            current = self.pred[atom];
        }
        ring.extend(right.into_iter().rev());
        self.rings.push(ring);
    }
}

/// Finds small rings in a residue-local bond graph.
///
/// A breadth-first search builds a predecessor tree; each bond outside the tree closes a
/// ring if both of its atoms reach a common ancestor within [`MAX_TRACE_DEPTH`] steps.
/// Rings of up to seven atoms are found this way. Larger cycles are not reported, and
/// for fused or bridged systems the reported rings are not a minimal cycle basis.
pub fn find_rings(graph: &BondGraph) -> RingData {
    let atom_count = graph.atom_count();
    let mut search = RingSearch {
        graph,
        visited: vec![false; atom_count],
        pred: vec![None; atom_count],
        color: vec![0; atom_count],
        current_color: 0,
        rings: Vec::new(),
    };

    for atom in 0..atom_count {
        if !search.visited[atom] {
            search.search_from(atom);
        }
    }

    let mut flags = vec![false; atom_count];
    let mut atom_rings = vec![Vec::new(); atom_count];
    for (ring_index, ring) in search.rings.iter().enumerate() {
        for &atom in ring {
            flags[atom] = true;
            atom_rings[atom].push(ring_index);
        }
    }

    RingData {
        flags,
        rings: search.rings,
        atom_rings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(atom_count: usize, bonds: &[(usize, usize)]) -> BondGraph {
        let (first, second): (Vec<usize>, Vec<usize>) = bonds.iter().copied().unzip();
        BondGraph::new(atom_count, &first, &second)
    }

    #[test]
    fn chain_has_no_rings() {
        let rings = find_rings(&graph(4, &[(0, 1), (1, 2), (2, 3)]));
        assert!(rings.rings.is_empty());
        assert!(rings.flags.iter().all(|&f| !f));
    }

    #[test]
    fn six_ring_with_substituent_flags_ring_atoms_only() {
        let bonds = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 6)];
        let rings = find_rings(&graph(7, &bonds));
        assert_eq!(rings.rings.len(), 1);
        let mut ring = rings.rings[0].clone();
        ring.sort_unstable();
        assert_eq!(ring, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(rings.flags, vec![true, true, true, true, true, true, false]);
        assert_eq!(rings.atom_rings[6], Vec::<usize>::new());
    }

    #[test]
    fn fused_rings_flag_every_ring_atom() {
        // naphthalene-like: two six rings sharing the 0-5 edge
        let bonds = [
            (0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0),
            (5, 6), (6, 7), (7, 8), (8, 9), (9, 0),
        ];
        let rings = find_rings(&graph(10, &bonds));
        assert!(rings.rings.len() >= 2);
        assert!(rings.flags.iter().all(|&f| f));
    }

    #[test]
    fn shared_ring_finds_common_ring() {
        let bonds = [(0, 1), (1, 2), (2, 0), (2, 3)];
        let rings = find_rings(&graph(4, &bonds));
        assert!(rings.shared_ring(0, 1).is_some());
        assert!(rings.shared_ring(2, 3).is_none());
    }

    #[test]
    fn long_chain_is_searched_without_recursion() {
        let n = 60_000;
        let first: Vec<usize> = (0..n - 1).collect();
        let second: Vec<usize> = (1..n).collect();
        let rings = find_rings(&BondGraph::new(n, &first, &second));
        assert!(rings.rings.is_empty());
        assert_eq!(rings.flags.len(), n);
    }

    #[test]
    fn macrocycles_are_not_reported() {
        let n = 30;
        let bonds: Vec<(usize, usize)> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        let rings = find_rings(&graph(n, &bonds));
        assert!(rings.rings.is_empty());
        assert!(rings.flags.iter().all(|&f| !f));
    }

    #[test]
    fn seven_ring_is_the_largest_reported() {
        let seven: Vec<(usize, usize)> = (0..7).map(|i| (i, (i + 1) % 7)).collect();
        let rings = find_rings(&graph(7, &seven));
        assert_eq!(rings.rings.len(), 1);
        let mut ring = rings.rings[0].clone();
        ring.sort_unstable();
        assert_eq!(ring, (0..7).collect::<Vec<_>>());

        let eight: Vec<(usize, usize)> = (0..8).map(|i| (i, (i + 1) % 8)).collect();
        assert!(find_rings(&graph(8, &eight)).rings.is_empty());
    }
}
