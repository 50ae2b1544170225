use rand::Rng;

use crate::graph::AdjacencyList;

/// Positive pairs for one relation, in walk emission order.
pub type PairPool = Vec<(u32, u32)>;

/// Harvests `(current, next)` transitions from uniform random walks.
///
/// Nodes are visited in index order; every node with at least one neighbor
/// starts `walks_per_node` walks of `walk_length` steps. Each step moves to
/// a uniformly chosen neighbor and emits one pair. A walk reaching a
/// neighborless node stops early, and a neighborless start contributes
/// nothing rather than failing.
///
/// Given the same seeded `rng` and the same list, the pool is reproducible
/// bit for bit.
pub fn random_walk_pairs<R: Rng>(
    adj: &AdjacencyList,
    walk_length: usize,
    walks_per_node: usize,
    rng: &mut R,
) -> PairPool {
    let mut pool = Vec::new();
    for start in 0..adj.num_nodes() {
        if adj.degree(start) == 0 {
            continue;
        }
        for _ in 0..walks_per_node {
            let mut current = start;
            for _ in 0..walk_length {
                let neighbors = adj.neighbors(current);
                if neighbors.is_empty() {
                    break;
                }
                let next = neighbors[rng.gen_range(0..neighbors.len())];
                pool.push((current as u32, next));
                current = next as usize;
            }
        }
    }
    pool
}

#[cfg(test)]
mod tests {
    use candle_core::{Device, Tensor};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn ring4() -> AdjacencyList {
        let entries = vec![
            0.0f32, 1.0, 0.0, 1.0, //
            1.0, 0.0, 1.0, 0.0, //
            0.0, 1.0, 0.0, 1.0, //
            1.0, 0.0, 1.0, 0.0,
        ];
        let adj = Tensor::from_vec(entries, (4, 4), &Device::Cpu).unwrap();
        AdjacencyList::from_dense(&adj, false).unwrap()
    }

    #[test]
    fn test_same_seed_same_pool() {
        let adj = ring4();
        let mut rng = StdRng::seed_from_u64(123);
        let first = random_walk_pairs(&adj, 5, 4, &mut rng);
        let mut rng = StdRng::seed_from_u64(123);
        let second = random_walk_pairs(&adj, 5, 4, &mut rng);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_pairs_are_edges() {
        let adj = ring4();
        let mut rng = StdRng::seed_from_u64(7);
        for (i, j) in random_walk_pairs(&adj, 6, 2, &mut rng) {
            assert!(adj.contains(i as usize, j));
            assert_ne!(i, j);
        }
    }

    #[test]
    fn test_every_step_emits_one_pair() {
        // no dead ends in a ring, so the pool size is exact
        let adj = ring4();
        let mut rng = StdRng::seed_from_u64(0);
        let pool = random_walk_pairs(&adj, 3, 2, &mut rng);
        assert_eq!(pool.len(), 4 * 2 * 3);
    }

    #[test]
    fn test_isolated_node_is_skipped() {
        let entries = vec![
            0.0f32, 1.0, 0.0, //
            1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0,
        ];
        let adj = Tensor::from_vec(entries, (3, 3), &Device::Cpu).unwrap();
        let list = AdjacencyList::from_dense(&adj, false).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let pool = random_walk_pairs(&list, 4, 2, &mut rng);
        assert!(!pool.is_empty());
        for (i, _) in pool {
            assert_ne!(i, 2);
        }
    }
}
