use candle_core::{Device, Tensor};

use crate::error::{Error, Result};

/// Sentinel filling the padded tail of a fixed-width neighbor row.
pub const PADDING: u32 = u32::MAX;

/// Per-node neighbor lists extracted from a dense adjacency matrix.
///
/// Self-loops in the input never become neighbors: the lists feed walk
/// sampling, where a self-transition is meaningless. Padding, when
/// requested, is always a suffix of [`PADDING`] entries.
#[derive(Debug, Clone)]
pub struct AdjacencyList {
    neighbors: Vec<Vec<u32>>,
    width: Option<usize>,
}

impl AdjacencyList {
    /// Extracts neighbor lists from a square dense matrix. A neighbor of `i`
    /// is every `j != i` with a nonzero entry at `[i, j]`.
    ///
    /// With `pad` set, every row is right-padded with [`PADDING`] to the
    /// maximum observed degree so consumers can treat the rows as one
    /// fixed-shape array. A node without neighbors yields an empty list
    /// (unpadded) or an all-sentinel row (padded).
    pub fn from_dense(adj: &Tensor, pad: bool) -> Result<Self> {
        let (rows, cols) = adj.dims2()?;
        if rows != cols {
            return Err(Error::NotSquare { rows, cols });
        }
        let entries = adj.to_vec2::<f32>()?;
        let mut neighbors = Vec::with_capacity(rows);
        for (i, row) in entries.iter().enumerate() {
            let mut list = Vec::new();
            for (j, &value) in row.iter().enumerate() {
                if value != 0.0 && i != j {
                    list.push(j as u32);
                }
            }
            neighbors.push(list);
        }
        let width = if pad {
            let max_degree = neighbors.iter().map(Vec::len).max().unwrap_or(0);
            for list in neighbors.iter_mut() {
                list.resize(max_degree, PADDING);
            }
            Some(max_degree)
        } else {
            None
        };
        Ok(Self { neighbors, width })
    }

    pub fn num_nodes(&self) -> usize {
        self.neighbors.len()
    }

    /// Row width when the list was built with padding.
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Real neighbors of `node`, with any padded tail stripped.
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let row = &self.neighbors[node];
        &row[..self.degree(node)]
    }

    /// Number of real neighbors of `node`.
    pub fn degree(&self, node: usize) -> usize {
        self.neighbors[node]
            .iter()
            .take_while(|&&j| j != PADDING)
            .count()
    }

    /// Whether `candidate` is a neighbor of `node`.
    pub fn contains(&self, node: usize, candidate: u32) -> bool {
        self.neighbors(node).contains(&candidate)
    }

    /// Exports the lists as a `[num_nodes, width]` index tensor plus a
    /// matching 0/1 mask. Rows are truncated or right-padded to `width`;
    /// padded slots are redirected to index 0 so they stay gatherable, with
    /// the mask zeroing their contribution.
    pub fn neighbor_tensors(&self, width: usize, device: &Device) -> Result<(Tensor, Tensor)> {
        if width == 0 {
            return Err(Error::ShapeMismatch(
                "neighbor tensors need a positive width".to_string(),
            ));
        }
        let n = self.neighbors.len();
        let mut indices = Vec::with_capacity(n * width);
        let mut mask = Vec::with_capacity(n * width);
        for node in 0..n {
            let row = self.neighbors(node);
            for slot in 0..width {
                match row.get(slot) {
                    Some(&j) => {
                        indices.push(j);
                        mask.push(1.0f32);
                    }
                    None => {
                        indices.push(0);
                        mask.push(0.0);
                    }
                }
            }
        }
        let indices = Tensor::from_vec(indices, (n, width), device)?;
        let mask = Tensor::from_vec(mask, (n, width), device)?;
        Ok((indices, mask))
    }
}

#[cfg(test)]
mod tests {
    use candle_core::{Device, Tensor};

    use super::*;

    fn sample(device: &Device) -> Tensor {
        // node 0: neighbors 1, 2 (plus an ignored self-loop)
        // node 1: neighbor 0
        // node 2: isolated apart from the inbound edge
        let entries = vec![
            1.0f32, 0.5, 2.0, //
            1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0,
        ];
        Tensor::from_vec(entries, (3, 3), device).unwrap()
    }

    #[test]
    fn test_self_loops_are_not_neighbors() {
        let list = AdjacencyList::from_dense(&sample(&Device::Cpu), false).unwrap();
        for node in 0..list.num_nodes() {
            assert!(!list.contains(node, node as u32));
        }
        assert_eq!(list.neighbors(0), &[1, 2]);
        assert_eq!(list.neighbors(1), &[0]);
    }

    #[test]
    fn test_isolated_node_has_empty_list() {
        let list = AdjacencyList::from_dense(&sample(&Device::Cpu), false).unwrap();
        assert_eq!(list.degree(2), 0);
        assert!(list.neighbors(2).is_empty());
        assert_eq!(list.width(), None);
    }

    #[test]
    fn test_padding_fills_to_max_degree() {
        let list = AdjacencyList::from_dense(&sample(&Device::Cpu), true).unwrap();
        assert_eq!(list.width(), Some(2));
        // padded tail never leaks into the neighbor view
        assert_eq!(list.neighbors(1), &[0]);
        assert_eq!(list.degree(1), 1);
        // the isolated node becomes an all-sentinel row
        assert_eq!(list.degree(2), 0);
        assert!(list.neighbors(2).is_empty());
    }

    #[test]
    fn test_neighbor_tensors_mask_padding() {
        let device = Device::Cpu;
        let list = AdjacencyList::from_dense(&sample(&device), true).unwrap();
        let (indices, mask) = list.neighbor_tensors(3, &device).unwrap();
        assert_eq!(indices.dims(), &[3, 3]);
        let indices = indices.to_vec2::<u32>().unwrap();
        let mask = mask.to_vec2::<f32>().unwrap();
        assert_eq!(indices[0], vec![1, 2, 0]);
        assert_eq!(mask[0], vec![1.0, 1.0, 0.0]);
        assert_eq!(mask[1], vec![1.0, 0.0, 0.0]);
        assert_eq!(mask[2], vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_neighbor_tensors_truncate_to_width() {
        let device = Device::Cpu;
        let list = AdjacencyList::from_dense(&sample(&device), false).unwrap();
        let (indices, mask) = list.neighbor_tensors(1, &device).unwrap();
        let indices = indices.to_vec2::<u32>().unwrap();
        let mask = mask.to_vec2::<f32>().unwrap();
        assert_eq!(indices[0], vec![1]);
        assert_eq!(mask[0], vec![1.0]);
    }

    #[test]
    fn test_rejects_non_square_input() {
        let device = Device::Cpu;
        let adj = Tensor::zeros((3, 2), candle_core::DType::F32, &device).unwrap();
        assert!(matches!(
            AdjacencyList::from_dense(&adj, false),
            Err(Error::NotSquare { rows: 3, cols: 2 })
        ));
    }
}
