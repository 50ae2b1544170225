use candle_core::{Device, Tensor};

use crate::error::{Error, Result};

/// Reassembles sampled pairs into a count-weighted `n x n` matrix: entry
/// `[i, j]` counts the occurrences of `(i, j)` in the input, so reading the
/// nonzero entries back out recovers the input multiset.
///
/// Out-of-range indices are rejected rather than coerced.
pub fn pairs_to_matrix(pairs: &[(u32, u32)], num_nodes: usize, device: &Device) -> Result<Tensor> {
    let mut entries = vec![0.0f32; num_nodes * num_nodes];
    for &(i, j) in pairs {
        let (i, j) = (i as usize, j as usize);
        if i >= num_nodes {
            return Err(Error::NodeOutOfRange {
                index: i,
                num_nodes,
            });
        }
        if j >= num_nodes {
            return Err(Error::NodeOutOfRange {
                index: j,
                num_nodes,
            });
        }
        entries[i * num_nodes + j] += 1.0;
    }
    Ok(Tensor::from_vec(entries, (num_nodes, num_nodes), device)?)
}

#[cfg(test)]
mod tests {
    use candle_core::Device;

    use super::*;

    #[test]
    fn test_roundtrip_recovers_multiset() {
        let device = Device::Cpu;
        let mut pairs = vec![(0u32, 1u32), (1, 2), (0, 1), (2, 0)];
        let matrix = pairs_to_matrix(&pairs, 3, &device).unwrap();
        let entries = matrix.to_vec2::<f32>().unwrap();
        let mut recovered = Vec::new();
        for (i, row) in entries.iter().enumerate() {
            for (j, &count) in row.iter().enumerate() {
                for _ in 0..count as usize {
                    recovered.push((i as u32, j as u32));
                }
            }
        }
        pairs.sort_unstable();
        recovered.sort_unstable();
        assert_eq!(pairs, recovered);
    }

    #[test]
    fn test_duplicates_accumulate() {
        let device = Device::Cpu;
        let matrix = pairs_to_matrix(&[(1, 0), (1, 0), (1, 0)], 2, &device).unwrap();
        let entries = matrix.to_vec2::<f32>().unwrap();
        assert_eq!(entries[1][0], 3.0);
        assert_eq!(entries[0][1], 0.0);
    }

    #[test]
    fn test_rejects_out_of_range_pair() {
        let device = Device::Cpu;
        assert!(matches!(
            pairs_to_matrix(&[(0, 5)], 3, &device),
            Err(Error::NodeOutOfRange {
                index: 5,
                num_nodes: 3
            })
        ));
    }
}
