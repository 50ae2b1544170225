use candle_core::Tensor;

use crate::error::{Error, Result};

/// Dimensions a model needs to size its layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphInfo {
    pub num_nodes: usize,
    pub feature_dim: usize,
    pub num_classes: usize,
    pub num_relations: usize,
}

/// A multi-relation fraud graph: one dense adjacency matrix per relation
/// over a shared node space, node features, and a labelled train/test
/// split. Labels are one-hot rows aligned with the node id tensors.
#[derive(Debug, Clone)]
pub struct GraphData {
    pub relations: Vec<Tensor>,
    pub features: Tensor,
    pub train_nodes: Tensor,
    pub train_labels: Tensor,
    pub test_nodes: Tensor,
    pub test_labels: Tensor,
}

impl GraphData {
    pub fn info(&self) -> Result<GraphInfo> {
        let (num_nodes, feature_dim) = self.features.dims2()?;
        let (_, num_classes) = self.train_labels.dims2()?;
        Ok(GraphInfo {
            num_nodes,
            feature_dim,
            num_classes,
            num_relations: self.relations.len(),
        })
    }

    /// Checks the invariants every loader must deliver before training
    /// starts: square non-negative relations over the feature rows, node
    /// ids inside the graph, label rows aligned with the id tensors.
    pub fn validate(&self) -> Result<()> {
        let (num_nodes, _) = self.features.dims2()?;
        if self.relations.is_empty() {
            return Err(Error::InvalidConfig(
                "dataset carries no relations".to_string(),
            ));
        }
        for adj in &self.relations {
            let (rows, cols) = adj.dims2()?;
            if rows != cols {
                return Err(Error::NotSquare { rows, cols });
            }
            if rows != num_nodes {
                return Err(Error::ShapeMismatch(format!(
                    "relation is {rows}x{cols} but the graph has {num_nodes} nodes"
                )));
            }
            for (row, values) in adj.to_vec2::<f32>()?.iter().enumerate() {
                for (col, value) in values.iter().enumerate() {
                    if *value < 0.0 {
                        return Err(Error::NegativeEntry { row, col });
                    }
                }
            }
        }
        if self.train_nodes.dim(0)? == 0 {
            return Err(Error::InvalidConfig("training split is empty".to_string()));
        }
        check_split(&self.train_nodes, &self.train_labels, num_nodes)?;
        check_split(&self.test_nodes, &self.test_labels, num_nodes)?;
        let (_, train_classes) = self.train_labels.dims2()?;
        let (_, test_classes) = self.test_labels.dims2()?;
        if train_classes != test_classes {
            return Err(Error::ShapeMismatch(format!(
                "train labels have {train_classes} classes, test labels {test_classes}"
            )));
        }
        Ok(())
    }
}

fn check_split(nodes: &Tensor, labels: &Tensor, num_nodes: usize) -> Result<()> {
    let ids = nodes.to_vec1::<u32>()?;
    for &id in &ids {
        if id as usize >= num_nodes {
            return Err(Error::NodeOutOfRange {
                index: id as usize,
                num_nodes,
            });
        }
    }
    let (rows, _) = labels.dims2()?;
    if rows != ids.len() {
        return Err(Error::ShapeMismatch(format!(
            "split holds {} nodes but {rows} label rows",
            ids.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use candle_core::Device;

    use super::*;

    fn tiny_graph(device: &Device) -> candle_core::Result<GraphData> {
        let adj = Tensor::from_vec(vec![0.0f32, 1.0, 1.0, 0.0], (2, 2), device)?;
        Ok(GraphData {
            relations: vec![adj],
            features: Tensor::zeros((2, 3), candle_core::DType::F32, device)?,
            train_nodes: Tensor::from_vec(vec![0u32], 1, device)?,
            train_labels: Tensor::from_vec(vec![1.0f32, 0.0], (1, 2), device)?,
            test_nodes: Tensor::from_vec(vec![1u32], 1, device)?,
            test_labels: Tensor::from_vec(vec![0.0f32, 1.0], (1, 2), device)?,
        })
    }

    #[test]
    fn test_info_reads_dimensions() -> Result<()> {
        let data = tiny_graph(&Device::Cpu)?;
        let info = data.info()?;
        assert_eq!(
            info,
            GraphInfo {
                num_nodes: 2,
                feature_dim: 3,
                num_classes: 2,
                num_relations: 1,
            }
        );
        Ok(())
    }

    #[test]
    fn test_validate_accepts_consistent_graph() -> Result<()> {
        tiny_graph(&Device::Cpu)?.validate()
    }

    #[test]
    fn test_validate_rejects_non_square_relation() -> Result<()> {
        let device = Device::Cpu;
        let mut data = tiny_graph(&device)?;
        data.relations = vec![Tensor::zeros((2, 3), candle_core::DType::F32, &device)?];
        assert!(matches!(
            data.validate(),
            Err(Error::NotSquare { rows: 2, cols: 3 })
        ));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_negative_entry() -> Result<()> {
        let device = Device::Cpu;
        let mut data = tiny_graph(&device)?;
        data.relations =
            vec![Tensor::from_vec(vec![0.0f32, -1.0, 0.0, 0.0], (2, 2), &device)?];
        assert!(matches!(
            data.validate(),
            Err(Error::NegativeEntry { row: 0, col: 1 })
        ));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_out_of_range_node() -> Result<()> {
        let device = Device::Cpu;
        let mut data = tiny_graph(&device)?;
        data.test_nodes = Tensor::from_vec(vec![9u32], 1, &device)?;
        assert!(matches!(
            data.validate(),
            Err(Error::NodeOutOfRange { index: 9, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_misaligned_labels() -> Result<()> {
        let device = Device::Cpu;
        let mut data = tiny_graph(&device)?;
        data.train_labels = Tensor::zeros((3, 2), candle_core::DType::F32, &device)?;
        assert!(matches!(data.validate(), Err(Error::ShapeMismatch(_))));
        Ok(())
    }
}
