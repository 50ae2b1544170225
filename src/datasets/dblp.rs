use std::collections::HashMap;
use std::path::Path;

use anyhow::anyhow;
use candle_core::{DType, Device, Tensor};

use super::GraphData;

// ```python
// data = sio.loadmat("DBLP4057_GAT_with_idx.mat")
// labels, features = data["label"], data["features"].astype(np.float32)
// n = features.shape[0]
// net = lambda key: np.clip(data[key] - np.eye(n), 0.0, None).astype(np.float32)
// train, test = train_test_split(np.arange(n), stratify=labels.argmax(1), test_size=0.4)
// with open("dblp.npz", "wb") as f:
//     np.savez(f, features=features, net_apa=net("net_APA"),
//              net_apcpa=net("net_APCPA"), net_aptpa=net("net_APTPA"),
//              train_nodes=train, train_labels=labels[train],
//              test_nodes=test, test_labels=labels[test])
// ```
pub fn load_dblp<P: AsRef<Path>>(path: P, device: &Device) -> anyhow::Result<GraphData> {
    let mut arrays: HashMap<String, Tensor> =
        HashMap::from_iter(Tensor::read_npz(path.as_ref())?);
    let mut take = |key: &str| {
        arrays
            .remove(key)
            .ok_or_else(|| anyhow!("array {key:?} missing from the npz archive"))
    };
    let relations = vec![
        take("net_apa")?.to_dtype(DType::F32)?.to_device(device)?,
        take("net_apcpa")?.to_dtype(DType::F32)?.to_device(device)?,
        take("net_aptpa")?.to_dtype(DType::F32)?.to_device(device)?,
    ];
    Ok(GraphData {
        relations,
        features: take("features")?.to_dtype(DType::F32)?.to_device(device)?,
        train_nodes: take("train_nodes")?.to_dtype(DType::U32)?.to_device(device)?,
        train_labels: take("train_labels")?.to_dtype(DType::F32)?.to_device(device)?,
        test_nodes: take("test_nodes")?.to_dtype(DType::U32)?.to_device(device)?,
        test_labels: take("test_labels")?.to_dtype(DType::F32)?.to_device(device)?,
    })
}
