use std::path::Path;

use anyhow::bail;
use candle_core::{Device, Tensor};
use itertools::{izip, Itertools};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::GraphData;

const RELATION_FILES: [&str; 3] = ["net_rur.csv", "net_rtr.csv", "net_rsr.csv"];

// ```python
// data = sio.loadmat("YelpChi.mat")
// features = np.asarray(data["features"].todense(), dtype=np.float32)
// labels = data["label"].flatten().astype(int)
// nodes = pd.DataFrame(features, columns=[f"f{i}" for i in range(features.shape[1])])
// nodes.insert(0, "label", labels)
// nodes.insert(0, "id", np.arange(len(labels)))
// nodes.to_csv("nodes.csv", index=False)
// for key in ["net_rur", "net_rtr", "net_rsr"]:
//     u, v = sp.triu(data[key], k=1).nonzero()
//     pd.DataFrame({"source": u, "target": v}).to_csv(f"{key}.csv", index=False)
// ```
pub fn load_yelp<P: AsRef<Path>>(
    root: P,
    train_fraction: f64,
    seed: u64,
    device: &Device,
) -> anyhow::Result<GraphData> {
    let root = root.as_ref();
    let node_df = CsvReader::from_path(root.join("nodes.csv"))?
        .has_header(true)
        .finish()?;
    let num_nodes = node_df.height();
    if num_nodes == 0 {
        bail!("nodes.csv holds no reviews");
    }

    // Row position doubles as node id everywhere downstream.
    let ids = node_df.column("id")?.cast(&DataType::UInt32)?;
    for (row, id) in ids.u32()?.into_no_null_iter().enumerate() {
        if id as usize != row {
            bail!("review ids must be dense and ordered, found id {id} at row {row}");
        }
    }

    let label_column = node_df.column("label")?.cast(&DataType::UInt32)?;
    let labels = label_column.u32()?.into_no_null_iter().collect_vec();
    let num_classes = match labels.iter().max() {
        Some(&top) => top as usize + 1,
        None => 0,
    };
    if num_classes < 2 {
        bail!("nodes.csv must carry at least two label classes");
    }

    let feature_cols = node_df
        .get_column_names()
        .into_iter()
        .filter(|name| name.starts_with('f'))
        .map(|name| name.to_string())
        .collect_vec();
    if feature_cols.is_empty() {
        bail!("nodes.csv has no feature columns (expected names starting with 'f')");
    }
    let mut columns = Vec::with_capacity(feature_cols.len());
    for series in node_df.select_series(&feature_cols)? {
        let series = series.cast(&DataType::Float32)?;
        columns.push(series.f32()?.into_no_null_iter().collect_vec());
    }
    let mut features = Vec::with_capacity(num_nodes * columns.len());
    for row in 0..num_nodes {
        for column in &columns {
            features.push(column[row]);
        }
    }
    let features = Tensor::from_vec(features, (num_nodes, feature_cols.len()), device)?;

    let mut relations = Vec::with_capacity(RELATION_FILES.len());
    for file in RELATION_FILES {
        let edge_df = CsvReader::from_path(root.join(file))?
            .has_header(true)
            .finish()?;
        let source = edge_df.column("source")?.cast(&DataType::UInt32)?;
        let target = edge_df.column("target")?.cast(&DataType::UInt32)?;
        let mut entries = vec![0.0f32; num_nodes * num_nodes];
        for (u, v) in izip!(
            source.u32()?.into_no_null_iter(),
            target.u32()?.into_no_null_iter()
        ) {
            let (u, v) = (u as usize, v as usize);
            if u >= num_nodes || v >= num_nodes {
                bail!("edge ({u}, {v}) in {file} points outside the {num_nodes} reviews");
            }
            if u == v {
                continue;
            }
            entries[u * num_nodes + v] = 1.0;
            entries[v * num_nodes + u] = 1.0;
        }
        relations.push(Tensor::from_vec(entries, (num_nodes, num_nodes), device)?);
    }

    let mut order = (0..num_nodes as u32).collect_vec();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let cut = (num_nodes as f64 * train_fraction).round() as usize;
    if cut == 0 || cut >= num_nodes {
        bail!("train fraction {train_fraction} leaves an empty split for {num_nodes} reviews");
    }
    let (train_ids, test_ids) = order.split_at(cut);

    let one_hot = |ids: &[u32]| -> candle_core::Result<(Tensor, Tensor)> {
        let mut rows = vec![0.0f32; ids.len() * num_classes];
        for (i, &id) in ids.iter().enumerate() {
            rows[i * num_classes + labels[id as usize] as usize] = 1.0;
        }
        Ok((
            Tensor::from_vec(ids.to_vec(), ids.len(), device)?,
            Tensor::from_vec(rows, (ids.len(), num_classes), device)?,
        ))
    };
    let (train_nodes, train_labels) = one_hot(train_ids)?;
    let (test_nodes, test_labels) = one_hot(test_ids)?;

    Ok(GraphData {
        relations,
        features,
        train_nodes,
        train_labels,
        test_nodes,
        test_labels,
    })
}
