use candle_core::{Device, Tensor};
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::GraphData;

const NUM_REVIEWS: usize = 30;
const NUM_USERS: usize = 8;
const NUM_ITEMS: usize = 10;
const FEATURE_DIM: usize = 16;
const NUM_NODES: usize = NUM_REVIEWS + NUM_USERS + NUM_ITEMS;
const NUM_TRAIN: usize = 20;

/// Small in-memory review graph for smoke tests and the demo binary.
/// Node ids pack reviews first, then users, then items. Reviews posted
/// by the second half of the users are fraudulent, and half of their
/// feature dimensions are shifted so the task is learnable.
pub fn synthetic_example(seed: u64, device: &Device) -> anyhow::Result<GraphData> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut user_review = vec![0.0f32; NUM_NODES * NUM_NODES];
    let mut review_review = vec![0.0f32; NUM_NODES * NUM_NODES];
    let mut item_review = vec![0.0f32; NUM_NODES * NUM_NODES];
    for review in 0..NUM_REVIEWS {
        let user = NUM_REVIEWS + review % NUM_USERS;
        let item = NUM_REVIEWS + NUM_USERS + review % NUM_ITEMS;
        let peer = (review + NUM_ITEMS) % NUM_REVIEWS;
        link(&mut user_review, review, user);
        link(&mut item_review, review, item);
        link(&mut review_review, review, peer);
    }

    let mut features = Vec::with_capacity(NUM_NODES * FEATURE_DIM);
    for node in 0..NUM_NODES {
        let shifted = node < NUM_REVIEWS && is_fraud(node);
        for dim in 0..FEATURE_DIM {
            let mut value = rng.gen_range(-1.0f32..1.0);
            if shifted && dim < FEATURE_DIM / 2 {
                value += 1.5;
            }
            features.push(value);
        }
    }

    let mut reviews = (0..NUM_REVIEWS as u32).collect_vec();
    reviews.shuffle(&mut rng);
    let (train_ids, test_ids) = reviews.split_at(NUM_TRAIN);

    let one_hot = |ids: &[u32]| -> candle_core::Result<(Tensor, Tensor)> {
        let mut rows = vec![0.0f32; ids.len() * 2];
        for (i, &id) in ids.iter().enumerate() {
            rows[i * 2 + usize::from(is_fraud(id as usize))] = 1.0;
        }
        Ok((
            Tensor::from_vec(ids.to_vec(), ids.len(), device)?,
            Tensor::from_vec(rows, (ids.len(), 2), device)?,
        ))
    };
    let (train_nodes, train_labels) = one_hot(train_ids)?;
    let (test_nodes, test_labels) = one_hot(test_ids)?;

    Ok(GraphData {
        relations: vec![
            Tensor::from_vec(user_review, (NUM_NODES, NUM_NODES), device)?,
            Tensor::from_vec(review_review, (NUM_NODES, NUM_NODES), device)?,
            Tensor::from_vec(item_review, (NUM_NODES, NUM_NODES), device)?,
        ],
        features: Tensor::from_vec(features, (NUM_NODES, FEATURE_DIM), device)?,
        train_nodes,
        train_labels,
        test_nodes,
        test_labels,
    })
}

fn link(entries: &mut [f32], a: usize, b: usize) {
    entries[a * NUM_NODES + b] = 1.0;
    entries[b * NUM_NODES + a] = 1.0;
}

fn is_fraud(review: usize) -> bool {
    review % NUM_USERS >= NUM_USERS / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_validation() -> anyhow::Result<()> {
        let data = synthetic_example(1, &Device::Cpu)?;
        data.validate()?;
        let info = data.info()?;
        assert_eq!(info.num_nodes, NUM_REVIEWS + NUM_USERS + NUM_ITEMS);
        assert_eq!(info.feature_dim, FEATURE_DIM);
        assert_eq!(info.num_classes, 2);
        assert_eq!(info.num_relations, 3);
        Ok(())
    }

    #[test]
    fn test_split_covers_all_reviews() -> anyhow::Result<()> {
        let data = synthetic_example(1, &Device::Cpu)?;
        let mut ids = data.train_nodes.to_vec1::<u32>()?;
        ids.extend(data.test_nodes.to_vec1::<u32>()?);
        ids.sort_unstable();
        assert_eq!(ids, (0..NUM_REVIEWS as u32).collect_vec());
        Ok(())
    }

    #[test]
    fn test_same_seed_same_graph() -> anyhow::Result<()> {
        let first = synthetic_example(9, &Device::Cpu)?;
        let second = synthetic_example(9, &Device::Cpu)?;
        assert_eq!(
            first.features.to_vec2::<f32>()?,
            second.features.to_vec2::<f32>()?
        );
        assert_eq!(
            first.train_nodes.to_vec1::<u32>()?,
            second.train_nodes.to_vec1::<u32>()?
        );
        Ok(())
    }
}
