mod batch;
pub use batch::batch_range;

mod walks;
pub use walks::{random_walk_pairs, PairPool};

mod pairs;
pub use pairs::pairs_to_matrix;

mod negative;
pub use negative::{skip_gram_batch, SkipGramBatch};
