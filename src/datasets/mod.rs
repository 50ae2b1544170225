mod graph_data;
pub use graph_data::{GraphData, GraphInfo};

mod dblp;
pub use dblp::load_dblp;
mod yelp;
pub use yelp::load_yelp;
mod example;
pub use example::synthetic_example;
