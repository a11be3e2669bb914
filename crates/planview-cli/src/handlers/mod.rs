pub mod export;
pub mod refresh;
pub mod results;
pub mod stats;
pub mod sync;
pub mod tree;
