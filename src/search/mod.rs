pub mod highlight;
pub mod hybrid;
pub mod neural;
pub mod text;

pub use hybrid::{HybridPolicy, HybridSearchEngine};
pub use neural::NeuralSearchEngine;
pub use text::TextSearchEngine;

/// Default number of hits requested from each retrieval path.
pub const DEFAULT_TOP: usize = 5;
