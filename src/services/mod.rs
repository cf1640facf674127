pub mod aggregator;
pub mod charts;
pub mod normalizer;
pub mod page;
pub mod pipeline;
pub mod sheets;
