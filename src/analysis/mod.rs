pub mod demand;
pub mod stats;
