pub mod experiment;
pub mod generator;
