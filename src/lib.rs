//! # adx-demand
//!
//! Demand and competitiveness analysis for simulated ad-exchange markets.
//!
//! Synthetic campaigns are generated over a multi-day horizon, audience
//! supply and campaign reach targets are modeled as a capacitated flow
//! network, and a min-cost max-flow solve tells how much demand the
//! market can actually satisfy.
//!
//! ## Architecture
//!
//! - **core**: Segments, user types, campaigns, simulation configuration
//! - **graph**: Capacity matrices, daily and multi-day networks, min-cost max-flow
//! - **analysis**: Unused-flow analysis and competitiveness statistics
//! - **simulation**: Campaign generation and multi-trial experiments

pub mod analysis;
pub mod core;
pub mod graph;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::analysis::demand::DemandAnalysis;
    pub use crate::analysis::stats::{ExperimentSummary, TrialStats};
    pub use crate::core::campaign::{Campaign, CampaignId, CampaignSchedule};
    pub use crate::core::config::SimulationConfig;
    pub use crate::core::segment::Segment;
    pub use crate::core::user_type::{Audience, UserType};
    pub use crate::graph::flow_network::{FlowNetwork, NetworkBuilder, SolvedNetwork};
    pub use crate::graph::matrix::{Capacity, Matrix, UNBOUNDED};
    pub use crate::graph::min_cost_flow::MinCostMaxFlow;
    pub use crate::simulation::experiment::{EngineError, Experiment};
}
