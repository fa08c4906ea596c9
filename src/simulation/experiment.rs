//! Trial and experiment runners.
//!
//! A trial generates one game's campaigns, solves the multi-day network
//! (and optionally every daily network) and analyzes the residual flow.
//! An experiment runs independent trials, each with its own generator
//! seeded from the master seed, and summarizes them.

use crate::analysis::demand::DemandAnalysis;
use crate::analysis::stats::{ExperimentSummary, TrialStats};
use crate::core::campaign::CampaignSchedule;
use crate::core::config::{ConfigError, SimulationConfig};
use crate::core::user_type::Audience;
use crate::graph::flow_network::{NetworkBuilder, SolvedNetwork};
use crate::graph::min_cost_flow::SolverError;
use crate::simulation::generator::CampaignGenerator;
use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("trial {trial}: {source}")]
    Solver { trial: usize, source: SolverError },
}

/// One solved daily network.
#[derive(Debug, Clone, Serialize)]
pub struct DayOutcome {
    pub day: usize,
    pub network: SolvedNetwork,
    pub analysis: DemandAnalysis,
}

/// Everything computed for one simulated game.
#[derive(Debug, Clone, Serialize)]
pub struct TrialOutcome {
    pub index: usize,
    pub seed: u64,
    pub schedule: CampaignSchedule,
    /// Empty unless daily flows were requested.
    pub daily: Vec<DayOutcome>,
    pub multi_day: SolvedNetwork,
    pub analysis: DemandAnalysis,
    pub stats: TrialStats,
}

/// Results of all trials of an experiment.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentReport {
    pub started_at: DateTime<Utc>,
    pub master_seed: Option<u64>,
    pub trials: Vec<TrialOutcome>,
    pub summary: ExperimentSummary,
}

/// A validated configuration ready to run trials.
///
/// # Examples
///
/// ```
/// use adx_demand::core::config::SimulationConfig;
/// use adx_demand::simulation::experiment::Experiment;
///
/// let config = SimulationConfig { num_days: 8, trials: 2, seed: Some(7), ..Default::default() };
/// let experiment = Experiment::new(config).unwrap();
/// let report = experiment.run().unwrap();
/// assert_eq!(report.trials.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Experiment {
    config: SimulationConfig,
    audience: Audience,
}

impl Experiment {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let audience = config.audience()?;
        Ok(Self { config, audience })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn audience(&self) -> &Audience {
        &self.audience
    }

    pub fn network_builder(&self) -> NetworkBuilder<'_> {
        NetworkBuilder::new(&self.audience, self.config.impression_inflation_factor)
    }

    /// One seed per trial, drawn from the master seed.
    ///
    /// Unseeded configurations draw the master seed from OS entropy, so
    /// successive calls differ.
    pub fn trial_seeds(&self) -> Vec<u64> {
        let mut master = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        (0..self.config.trials).map(|_| master.gen()).collect()
    }

    /// Generate a schedule with a generator seeded from `seed`.
    pub fn generate_schedule(&self, seed: u64) -> CampaignSchedule {
        let mut rng = StdRng::seed_from_u64(seed);
        CampaignGenerator::new(&self.config).generate(&mut rng)
    }

    /// Run a single trial with its own seed.
    pub fn run_trial(&self, index: usize, seed: u64) -> Result<TrialOutcome, EngineError> {
        let schedule = self.generate_schedule(seed);
        let builder = self.network_builder();
        let solver_err = |source| EngineError::Solver {
            trial: index,
            source,
        };

        let mut daily = Vec::new();
        if self.config.daily_flows {
            for day in 0..schedule.num_days() {
                let network = builder.daily(&schedule, day).solve().map_err(solver_err)?;
                let analysis = DemandAnalysis::from_solved(&network);
                daily.push(DayOutcome {
                    day,
                    network,
                    analysis,
                });
            }
        }

        let multi_day = builder.multi_day(&schedule).solve().map_err(solver_err)?;
        let analysis = DemandAnalysis::from_solved(&multi_day);
        let stats = TrialStats::new(&schedule, &analysis);

        info!(
            "trial {} (seed {}): {} campaigns, {} under-served, {} of {} reach unmet",
            index,
            seed,
            stats.campaigns,
            stats.under_served,
            stats.total_short,
            stats.total_demanded
        );

        Ok(TrialOutcome {
            index,
            seed,
            schedule,
            daily,
            multi_day,
            analysis,
            stats,
        })
    }

    /// Run all trials one after another.
    pub fn run(&self) -> Result<ExperimentReport, EngineError> {
        let started_at = Utc::now();
        let trials = self
            .trial_seeds()
            .into_iter()
            .enumerate()
            .map(|(index, seed)| self.run_trial(index, seed))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.report(started_at, trials))
    }

    /// Run all trials on the rayon thread pool.
    ///
    /// Trials share only the read-only configuration, so the result is
    /// identical to [`Experiment::run`] for the same master seed.
    pub fn run_parallel(&self) -> Result<ExperimentReport, EngineError> {
        let started_at = Utc::now();
        let seeds = self.trial_seeds();
        debug!(
            "running {} trials on {} threads",
            seeds.len(),
            rayon::current_num_threads()
        );
        let trials = seeds
            .into_par_iter()
            .enumerate()
            .map(|(index, seed)| self.run_trial(index, seed))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.report(started_at, trials))
    }

    fn report(&self, started_at: DateTime<Utc>, trials: Vec<TrialOutcome>) -> ExperimentReport {
        let summary = ExperimentSummary::from_trials(trials.iter().map(|t| &t.stats));
        info!(
            "experiment done: {} trials, {:.1}% of demand unmet",
            summary.trials,
            summary.demand_unmet_fraction * 100.0
        );
        ExperimentReport {
            started_at,
            master_seed: self.config.seed,
            trials,
            summary,
        }
    }
}
