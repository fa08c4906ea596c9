//! Per-trial and per-experiment competitiveness statistics.
//!
//! | Statistic | Definition |
//! |-----------|-----------|
//! | Campaigns / day | Mean active campaigns per day |
//! | Under-served | Campaigns whose multi-day reach was not met |
//! | Avg fraction unmet | Mean `unmet / demanded` over under-served campaigns |
//! | Demand unmet | `Σ unmet / Σ demanded` over all campaigns |

use crate::analysis::demand::DemandAnalysis;
use crate::core::campaign::CampaignSchedule;
use crate::graph::matrix::Capacity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistics of one trial, taken from its multi-day network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialStats {
    pub average_campaigns_per_day: f64,
    pub campaigns: usize,
    pub under_served: usize,
    /// Sum of `unmet / demanded` over under-served campaigns.
    pub unmet_fraction_sum: f64,
    pub total_short: Capacity,
    pub total_demanded: Capacity,
    pub wasted_supply: Capacity,
}

impl TrialStats {
    pub fn new(schedule: &CampaignSchedule, multi_day: &DemandAnalysis) -> Self {
        let under_served = multi_day.under_served();
        Self {
            average_campaigns_per_day: schedule.average_campaigns_per_day(),
            campaigns: schedule.len(),
            under_served: under_served.len(),
            unmet_fraction_sum: under_served.iter().map(|s| s.unmet_fraction()).sum(),
            total_short: multi_day.unmet_reach(),
            total_demanded: multi_day.total_demand(),
            wasted_supply: multi_day.wasted_supply(),
        }
    }
}

/// Thresholds above which a parameter setting counts as competitive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompetitivenessThresholds {
    /// Minimum under-served campaigns per trial.
    pub min_under_served: f64,
    /// Maximum mean fraction unmet of an under-served campaign.
    pub max_unmet_fraction: f64,
    /// Minimum share of total demand unmet.
    pub min_demand_unmet: f64,
}

impl Default for CompetitivenessThresholds {
    fn default() -> Self {
        Self {
            min_under_served: 20.0,
            max_unmet_fraction: 0.40,
            min_demand_unmet: 0.20,
        }
    }
}

/// Aggregate statistics over the trials of one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub trials: usize,
    pub average_campaigns_per_day: f64,
    /// Mean number of under-served campaigns per trial.
    pub average_under_served: f64,
    /// Mean fraction of reach unmet, over all under-served campaigns.
    pub average_unmet_fraction: f64,
    /// Share of all demanded reach that went unmet.
    pub demand_unmet_fraction: f64,
    pub total_short: Capacity,
    pub total_demanded: Capacity,
}

impl ExperimentSummary {
    pub fn from_trials<'a>(trials: impl IntoIterator<Item = &'a TrialStats>) -> Self {
        let mut count = 0usize;
        let mut campaigns_per_day = 0.0;
        let mut under_served = 0usize;
        let mut unmet_fraction_sum = 0.0;
        let mut total_short: Capacity = 0;
        let mut total_demanded: Capacity = 0;

        for stats in trials {
            count += 1;
            campaigns_per_day += stats.average_campaigns_per_day;
            under_served += stats.under_served;
            unmet_fraction_sum += stats.unmet_fraction_sum;
            total_short = total_short.saturating_add(stats.total_short);
            total_demanded = total_demanded.saturating_add(stats.total_demanded);
        }

        Self {
            trials: count,
            average_campaigns_per_day: ratio(campaigns_per_day, count as f64),
            average_under_served: ratio(under_served as f64, count as f64),
            average_unmet_fraction: ratio(unmet_fraction_sum, under_served as f64),
            demand_unmet_fraction: ratio(total_short as f64, total_demanded as f64),
            total_short,
            total_demanded,
        }
    }

    pub fn is_competitive(&self, thresholds: &CompetitivenessThresholds) -> bool {
        self.average_under_served > thresholds.min_under_served
            && self.average_unmet_fraction < thresholds.max_unmet_fraction
            && self.demand_unmet_fraction >= thresholds.min_demand_unmet
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

impl fmt::Display for ExperimentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Experiment Summary ===")?;
        writeln!(f, "Trials:                  {}", self.trials)?;
        writeln!(f, "Campaigns / Day:         {:.3}", self.average_campaigns_per_day)?;
        writeln!(f, "Under-served / Trial:    {:.3}", self.average_under_served)?;
        writeln!(
            f,
            "Avg % Unmet (under):     {:.1}%",
            self.average_unmet_fraction * 100.0
        )?;
        writeln!(
            f,
            "Demand Unmet:            {:.1}% ({} of {})",
            self.demand_unmet_fraction * 100.0,
            self.total_short,
            self.total_demanded
        )?;
        Ok(())
    }
}
