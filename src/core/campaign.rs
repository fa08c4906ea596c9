use crate::core::segment::Segment;
use crate::graph::matrix::Capacity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a campaign within one trial.
///
/// Campaigns are deduplicated by this id, never by segment label: two
/// campaigns targeting the same segment are distinct demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(usize);

impl CampaignId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An advertising campaign: a segment to reach, an inclusive day window,
/// and a reach target as a percentage of the segment's population.
///
/// Campaigns are immutable once created.
///
/// # Examples
///
/// ```
/// use adx_demand::core::campaign::{Campaign, CampaignId};
/// use adx_demand::core::segment::Segment;
///
/// let campaign = Campaign::new(CampaignId::new(0), Segment::new("MY"), 2, 6, 50);
/// assert_eq!(campaign.duration_days(), 5);
/// assert!(campaign.is_active_on(6));
/// assert!(!campaign.is_active_on(7));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    id: CampaignId,
    segment: Segment,
    /// First active day.
    start_day: usize,
    /// Last active day (inclusive).
    end_day: usize,
    /// Reach target, percent of the segment's population.
    reach_percent: u32,
    /// Length drawn at generation time, before clipping to the horizon.
    nominal_length: usize,
}

impl Campaign {
    /// Create a new campaign active on `start_day..=end_day`.
    ///
    /// # Panics
    ///
    /// Panics if `end_day < start_day`.
    pub fn new(
        id: CampaignId,
        segment: Segment,
        start_day: usize,
        end_day: usize,
        reach_percent: u32,
    ) -> Self {
        assert!(
            start_day <= end_day,
            "Campaign window must not be empty, got days {}..={}",
            start_day,
            end_day
        );
        Self {
            id,
            segment,
            start_day,
            end_day,
            reach_percent,
            nominal_length: end_day - start_day + 1,
        }
    }

    /// Record the length that was drawn before the window was clipped.
    pub fn with_nominal_length(mut self, length: usize) -> Self {
        self.nominal_length = length;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> CampaignId {
        self.id
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn start_day(&self) -> usize {
        self.start_day
    }

    pub fn end_day(&self) -> usize {
        self.end_day
    }

    pub fn reach_percent(&self) -> u32 {
        self.reach_percent
    }

    pub fn nominal_length(&self) -> usize {
        self.nominal_length
    }

    /// Number of days in the (clipped) active window.
    pub fn duration_days(&self) -> usize {
        self.end_day - self.start_day + 1
    }

    pub fn is_active_on(&self, day: usize) -> bool {
        self.start_day <= day && day <= self.end_day
    }

    // --- Edge weights ---

    /// Daily reach capacity: `floor(reach_percent / 100 * target_size)`.
    pub fn daily_reach_capacity(&self, target_size: u64) -> Capacity {
        (self.reach_percent as f64 / 100.0 * target_size as f64).floor() as Capacity
    }

    /// One day's reach contribution in the multi-day model, where the
    /// impression inflation factor also applies:
    /// `floor(target_size * inflation * reach_percent / 100)`.
    pub fn inflated_daily_reach(&self, target_size: u64, inflation: f64) -> Capacity {
        self.inflated_daily_reach_exact(target_size, inflation).floor() as Capacity
    }

    /// Reach capacity over the whole window:
    /// `floor(target_size * inflation * duration_days * reach_percent / 100)`.
    ///
    /// The per-day product is formed first and then scaled by the duration,
    /// so the result is never below the sum of [`Self::inflated_daily_reach`]
    /// over the window and exceeds it by less than `duration_days`.
    pub fn horizon_reach_capacity(&self, target_size: u64, inflation: f64) -> Capacity {
        (self.inflated_daily_reach_exact(target_size, inflation) * self.duration_days() as f64)
            .floor() as Capacity
    }

    fn inflated_daily_reach_exact(&self, target_size: u64, inflation: f64) -> f64 {
        target_size as f64 * inflation * self.reach_percent as f64 / 100.0
    }
}

impl fmt::Display for Campaign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} days {}..={} reach {}%",
            self.id, self.segment, self.start_day, self.end_day, self.reach_percent
        )
    }
}

/// All campaigns of one trial, in generation order, over a fixed horizon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignSchedule {
    num_days: usize,
    campaigns: Vec<Campaign>,
}

impl CampaignSchedule {
    pub fn new(num_days: usize) -> Self {
        Self {
            num_days,
            campaigns: Vec::new(),
        }
    }

    /// Add a campaign.
    ///
    /// # Panics
    ///
    /// Panics if the campaign ends outside the horizon.
    pub fn add(&mut self, campaign: Campaign) {
        assert!(
            campaign.end_day() < self.num_days,
            "Campaign {} ends on day {} beyond a {}-day horizon",
            campaign.id(),
            campaign.end_day(),
            self.num_days
        );
        self.campaigns.push(campaign);
    }

    pub fn num_days(&self) -> usize {
        self.num_days
    }

    pub fn campaigns(&self) -> &[Campaign] {
        &self.campaigns
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }

    /// Campaigns whose window contains `day`, in generation order.
    pub fn active_on(&self, day: usize) -> Vec<&Campaign> {
        self.campaigns
            .iter()
            .filter(|c| c.is_active_on(day))
            .collect()
    }

    /// Number of active campaigns for each day of the horizon.
    pub fn campaigns_per_day(&self) -> Vec<usize> {
        let mut counts = vec![0; self.num_days];
        for campaign in &self.campaigns {
            for count in &mut counts[campaign.start_day()..=campaign.end_day()] {
                *count += 1;
            }
        }
        counts
    }

    /// Mean number of active campaigns per day.
    pub fn average_campaigns_per_day(&self) -> f64 {
        if self.num_days == 0 {
            return 0.0;
        }
        let total: usize = self.campaigns_per_day().iter().sum();
        total as f64 / self.num_days as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(id: usize, segment: &str, start: usize, end: usize, percent: u32) -> Campaign {
        Campaign::new(CampaignId::new(id), Segment::new(segment), start, end, percent)
    }

    #[test]
    fn test_campaign_window() {
        let c = campaign(0, "M", 3, 5, 20);
        assert_eq!(c.duration_days(), 3);
        assert!(!c.is_active_on(2));
        assert!(c.is_active_on(3));
        assert!(c.is_active_on(5));
        assert!(!c.is_active_on(6));
        assert_eq!(c.nominal_length(), 3);
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn test_inverted_window_panics() {
        campaign(0, "M", 5, 4, 20);
    }

    #[test]
    fn test_daily_reach_capacity() {
        assert_eq!(campaign(0, "M", 0, 0, 50).daily_reach_capacity(100), 50);
        assert_eq!(campaign(0, "M", 0, 0, 20).daily_reach_capacity(517), 103);
        assert_eq!(campaign(0, "M", 0, 0, 80).daily_reach_capacity(0), 0);
    }

    #[test]
    fn test_horizon_reach_capacity_scales_with_duration() {
        let c = campaign(0, "M", 0, 2, 50);
        // 100 * 1.423 * 0.5 = 71.15 per day
        assert_eq!(c.inflated_daily_reach(100, 1.423), 71);
        // 71.15 * 3 = 213.45
        assert_eq!(c.horizon_reach_capacity(100, 1.423), 213);
    }

    #[test]
    fn test_schedule_active_on_keeps_generation_order() {
        let mut schedule = CampaignSchedule::new(10);
        schedule.add(campaign(0, "M", 0, 4, 20));
        schedule.add(campaign(1, "F", 3, 9, 50));
        schedule.add(campaign(2, "Y", 4, 4, 80));

        let ids: Vec<usize> = schedule.active_on(4).iter().map(|c| c.id().index()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(schedule.active_on(2).iter().all(|c| c.id().index() == 0));
    }

    #[test]
    fn test_campaigns_per_day_and_average() {
        let mut schedule = CampaignSchedule::new(4);
        schedule.add(campaign(0, "M", 0, 1, 20));
        schedule.add(campaign(1, "F", 1, 3, 50));

        assert_eq!(schedule.campaigns_per_day(), vec![1, 2, 1, 1]);
        assert!((schedule.average_campaigns_per_day() - 1.25).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "beyond a 3-day horizon")]
    fn test_schedule_rejects_campaign_past_horizon() {
        let mut schedule = CampaignSchedule::new(3);
        schedule.add(campaign(0, "M", 1, 3, 20));
    }
}
