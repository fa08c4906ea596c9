use crate::core::campaign::CampaignId;
use crate::graph::flow_network::SolvedNetwork;
use crate::graph::matrix::{Capacity, Matrix};
use serde::Serialize;
use std::fmt;

/// Elementwise `capacity − flow`: capacity left unrealized on every edge.
pub fn unused_flow(capacity: &Matrix, flow: &Matrix) -> Matrix {
    capacity.difference(flow)
}

/// Impressions available at the source but delivered to no campaign.
pub fn wasted_supply(unused: &Matrix, source: usize) -> Capacity {
    unused.row_sum(source)
}

/// Reach demanded at the sink but not delivered.
pub fn unmet_reach(unused: &Matrix, sink: usize) -> Capacity {
    unused.column_sum(sink)
}

/// Reach delivered versus demanded for one campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignShortfall {
    pub campaign: CampaignId,
    pub node: usize,
    pub label: String,
    /// Capacity of the campaign's edge into the sink.
    pub demanded: Capacity,
    pub delivered: Capacity,
    pub unmet: Capacity,
}

impl CampaignShortfall {
    pub fn is_under_served(&self) -> bool {
        self.unmet > 0
    }

    /// Fraction of the demanded reach left unmet.
    pub fn unmet_fraction(&self) -> f64 {
        if self.demanded == 0 {
            return 0.0;
        }
        self.unmet as f64 / self.demanded as f64
    }
}

/// Supply left on one user-type node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdleSupply {
    pub node: usize,
    pub label: String,
    pub available: Capacity,
    pub unused: Capacity,
}

/// Residual analysis of a solved network.
///
/// Unused flow on the source side is wasted supply; unused flow on the
/// sink side is unmet reach. Entries between user types and campaigns
/// carry no meaning of their own.
#[derive(Debug, Clone, Serialize)]
pub struct DemandAnalysis {
    unused: Matrix,
    wasted_supply: Capacity,
    unmet_reach: Capacity,
    total_supply: Capacity,
    total_demand: Capacity,
    delivered: Capacity,
    shortfalls: Vec<CampaignShortfall>,
    idle: Vec<IdleSupply>,
}

impl DemandAnalysis {
    pub fn from_solved(solved: &SolvedNetwork) -> Self {
        let network = solved.network();
        let capacity = network.capacity();
        let flow = solved.flow();
        let (source, sink) = (network.source(), network.sink());
        let unused = unused_flow(capacity, flow);

        let shortfalls = network
            .campaign_nodes()
            .into_iter()
            .map(|(campaign, node)| CampaignShortfall {
                campaign,
                node,
                label: network.nodes()[node].label.clone(),
                demanded: capacity.get(node, sink),
                delivered: flow.get(node, sink),
                unmet: unused.get(node, sink),
            })
            .collect();

        let idle = network
            .user_type_nodes()
            .into_iter()
            .map(|node| IdleSupply {
                node,
                label: network.nodes()[node].label.clone(),
                available: capacity.get(source, node),
                unused: unused.get(source, node),
            })
            .collect();

        Self {
            wasted_supply: wasted_supply(&unused, source),
            unmet_reach: unmet_reach(&unused, sink),
            total_supply: network.total_supply(),
            total_demand: network.total_demand(),
            delivered: solved.solution().total_flow(),
            unused,
            shortfalls,
            idle,
        }
    }

    pub fn unused_flow(&self) -> &Matrix {
        &self.unused
    }

    pub fn wasted_supply(&self) -> Capacity {
        self.wasted_supply
    }

    pub fn unmet_reach(&self) -> Capacity {
        self.unmet_reach
    }

    /// Unmet reach of a single campaign, if it is in the network.
    pub fn unmet_reach_for(&self, campaign: CampaignId) -> Option<Capacity> {
        self.shortfalls
            .iter()
            .find(|s| s.campaign == campaign)
            .map(|s| s.unmet)
    }

    pub fn shortfalls(&self) -> &[CampaignShortfall] {
        &self.shortfalls
    }

    /// Campaigns whose reach target was not fully delivered.
    pub fn under_served(&self) -> Vec<&CampaignShortfall> {
        self.shortfalls
            .iter()
            .filter(|s| s.is_under_served())
            .collect()
    }

    /// User-type nodes with supply left over.
    pub fn idle_supply(&self) -> Vec<&IdleSupply> {
        self.idle.iter().filter(|i| i.unused > 0).collect()
    }

    pub fn total_supply(&self) -> Capacity {
        self.total_supply
    }

    pub fn total_demand(&self) -> Capacity {
        self.total_demand
    }

    pub fn delivered(&self) -> Capacity {
        self.delivered
    }

    /// Share of total demand left unmet.
    pub fn demand_unmet_fraction(&self) -> f64 {
        if self.total_demand == 0 {
            return 0.0;
        }
        self.unmet_reach as f64 / self.total_demand as f64
    }
}

impl fmt::Display for DemandAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Demand Analysis ===")?;
        writeln!(f, "Supply:         {}", self.total_supply)?;
        writeln!(f, "Demand:         {}", self.total_demand)?;
        writeln!(f, "Delivered:      {}", self.delivered)?;
        writeln!(f, "Wasted Supply:  {}", self.wasted_supply)?;
        writeln!(f, "Unmet Reach:    {}", self.unmet_reach)?;

        writeln!(f, "\nUser Types Not Shown Ads:")?;
        for idle in self.idle_supply() {
            writeln!(f, "  {}: {}", idle.label, idle.unused)?;
        }

        writeln!(f, "\nCampaigns Wanting Impressions:")?;
        for shortfall in self.under_served() {
            writeln!(
                f,
                "  {} {}: {} of {}",
                shortfall.campaign, shortfall.label, shortfall.unmet, shortfall.demanded
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::campaign::{Campaign, CampaignSchedule};
    use crate::core::segment::Segment;
    use crate::core::user_type::{Audience, UserType};
    use crate::graph::flow_network::NetworkBuilder;

    fn solved_scenario() -> SolvedNetwork {
        let audience: Audience = vec![UserType::new("MY", 100), UserType::new("FO", 100)]
            .into_iter()
            .collect();
        let mut schedule = CampaignSchedule::new(1);
        schedule.add(Campaign::new(CampaignId::new(0), Segment::new("M"), 0, 0, 50));
        NetworkBuilder::new(&audience, 1.423)
            .daily(&schedule, 0)
            .solve()
            .unwrap()
    }

    #[test]
    fn test_wasted_supply_and_unmet_reach() {
        let analysis = DemandAnalysis::from_solved(&solved_scenario());
        assert_eq!(analysis.delivered(), 50);
        assert_eq!(analysis.total_supply(), 284);
        assert_eq!(analysis.wasted_supply(), 92 + 142);
        assert_eq!(analysis.unmet_reach(), 0);
        assert!(analysis.under_served().is_empty());
        assert_eq!(analysis.unmet_reach_for(CampaignId::new(0)), Some(0));
        assert_eq!(analysis.unmet_reach_for(CampaignId::new(9)), None);
    }

    #[test]
    fn test_idle_supply_lists_user_types() {
        let analysis = DemandAnalysis::from_solved(&solved_scenario());
        let idle: Vec<(&str, Capacity)> = analysis
            .idle_supply()
            .iter()
            .map(|i| (i.label.as_str(), i.unused))
            .collect();
        assert_eq!(idle, vec![("MY", 92), ("FO", 142)]);
    }

    #[test]
    fn test_under_served_campaign() {
        let audience: Audience = vec![UserType::new("MY", 10)].into_iter().collect();
        let mut schedule = CampaignSchedule::new(1);
        // demand 0.8 * 10 = 8 each; supply floor(10 * 1.0) = 10
        schedule.add(Campaign::new(CampaignId::new(0), Segment::new("M"), 0, 0, 80));
        schedule.add(Campaign::new(CampaignId::new(1), Segment::new("Y"), 0, 0, 80));
        let solved = NetworkBuilder::new(&audience, 1.0)
            .daily(&schedule, 0)
            .solve()
            .unwrap();

        let analysis = DemandAnalysis::from_solved(&solved);
        assert_eq!(analysis.total_demand(), 16);
        assert_eq!(analysis.delivered(), 10);
        assert_eq!(analysis.unmet_reach(), 6);
        assert_eq!(analysis.wasted_supply(), 0);
        assert_eq!(analysis.under_served().len(), 1);
        let total_unmet: Capacity = analysis.shortfalls().iter().map(|s| s.unmet).sum();
        assert_eq!(total_unmet, 6);
        assert!((analysis.demand_unmet_fraction() - 6.0 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_free_functions_on_hand_built_matrices() {
        let capacity = Matrix::from_rows(vec![
            vec![0, 10, 0, 0],
            vec![0, 0, 7, 0],
            vec![0, 0, 0, 100],
            vec![0, 0, 0, 0],
        ])
        .unwrap();
        let flow = Matrix::from_rows(vec![
            vec![0, 7, 0, 0],
            vec![0, 0, 7, 0],
            vec![0, 0, 0, 7],
            vec![0, 0, 0, 0],
        ])
        .unwrap();
        let unused = unused_flow(&capacity, &flow);
        assert_eq!(wasted_supply(&unused, 0), 3);
        assert_eq!(unmet_reach(&unused, 3), 93);
    }

    #[test]
    fn test_shortfall_fraction_with_zero_demand() {
        let s = CampaignShortfall {
            campaign: CampaignId::new(0),
            node: 3,
            label: "M".into(),
            demanded: 0,
            delivered: 0,
            unmet: 0,
        };
        assert_eq!(s.unmet_fraction(), 0.0);
        assert!(!s.is_under_served());
    }
}
