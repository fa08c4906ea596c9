use crate::core::campaign::{Campaign, CampaignId, CampaignSchedule};
use crate::core::user_type::Audience;
use crate::graph::matrix::{Capacity, Matrix, UNBOUNDED};
use crate::graph::min_cost_flow::{FlowSolution, MinCostMaxFlow, SolverError};
use log::{debug, warn};
use serde::Serialize;
use std::collections::HashMap;

/// Label of the source node in every network.
pub const SOURCE_LABEL: &str = "S";
/// Label of the sink node in every network.
pub const SINK_LABEL: &str = "T";

/// Cost of pushing one impression across any edge.
const UNIT_COST: Capacity = 1;

/// What a network node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Source,
    /// A user type's audience; `day` is set in the multi-day network.
    UserType { index: usize, day: Option<usize> },
    Campaign { id: CampaignId },
    Sink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub label: String,
}

/// Which slice of the horizon a network covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkScope {
    Day(usize),
    Horizon { num_days: usize },
}

/// A capacitated directed network from audience supply to campaign demand.
///
/// Node order is fixed: index 0 is the source, then user-type nodes, then
/// campaign nodes, and the last index is the sink. Capacity and cost
/// matrices are square and indexed by that order.
#[derive(Debug, Clone, Serialize)]
pub struct FlowNetwork {
    scope: NetworkScope,
    nodes: Vec<Node>,
    capacity: Matrix,
    cost: Matrix,
    #[serde(skip)]
    campaign_index: HashMap<CampaignId, usize>,
}

impl FlowNetwork {
    pub fn scope(&self) -> NetworkScope {
        self.scope
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node labels in matrix order.
    pub fn labels(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.label.as_str()).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn capacity(&self) -> &Matrix {
        &self.capacity
    }

    pub fn cost(&self) -> &Matrix {
        &self.cost
    }

    pub fn source(&self) -> usize {
        0
    }

    pub fn sink(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Matrix index of a campaign's node, if it is part of this network.
    pub fn campaign_node(&self, id: CampaignId) -> Option<usize> {
        self.campaign_index.get(&id).copied()
    }

    /// `(campaign, node index)` pairs in node order.
    pub fn campaign_nodes(&self) -> Vec<(CampaignId, usize)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node.kind {
                NodeKind::Campaign { id } => Some((id, i)),
                _ => None,
            })
            .collect()
    }

    /// Indices of the user-type nodes (those fed by the source).
    pub fn user_type_nodes(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.kind, NodeKind::UserType { .. }))
            .map(|(i, _)| i)
            .collect()
    }

    /// Total capacity out of the source.
    pub fn total_supply(&self) -> Capacity {
        self.capacity.row_sum(self.source())
    }

    /// Total capacity into the sink.
    pub fn total_demand(&self) -> Capacity {
        self.capacity.column_sum(self.sink())
    }

    /// Run min-cost max-flow on this network and keep the result with it.
    pub fn solve(self) -> Result<SolvedNetwork, SolverError> {
        let solution =
            MinCostMaxFlow::solve(&self.capacity, &self.cost, self.source(), self.sink())?;
        debug!(
            "solved {:?}: {} nodes, flow {} of demand {}",
            self.scope,
            self.node_count(),
            solution.total_flow(),
            self.total_demand()
        );
        Ok(SolvedNetwork {
            network: self,
            solution,
        })
    }
}

/// A network together with the flow computed on it.
#[derive(Debug, Clone, Serialize)]
pub struct SolvedNetwork {
    network: FlowNetwork,
    solution: FlowSolution,
}

impl SolvedNetwork {
    pub fn network(&self) -> &FlowNetwork {
        &self.network
    }

    pub fn solution(&self) -> &FlowSolution {
        &self.solution
    }

    pub fn flow(&self) -> &Matrix {
        self.solution.flow()
    }

    /// Elementwise `capacity − flow`.
    pub fn unused_flow(&self) -> Matrix {
        self.network.capacity.difference(self.solution.flow())
    }
}

/// Builds daily and multi-day flow networks for one audience.
///
/// # Examples
///
/// ```
/// use adx_demand::core::campaign::{Campaign, CampaignId, CampaignSchedule};
/// use adx_demand::core::segment::Segment;
/// use adx_demand::core::user_type::{Audience, UserType};
/// use adx_demand::graph::flow_network::NetworkBuilder;
///
/// let audience: Audience = vec![UserType::new("MY", 100), UserType::new("FO", 100)]
///     .into_iter()
///     .collect();
/// let mut schedule = CampaignSchedule::new(1);
/// schedule.add(Campaign::new(CampaignId::new(0), Segment::new("M"), 0, 0, 50));
///
/// let network = NetworkBuilder::new(&audience, 1.423).daily(&schedule, 0);
/// assert_eq!(network.labels(), vec!["S", "MY", "FO", "M", "T"]);
/// assert_eq!(network.capacity().get(0, 1), 142);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NetworkBuilder<'a> {
    audience: &'a Audience,
    inflation: f64,
}

impl<'a> NetworkBuilder<'a> {
    pub fn new(audience: &'a Audience, inflation: f64) -> Self {
        Self {
            audience,
            inflation,
        }
    }

    /// Build the network of a single day.
    ///
    /// Nodes: source, every user type, every campaign active on `day` in
    /// generation order, sink. A day without campaigns still yields a valid
    /// network whose max flow is zero.
    pub fn daily(&self, schedule: &CampaignSchedule, day: usize) -> FlowNetwork {
        let campaigns = schedule.active_on(day);
        if campaigns.is_empty() {
            warn!("day {} has no active campaigns; max flow will be 0", day);
        }

        let mut nodes = vec![Node {
            kind: NodeKind::Source,
            label: SOURCE_LABEL.to_string(),
        }];
        for (index, user_type) in self.audience.iter().enumerate() {
            nodes.push(Node {
                kind: NodeKind::UserType { index, day: None },
                label: user_type.label().to_string(),
            });
        }
        let first_campaign = nodes.len();
        for campaign in &campaigns {
            nodes.push(Node {
                kind: NodeKind::Campaign { id: campaign.id() },
                label: campaign.segment().to_string(),
            });
        }
        nodes.push(Node {
            kind: NodeKind::Sink,
            label: SINK_LABEL.to_string(),
        });

        let size = nodes.len();
        let sink = size - 1;
        let mut capacity = Matrix::zeros(size);

        for (i, user_type) in self.audience.iter().enumerate() {
            let ut_node = 1 + i;
            capacity.set(0, ut_node, user_type.supply_capacity(self.inflation));
            for (j, campaign) in campaigns.iter().enumerate() {
                if user_type.is_targeted_by(campaign.segment()) {
                    capacity.set(ut_node, first_campaign + j, UNBOUNDED);
                }
            }
        }
        for (j, campaign) in campaigns.iter().enumerate() {
            let target = self.audience.target_size(campaign.segment());
            capacity.set(first_campaign + j, sink, campaign.daily_reach_capacity(target));
        }

        debug!(
            "built day {} network: {} user types, {} campaigns",
            day,
            self.audience.len(),
            campaigns.len()
        );
        Self::finish(NetworkScope::Day(day), nodes, capacity)
    }

    /// Build one network spanning the whole horizon.
    ///
    /// Nodes: source, one node per `(day, user type)` pair (day-major), one
    /// node per campaign, sink. Supply is scoped to its day: a user type's
    /// day-`d` node only feeds campaigns active on `d`.
    pub fn multi_day(&self, schedule: &CampaignSchedule) -> FlowNetwork {
        let num_days = schedule.num_days();
        let type_count = self.audience.len();

        let mut nodes = vec![Node {
            kind: NodeKind::Source,
            label: SOURCE_LABEL.to_string(),
        }];
        for day in 0..num_days {
            for (index, user_type) in self.audience.iter().enumerate() {
                nodes.push(Node {
                    kind: NodeKind::UserType {
                        index,
                        day: Some(day),
                    },
                    label: format!("{}_{}", user_type.label(), day),
                });
            }
        }
        let campaigns: Vec<&Campaign> = schedule
            .campaigns()
            .iter()
            .filter(|c| c.start_day() < num_days)
            .collect();
        let first_campaign = nodes.len();
        for campaign in &campaigns {
            nodes.push(Node {
                kind: NodeKind::Campaign { id: campaign.id() },
                label: format!("{}_{}", campaign.segment(), campaign.start_day()),
            });
        }
        nodes.push(Node {
            kind: NodeKind::Sink,
            label: SINK_LABEL.to_string(),
        });

        let size = nodes.len();
        let sink = size - 1;
        let mut capacity = Matrix::zeros(size);

        for day in 0..num_days {
            for (i, user_type) in self.audience.iter().enumerate() {
                let ut_node = 1 + day * type_count + i;
                capacity.set(0, ut_node, user_type.supply_capacity(self.inflation));
                for (j, campaign) in campaigns.iter().enumerate() {
                    if campaign.is_active_on(day) && user_type.is_targeted_by(campaign.segment())
                    {
                        capacity.set(ut_node, first_campaign + j, UNBOUNDED);
                    }
                }
            }
        }
        for (j, campaign) in campaigns.iter().enumerate() {
            let target = self.audience.target_size(campaign.segment());
            capacity.set(
                first_campaign + j,
                sink,
                campaign.horizon_reach_capacity(target, self.inflation),
            );
        }

        debug!(
            "built multi-day network: {} days, {} user types, {} campaigns, {} nodes",
            num_days,
            type_count,
            campaigns.len(),
            size
        );
        Self::finish(NetworkScope::Horizon { num_days }, nodes, capacity)
    }

    fn finish(scope: NetworkScope, nodes: Vec<Node>, capacity: Matrix) -> FlowNetwork {
        let campaign_index = nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node.kind {
                NodeKind::Campaign { id } => Some((id, i)),
                _ => None,
            })
            .collect();
        let cost = Matrix::filled(nodes.len(), UNIT_COST);
        FlowNetwork {
            scope,
            nodes,
            capacity,
            cost,
            campaign_index,
        }
    }
}
