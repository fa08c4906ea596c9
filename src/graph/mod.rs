pub mod flow_network;
pub mod matrix;
pub mod min_cost_flow;
