pub mod a001_agent;
pub mod a002_pre_order;
