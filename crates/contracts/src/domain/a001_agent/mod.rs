pub mod aggregate;
pub mod excel;

pub use aggregate::{
    Agent, AgentDto, AgentId, AgentListQuery, AgentSort, AgentStatus, DEFAULT_CATEGORY,
    REQUIRED_FIELDS_MESSAGE,
};
pub use excel::{ImportPreview, ImportResponse, ImportRow, ImportRowError, ImportSummary};
