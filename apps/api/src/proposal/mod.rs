// Proposal pipeline: prompt construction, job insights, proposal metrics and
// the generate flow. All completion calls go through llm_client.

pub mod background;
pub mod builder;
pub mod generator;
pub mod handlers;
pub mod insights;
pub mod metrics;
pub mod prompts;
