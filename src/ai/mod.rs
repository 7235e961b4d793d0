pub mod client;
pub mod prompts;
pub mod service;

pub use client::{ChatClient, CohereClient};
pub use prompts::ReviewMode;
pub use service::{AiOutcome, AiService};
