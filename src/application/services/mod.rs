pub mod assistant;
pub mod vector_store;

pub use assistant::{AssistantService, SummaryOutcome};
pub use vector_store::{DocumentVectorStore, StoreOutcome};
