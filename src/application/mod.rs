//! Application layer - the document pipeline and the assistant on top.
//!
//! Services here orchestrate chunking, embedding, and retrieval through the
//! domain ports; providers stay behind traits so the pipeline never names a
//! concrete backend.

pub mod services;

pub use services::{AssistantService, DocumentVectorStore, StoreOutcome, SummaryOutcome};
