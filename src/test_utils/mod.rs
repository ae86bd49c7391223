//! Helpers for exercising the method resolver without an execution engine.

mod mock_execution_client;

pub use mock_execution_client::{MockExecutionClient, RecordedRequest};
