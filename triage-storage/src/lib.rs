//! TRIAGE Storage - Persistence and Directory Abstraction
//!
//! Defines the async storage traits the engines consume, the query filter
//! type, and an in-memory reference implementation. A durable backend
//! implements the same traits elsewhere.

pub mod filter;
pub mod memory;
pub mod store;

pub use filter::{FilterOrder, WorkItemFilter};
pub use memory::InMemoryStore;
pub use store::{AgentDirectory, WorkItemStore};
