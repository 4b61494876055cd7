//! Boundary to the remote business platform.
//!
//! The engine never talks to a transport directly. Everything it needs from
//! the platform goes through [`PlatformService`]: structured record queries
//! for metadata, and invocation of a keyed request.

mod fixture;

use action_tester_types::{ActionRequest, PlatformValue, QueryExpression, RecordSet};
use anyhow::Result;
use async_trait::async_trait;
use indexmap::IndexMap;

pub use fixture::{FixtureAction, FixtureService, PlatformFixture};

/// Remote platform operations consumed by the session.
#[async_trait]
pub trait PlatformService: Send + Sync {
    /// Runs a relational query and returns the matching rows.
    async fn query_records(&self, query: &QueryExpression) -> Result<RecordSet>;

    /// Invokes a request and returns its keyed results.
    async fn execute(&self, request: &ActionRequest) -> Result<IndexMap<String, PlatformValue>>;
}
