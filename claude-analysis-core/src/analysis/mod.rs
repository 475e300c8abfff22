//! Conversation-log aggregator
//!
//! Turns a stream of raw log records into a single [`AnalysisRecord`]:
//!
//! 1. **Normalize** each raw record into a [`LogEnvelope`]; failures are dropped.
//! 2. **Index** ([`index`]): session context, uuid → tool name, call counts and
//!    run-command details.
//! 3. **Fold** ([`fold`]): tool results resolved through the index become
//!    read, write and apply-diff details.
//! 4. **Emit** ([`aggregate`]): totals, details and context, plus the `origin`
//!    remote from the [`git`] probe.
//!
//! Aggregation holds no shared state; distinct logs can be aggregated in
//! parallel.
//!
//! [`AnalysisRecord`]: crate::types::AnalysisRecord
//! [`LogEnvelope`]: crate::ingest::LogEnvelope

pub mod aggregate;
pub mod fold;
pub mod git;
pub mod index;
pub mod measure;

pub use aggregate::{aggregate, aggregate_with};
pub use fold::{ResultFields, ResultFolder};
pub use git::{GitConfigProbe, RemoteProbe};
pub use index::InvocationIndex;
