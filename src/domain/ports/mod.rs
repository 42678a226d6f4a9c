//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces external collaborators must implement:
//! - HealthScanner: fleet health snapshots
//! - ProviderClient: raw model calls per vendor
//! - KnowledgeGraph: past decisions and project activity
//! - TaskDispatcher: hand-off of a task to a target project
//! - Inbox: externally queued inbound tasks
//! - Clock / RandomSource: injectable time and randomness

pub mod clock;
pub mod health_scanner;
pub mod inbox;
pub mod knowledge_graph;
pub mod null_knowledge;
pub mod provider_client;
pub mod random;
pub mod task_dispatcher;

pub use clock::{Clock, ManualClock, SystemClock};
pub use health_scanner::{HealthError, HealthScanner};
pub use inbox::{Inbox, InboxError, NullInbox};
pub use knowledge_graph::{KnowledgeError, KnowledgeGraph};
pub use null_knowledge::NullKnowledgeGraph;
pub use provider_client::{ProviderClient, ProviderError, ProviderReply};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use task_dispatcher::{DispatchError, TaskDispatcher};
