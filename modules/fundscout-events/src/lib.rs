pub mod store;
pub mod types;

pub use store::{EventPublisher, EventStore};
pub use types::{
    CandidateCreated, DomainStatusChanged, StoredEvent, TOPIC_CANDIDATE_CREATED,
    TOPIC_DOMAIN_STATUS_CHANGES,
};

#[cfg(feature = "test-utils")]
pub mod testing {
    //! In-memory event log for tests. Captures published payloads in order.

    use std::sync::Mutex;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::types::{CandidateCreated, DomainStatusChanged};
    use crate::EventPublisher;

    #[derive(Default)]
    pub struct MemoryEventLog {
        pub candidate_created: Mutex<Vec<CandidateCreated>>,
        pub status_changes: Mutex<Vec<DomainStatusChanged>>,
    }

    #[async_trait]
    impl EventPublisher for MemoryEventLog {
        async fn publish_candidate_created(&self, payload: CandidateCreated) -> Result<()> {
            self.candidate_created.lock().unwrap().push(payload);
            Ok(())
        }

        async fn publish_domain_status_changed(
            &self,
            payload: DomainStatusChanged,
        ) -> Result<()> {
            self.status_changes.lock().unwrap().push(payload);
            Ok(())
        }
    }
}
