//! Deleting tasks whose grace window has passed.
//!
//! The engine decides; [`PruneLedger`] makes sure each id is handed over
//! once, and [`prune`] issues the delete. The task list itself is not
//! touched here: the next refresh brings back the authoritative list.

use crate::error::Result;
use crate::source::TaskSource;
use std::collections::HashSet;
use tracing::{info, warn};

/// Ids for which a delete has been requested and not yet resolved.
#[derive(Debug, Clone, Default)]
pub struct PruneLedger {
    requested: HashSet<String>,
}

impl PruneLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a prune request. Returns `true` the first time for an id and
    /// `false` while a request for it is outstanding.
    pub fn record_once(&mut self, task_id: &str) -> bool {
        self.requested.insert(task_id.to_owned())
    }

    /// Drop the record for `task_id` so a later tick may request it again.
    pub fn release(&mut self, task_id: &str) -> bool {
        self.requested.remove(task_id)
    }

    /// Whether a delete for `task_id` is outstanding.
    pub fn is_pending(&self, task_id: &str) -> bool {
        self.requested.contains(task_id)
    }

    /// Forget ids that have left the task list; returns them.
    pub fn retain_present(&mut self, present: &HashSet<&str>) -> Vec<String> {
        let gone: Vec<String> = self
            .requested
            .iter()
            .filter(|id| !present.contains(id.as_str()))
            .cloned()
            .collect();
        for id in &gone {
            self.requested.remove(id);
        }
        gone
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.requested.len()
    }

    /// Whether no request is outstanding.
    pub fn is_empty(&self) -> bool {
        self.requested.is_empty()
    }
}

/// Delete an expired task.
///
/// # Errors
///
/// Passes through the source's delete error after logging it.
pub async fn prune(source: &dyn TaskSource, task_id: &str) -> Result<()> {
    match source.delete_task(task_id).await {
        Ok(()) => {
            info!(task_id, "pruned expired task");
            Ok(())
        }
        Err(e) => {
            warn!(task_id, "failed to prune expired task: {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::error::DashboardError;
    use crate::scheduler::tasks::{NewTask, Task};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        deleted: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl TaskSource for RecordingSource {
        async fn list_tasks(&self) -> Result<Vec<Task>> {
            Ok(Vec::new())
        }
        async fn delete_task(&self, id: &str) -> Result<()> {
            if self.fail {
                return Err(DashboardError::Delete("offline".into()));
            }
            self.deleted.lock().unwrap().push(id.to_owned());
            Ok(())
        }
        async fn create_task(&self, _task: &NewTask) -> Result<Option<Task>> {
            Ok(None)
        }
        async fn update_task(&self, _task: &Task) -> Result<()> {
            Ok(())
        }
        async fn get_task(&self, _id: &str) -> Result<Option<Task>> {
            Ok(None)
        }
    }

    #[test]
    fn record_once_dedupes_until_released() {
        let mut ledger = PruneLedger::new();
        assert!(ledger.record_once("t1"));
        assert!(!ledger.record_once("t1"));
        assert!(ledger.is_pending("t1"));
        assert!(ledger.release("t1"));
        assert!(ledger.record_once("t1"));
    }

    #[test]
    fn retain_present_forgets_deleted_ids() {
        let mut ledger = PruneLedger::new();
        ledger.record_once("t1");
        ledger.record_once("t2");
        let present: HashSet<&str> = ["t2"].into_iter().collect();
        assert_eq!(ledger.retain_present(&present), vec!["t1".to_owned()]);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn prune_calls_delete() {
        let source = RecordingSource::default();
        prune(&source, "t1").await.unwrap();
        assert_eq!(*source.deleted.lock().unwrap(), vec!["t1".to_owned()]);
    }

    #[tokio::test]
    async fn prune_reports_delete_failure() {
        let source = RecordingSource {
            fail: true,
            ..RecordingSource::default()
        };
        let err = prune(&source, "t1").await.unwrap_err();
        assert!(matches!(err, DashboardError::Delete(_)));
    }
}
