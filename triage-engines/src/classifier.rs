//! External classifier contract and asynchronous write-back.
//!
//! The classifier is an opaque collaborator: it takes a work item and
//! returns a `Classification`. It runs fire-and-forget relative to the
//! request path that created the item; assignment never waits for it and
//! may legitimately run first, on the item's defaults.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use triage_core::{
    ActivityRecord, Category, Classification, Priority, TriageError, TriageResult, WorkItem,
    WorkItemId,
};
use triage_storage::WorkItemStore;

/// Bounded retries for CAS losers before giving up with `Conflict`.
const MAX_COMMIT_ATTEMPTS: usize = 8;

/// Classifier failure. Internal causes are opaque to this crate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classification failed: {reason}")]
    Failed { reason: String },
}

/// Contract for the external classification collaborator.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify one work item. May fail; callers degrade gracefully and
    /// keep the item's defaults.
    async fn classify(&self, item: &WorkItem) -> Result<Classification, ClassifierError>;
}

// ============================================================================
// KEYWORD CLASSIFIER
// ============================================================================

/// Rule-based keyword classifier.
///
/// A fast heuristic implementation of the contract, usable standalone or as
/// the fallback when a smarter classifier is unavailable.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    urgent_keywords: Vec<&'static str>,
    high_keywords: Vec<&'static str>,
    complaint_keywords: Vec<&'static str>,
    question_openers: Vec<&'static str>,
    tag_keywords: Vec<&'static str>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            urgent_keywords: vec![
                "urgent",
                "asap",
                "immediately",
                "emergency",
                "critical",
                "down",
                "broken",
                "not working",
                "can't access",
                "crashed",
                "losing money",
                "losing business",
                "production down",
                "security breach",
                "data loss",
                "can't login",
            ],
            high_keywords: vec![
                "important",
                "soon",
                "issue",
                "problem",
                "error",
                "billing issue",
                "charged twice",
                "refund needed",
                "account locked",
                "payment failed",
            ],
            complaint_keywords: vec![
                "terrible",
                "awful",
                "worst",
                "disappointed",
                "frustrated",
                "angry",
                "unacceptable",
                "scam",
                "fraud",
                "complaint",
            ],
            question_openers: vec!["how", "what", "when", "where", "why", "can i", "is there"],
            tag_keywords: vec!["billing", "payment", "api", "technical", "sales", "pricing"],
        }
    }
}

impl KeywordClassifier {
    /// Create a classifier with the default keyword tables.
    pub fn new() -> Self {
        Self::default()
    }

    fn detect_priority(&self, text: &str) -> Priority {
        if self.urgent_keywords.iter().any(|k| text.contains(k)) {
            return Priority::Urgent;
        }
        if self.high_keywords.iter().any(|k| text.contains(k)) {
            return Priority::High;
        }
        // Complaints warrant attention even without an explicit issue word.
        if self.complaint_keywords.iter().any(|k| text.contains(k)) {
            return Priority::High;
        }
        if self.question_openers.iter().any(|k| text.starts_with(k)) {
            return Priority::Low;
        }
        Priority::Medium
    }

    fn detect_category(&self, text: &str) -> Category {
        if text.contains("bug") || text.contains("crash") || text.contains("error") {
            return Category::BugReport;
        }
        if self.complaint_keywords.iter().any(|k| text.contains(k)) {
            return Category::Complaint;
        }
        if text.contains("feature") || text.contains("please add") || text.contains("request") {
            return Category::Request;
        }
        if text.contains('?') || self.question_openers.iter().any(|k| text.starts_with(k)) {
            return Category::Question;
        }
        Category::General
    }

    fn extract_tags(&self, text: &str) -> Vec<String> {
        self.tag_keywords
            .iter()
            .filter(|k| text.contains(*k))
            .map(|k| k.to_string())
            .collect()
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, item: &WorkItem) -> Result<Classification, ClassifierError> {
        let text = format!("{} {}", item.subject, item.body).to_lowercase();
        Ok(Classification {
            category: self.detect_category(&text),
            priority: self.detect_priority(&text),
            tags: self.extract_tags(&text),
            reasoning: "keyword heuristic".to_string(),
            sentiment: None,
        })
    }
}

// ============================================================================
// WRITE-BACK
// ============================================================================

/// Classify an item and write the result back through the store's CAS.
///
/// A classifier failure degrades gracefully: the item keeps its defaults
/// and no journal entry is written.
pub async fn classify_and_store(
    store: Arc<dyn WorkItemStore>,
    classifier: Arc<dyn Classifier>,
    item_id: WorkItemId,
) -> TriageResult<WorkItem> {
    for _ in 0..MAX_COMMIT_ATTEMPTS {
        let mut item = store
            .work_item_get(item_id)
            .await?
            .ok_or_else(|| TriageError::work_item_not_found(item_id))?;

        let classification = match classifier.classify(&item).await {
            Ok(classification) => classification,
            Err(err) => {
                tracing::warn!(work_item_id = %item_id, error = %err, "classification failed, keeping defaults");
                return Ok(item);
            }
        };

        item.category = classification.category;
        item.priority = classification.priority;
        item.tags = classification.tags.clone();

        let record = ActivityRecord::classified(item_id, &classification);
        match store.work_item_commit_with_activity(&item, &record).await {
            Ok(committed) => {
                tracing::info!(
                    work_item_id = %item_id,
                    category = %committed.category,
                    priority = %committed.priority,
                    "classification stored"
                );
                return Ok(committed);
            }
            Err(err) if err.is_conflict() => continue,
            Err(err) => return Err(err),
        }
    }
    Err(TriageError::Conflict {
        entity: triage_core::EntityKind::WorkItem,
        id: item_id,
    })
}

/// Fire-and-forget classification.
///
/// Runs after the item has a stable identity and never blocks or gates an
/// assignment decision.
pub fn spawn_classification(
    store: Arc<dyn WorkItemStore>,
    classifier: Arc<dyn Classifier>,
    item_id: WorkItemId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = classify_and_store(store, classifier, item_id).await {
            tracing::warn!(work_item_id = %item_id, error = %err, "classification write-back failed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::Channel;
    use triage_storage::InMemoryStore;

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::new()
    }

    #[tokio::test]
    async fn test_urgent_keywords_win() {
        let item = WorkItem::new(Channel::Email, "Production down", "everything crashed");
        let result = classifier().classify(&item).await.unwrap();
        assert_eq!(result.priority, Priority::Urgent);
    }

    #[tokio::test]
    async fn test_complaints_rank_high() {
        let item = WorkItem::new(Channel::Chat, "Service", "this is unacceptable and awful");
        let result = classifier().classify(&item).await.unwrap();
        assert_eq!(result.priority, Priority::High);
        assert_eq!(result.category, Category::Complaint);
    }

    #[tokio::test]
    async fn test_questions_rank_low() {
        let item = WorkItem::new(Channel::Email, "How do I export data", "how does export work");
        let result = classifier().classify(&item).await.unwrap();
        assert_eq!(result.priority, Priority::Low);
        assert_eq!(result.category, Category::Question);
    }

    #[tokio::test]
    async fn test_tags_extracted_for_routing() {
        let item = WorkItem::new(
            Channel::Email,
            "Billing question",
            "my payment failed on the api",
        );
        let result = classifier().classify(&item).await.unwrap();
        assert!(result.tags.contains(&"billing".to_string()));
        assert!(result.tags.contains(&"payment".to_string()));
        assert!(result.tags.contains(&"api".to_string()));
    }

    #[tokio::test]
    async fn test_write_back_updates_item_and_journals() {
        let store = Arc::new(InMemoryStore::new());
        let item = WorkItem::new(Channel::Email, "Production down", "crashed");
        store.work_item_insert(&item).await.unwrap();

        let updated = classify_and_store(
            store.clone(),
            Arc::new(classifier()),
            item.work_item_id,
        )
        .await
        .unwrap();

        assert_eq!(updated.priority, Priority::Urgent);
        let journal = store.activity_list_by_item(item.work_item_id).await.unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].action, "classified");
    }

    #[tokio::test]
    async fn test_failing_classifier_degrades_gracefully() {
        struct Failing;

        #[async_trait]
        impl Classifier for Failing {
            async fn classify(&self, _: &WorkItem) -> Result<Classification, ClassifierError> {
                Err(ClassifierError::Failed {
                    reason: "model offline".to_string(),
                })
            }
        }

        let store = Arc::new(InMemoryStore::new());
        let item = WorkItem::new(Channel::Email, "s", "b");
        store.work_item_insert(&item).await.unwrap();

        let result = classify_and_store(store.clone(), Arc::new(Failing), item.work_item_id)
            .await
            .unwrap();
        // Defaults kept, nothing journaled.
        assert_eq!(result.category, Category::General);
        assert_eq!(result.priority, Priority::Medium);
        assert_eq!(store.activity_count(), 0);
    }

    #[tokio::test]
    async fn test_spawned_classification_lands() {
        let store = Arc::new(InMemoryStore::new());
        let item = WorkItem::new(Channel::Email, "urgent help", "production down");
        store.work_item_insert(&item).await.unwrap();

        let handle = spawn_classification(
            store.clone(),
            Arc::new(classifier()),
            item.work_item_id,
        );
        handle.await.unwrap();

        let stored = store.work_item_get(item.work_item_id).await.unwrap().unwrap();
        assert_eq!(stored.priority, Priority::Urgent);
    }
}
