//! The two waiting pools.
//!
//! Each pool is a single store record mutated through the backend's atomic
//! update, so membership checks, removals and claims never interleave.
use std::sync::Arc;

use store::{Category, ChatNightStore, StoreError};

const CATEGORIES: [Category; 2] = [Category::Man, Category::Woman];

#[derive(Clone)]
pub struct MatchQueues {
    store: Arc<ChatNightStore>,
}

impl MatchQueues {
    pub fn new(store: Arc<ChatNightStore>) -> Self {
        Self { store }
    }

    /// Oldest first.
    pub fn snapshot(&self, category: Category) -> Result<Vec<String>, StoreError> {
        self.store.queue(category)
    }

    pub fn contains(&self, user_id: &str) -> Result<bool, StoreError> {
        for category in CATEGORIES {
            if self.snapshot(category)?.iter().any(|id| id == user_id) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Append unless already present. Returns whether it was appended.
    pub fn enqueue(&self, user_id: &str, category: Category) -> Result<bool, StoreError> {
        self.store.modify_queue(category, |queue| {
            if queue.iter().any(|id| id == user_id) {
                false
            } else {
                queue.push(user_id.to_string());
                true
            }
        })
    }

    /// Put a claimed user back at the head of the pool.
    pub fn restore(&self, user_id: &str, category: Category) -> Result<(), StoreError> {
        self.store.modify_queue(category, |queue| {
            if !queue.iter().any(|id| id == user_id) {
                queue.insert(0, user_id.to_string());
            }
        })
    }

    /// Remove from both pools. Returns whether anything was removed.
    pub fn leave(&self, user_id: &str) -> Result<bool, StoreError> {
        let mut removed = false;
        for category in CATEGORIES {
            removed |= self.claim(category, user_id)?;
        }
        Ok(removed)
    }

    /// Remove one specific user if still queued.
    pub fn claim(&self, category: Category, user_id: &str) -> Result<bool, StoreError> {
        self.store.modify_queue(category, |queue| {
            let before = queue.len();
            queue.retain(|id| id != user_id);
            queue.len() != before
        })
    }

    /// Pop the first entry among the first `max_scan` that passes
    /// `eligible`.
    pub fn claim_first<F>(
        &self,
        category: Category,
        max_scan: usize,
        eligible: F,
    ) -> Result<Option<String>, StoreError>
    where
        F: Fn(&str) -> bool,
    {
        self.store.modify_queue(category, |queue| {
            let index = queue
                .iter()
                .take(max_scan)
                .position(|id| eligible(id.as_str()))?;
            Some(queue.remove(index))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queues() -> MatchQueues {
        MatchQueues::new(Arc::new(ChatNightStore::in_memory()))
    }

    #[test]
    fn enqueue_is_idempotent() {
        let q = queues();
        assert!(q.enqueue("m1", Category::Man).unwrap());
        assert!(!q.enqueue("m1", Category::Man).unwrap());
        assert_eq!(q.snapshot(Category::Man).unwrap(), vec!["m1"]);
        assert!(q.contains("m1").unwrap());
        assert!(!q.contains("w1").unwrap());
    }

    #[test]
    fn leave_clears_both_pools() {
        let q = queues();
        q.enqueue("x", Category::Man).unwrap();
        q.enqueue("x", Category::Woman).unwrap();
        assert!(q.leave("x").unwrap());
        assert!(!q.contains("x").unwrap());
        assert!(!q.leave("x").unwrap());
    }

    #[test]
    fn claim_first_skips_ineligible_and_keeps_order() {
        let q = queues();
        for id in ["w1", "w2", "w3"] {
            q.enqueue(id, Category::Woman).unwrap();
        }
        let picked = q
            .claim_first(Category::Woman, 50, |id| id != "w1")
            .unwrap();
        assert_eq!(picked.as_deref(), Some("w2"));
        assert_eq!(q.snapshot(Category::Woman).unwrap(), vec!["w1", "w3"]);
    }

    #[test]
    fn claim_first_respects_scan_cap() {
        let q = queues();
        for id in ["w1", "w2", "w3"] {
            q.enqueue(id, Category::Woman).unwrap();
        }
        let picked = q
            .claim_first(Category::Woman, 2, |id| id == "w3")
            .unwrap();
        assert!(picked.is_none());
        assert_eq!(q.snapshot(Category::Woman).unwrap().len(), 3);
    }

    #[test]
    fn restore_puts_user_first_once() {
        let q = queues();
        q.enqueue("a", Category::Man).unwrap();
        q.enqueue("b", Category::Man).unwrap();
        assert_eq!(q.claim_first(Category::Man, 10, |_| true).unwrap().as_deref(), Some("a"));
        q.restore("a", Category::Man).unwrap();
        q.restore("a", Category::Man).unwrap();
        assert_eq!(q.snapshot(Category::Man).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn claim_specific_user() {
        let q = queues();
        q.enqueue("w1", Category::Woman).unwrap();
        q.enqueue("w2", Category::Woman).unwrap();
        assert!(q.claim(Category::Woman, "w2").unwrap());
        assert!(!q.claim(Category::Woman, "w2").unwrap());
        assert_eq!(q.snapshot(Category::Woman).unwrap(), vec!["w1"]);
    }
}
