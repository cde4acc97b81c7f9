//! In-memory store for contact submissions received by the relay endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub status: SubmissionStatus,
}

impl ContactSubmission {
    pub fn new(name: String, email: String, subject: Option<String>, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            subject,
            message,
            timestamp: Utc::now(),
            status: SubmissionStatus::Pending,
        }
    }
}

#[derive(Default)]
struct Inner {
    order: VecDeque<Uuid>,
    submissions: HashMap<Uuid, ContactSubmission>,
}

/// Bounded store; once full, the oldest submission is evicted.
#[derive(Clone)]
pub struct SubmissionStore {
    inner: Arc<RwLock<Inner>>,
    capacity: usize,
}

impl SubmissionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            capacity: capacity.max(1),
        }
    }

    pub fn insert(&self, submission: ContactSubmission) -> Result<ContactSubmission> {
        let mut inner = self.inner.write()
            .map_err(|_| AppError::InternalServerError)?;

        while inner.order.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.submissions.remove(&oldest);
            }
        }

        inner.order.push_back(submission.id);
        inner.submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    pub fn get(&self, id: Uuid) -> Result<ContactSubmission> {
        let inner = self.inner.read()
            .map_err(|_| AppError::InternalServerError)?;

        inner.submissions.get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))
    }

    /// Newest first.
    pub fn list(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<ContactSubmission>> {
        let inner = self.inner.read()
            .map_err(|_| AppError::InternalServerError)?;

        let offset = offset.unwrap_or(0);
        let limit = limit.unwrap_or(inner.order.len());

        Ok(inner.order
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .filter_map(|id| inner.submissions.get(id).cloned())
            .collect())
    }

    pub fn update_status(&self, id: Uuid, status: SubmissionStatus) -> Result<ContactSubmission> {
        let mut inner = self.inner.write()
            .map_err(|_| AppError::InternalServerError)?;

        let submission = inner.submissions.get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))?;

        submission.status = status;
        Ok(submission.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.order.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_stats(&self) -> Result<serde_json::Value> {
        let inner = self.inner.read()
            .map_err(|_| AppError::InternalServerError)?;

        let count = |status: SubmissionStatus| {
            inner.submissions.values().filter(|s| s.status == status).count()
        };

        Ok(serde_json::json!({
            "total_submissions": inner.submissions.len(),
            "pending": count(SubmissionStatus::Pending),
            "sent": count(SubmissionStatus::Sent),
            "failed": count(SubmissionStatus::Failed),
            "capacity": self.capacity,
        }))
    }
}

impl Default for SubmissionStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}
