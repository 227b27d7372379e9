//! In-memory implementation of [`UploadSessionStore`], used by tests and by
//! the default coordinator when no durable store is configured.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::{BlobResult, BlobError, PartReceipt, UploadId, UploadSession, UploadStatus};
use crate::upload::UploadSessionStore;

#[derive(Default)]
pub struct MemoryUploadSessionStore {
    sessions: Arc<RwLock<HashMap<UploadId, UploadSession>>>,
}

impl MemoryUploadSessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadSessionStore for MemoryUploadSessionStore {
    async fn create(&self, session: UploadSession) -> BlobResult<UploadSession> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(session.upload_id.clone(), session.clone());
        Ok(session)
    }

    async fn get(&self, upload_id: &UploadId) -> BlobResult<UploadSession> {
        self.sessions
            .read()
            .unwrap()
            .get(upload_id)
            .cloned()
            .ok_or_else(|| BlobError::upload_not_found(upload_id.to_string()))
    }

    async fn update(&self, session: UploadSession) -> BlobResult<UploadSession> {
        let mut sessions = self.sessions.write().unwrap();
        if !sessions.contains_key(&session.upload_id) {
            return Err(BlobError::upload_not_found(session.upload_id.to_string()));
        }
        sessions.insert(session.upload_id.clone(), session.clone());
        Ok(session)
    }

    async fn delete(&self, upload_id: &UploadId) -> BlobResult<()> {
        self.sessions.write().unwrap().remove(upload_id);
        Ok(())
    }

    async fn record_part(&self, upload_id: &UploadId, part: PartReceipt) -> BlobResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| BlobError::upload_not_found(upload_id.to_string()))?;
        session.progress.received_bytes += part.size_bytes;
        session.progress.parts.insert(part.part_number, part);
        session.updated_at = now();
        Ok(())
    }

    async fn mark_completed(&self, upload_id: &UploadId, completed_at: i64) -> BlobResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| BlobError::upload_not_found(upload_id.to_string()))?;
        session.status = UploadStatus::Completed { completed_at };
        session.updated_at = completed_at;
        Ok(())
    }

    async fn mark_failed(&self, upload_id: &UploadId, failed_at: i64, reason: String) -> BlobResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| BlobError::upload_not_found(upload_id.to_string()))?;
        session.status = UploadStatus::Failed { failed_at, reason };
        session.updated_at = failed_at;
        Ok(())
    }

    async fn mark_aborted(&self, upload_id: &UploadId, aborted_at: i64) -> BlobResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        let session = sessions
            .get_mut(upload_id)
            .ok_or_else(|| BlobError::upload_not_found(upload_id.to_string()))?;
        session.status = UploadStatus::Aborted { aborted_at };
        session.updated_at = aborted_at;
        Ok(())
    }
}

fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
