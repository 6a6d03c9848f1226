//! Attachment operations: metadata plus blob bytes, moderated deletion.

use std::sync::Arc;

use serde::Serialize;

use snag_core::{
    Attachment, AttachmentId, Caller, DefectId, Error, Result, Timestamp,
};
use snag_policy::{Action, PermissionMatrix};
use snag_store::{AttachmentStore, BlobStore, DefectStore};

/// Upload size ceiling: 20 MiB.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Accepted attachment content types.
const ALLOWED_MIME: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// An upload as handed over by the transport.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Deletion report. `file_removed` is honest: when the blob could not be
/// removed the metadata is still gone, but the caller is told the bytes
/// may remain.
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentDeletion {
    pub file_removed: bool,
}

pub struct AttachmentService {
    attachments: Arc<dyn AttachmentStore>,
    defects: Arc<dyn DefectStore>,
    blobs: Arc<dyn BlobStore>,
    matrix: Arc<PermissionMatrix>,
}

impl AttachmentService {
    pub fn new(
        attachments: Arc<dyn AttachmentStore>,
        defects: Arc<dyn DefectStore>,
        blobs: Arc<dyn BlobStore>,
        matrix: Arc<PermissionMatrix>,
    ) -> Self {
        Self {
            attachments,
            defects,
            blobs,
            matrix,
        }
    }

    /// Store an upload: blob first, then metadata. A failed metadata
    /// insert rolls the blob back best-effort so no orphan row can point
    /// at missing bytes.
    pub async fn create(
        &self,
        defect_id: DefectId,
        caller: &Caller,
        upload: AttachmentUpload,
    ) -> Result<Attachment> {
        if upload.file_name.trim().is_empty() {
            return Err(Error::validation("file name is required"));
        }
        if !ALLOWED_MIME.contains(&upload.mime_type.as_str()) {
            return Err(Error::validation(format!(
                "unsupported file type: {}",
                upload.mime_type
            )));
        }
        if upload.data.len() > MAX_UPLOAD_BYTES {
            return Err(Error::validation("file exceeds the 20 MiB upload limit"));
        }
        if self.defects.get_defect(defect_id).await?.is_none() {
            return Err(Error::not_found("defect"));
        }

        let id = AttachmentId::new();
        let storage_path = format!("{defect_id}/{id}");
        self.blobs.write(&storage_path, &upload.data).await?;

        let attachment = Attachment {
            id,
            defect_id,
            author_id: caller.id,
            file_name: sanitize_file_name(&upload.file_name),
            mime_type: upload.mime_type,
            size_bytes: upload.data.len() as i64,
            storage_path: storage_path.clone(),
            created_at: Timestamp::now(),
        };
        if let Err(e) = self.attachments.insert_attachment(attachment.clone()).await {
            if let Err(cleanup) = self.blobs.delete(&storage_path).await {
                tracing::warn!(path = %storage_path, error = %cleanup, "orphan blob left behind");
            }
            return Err(e);
        }
        Ok(attachment)
    }

    pub async fn list(&self, defect_id: DefectId) -> Result<Vec<Attachment>> {
        self.attachments.list_attachments(defect_id).await
    }

    /// Delete an attachment: metadata first, then the blob best-effort.
    ///
    /// The metadata deletion is the authoritative outcome. If the blob
    /// removal then fails, the result says so and the failure is logged;
    /// it is never reported as removed while the bytes demonstrably
    /// remain.
    pub async fn delete(&self, id: AttachmentId, caller: &Caller) -> Result<AttachmentDeletion> {
        let attachment = self
            .attachments
            .get_attachment(id)
            .await?
            .ok_or_else(|| Error::not_found("attachment"))?;
        self.matrix
            .authorize(caller, &Action::DeleteAttachment)
            .require()?;

        if !self.attachments.delete_attachment(id).await? {
            return Err(Error::not_found("attachment"));
        }
        let file_removed = match self.blobs.delete(&attachment.storage_path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    attachment_id = %id,
                    path = %attachment.storage_path,
                    error = %e,
                    "attachment blob could not be removed"
                );
                false
            }
        };
        Ok(AttachmentDeletion { file_removed })
    }

    /// Fetch metadata and bytes for download.
    pub async fn download(&self, id: AttachmentId) -> Result<(Attachment, Vec<u8>)> {
        let attachment = self
            .attachments
            .get_attachment(id)
            .await?
            .ok_or_else(|| Error::not_found("attachment"))?;
        if !self.blobs.exists(&attachment.storage_path).await? {
            return Err(Error::not_found("attachment file"));
        }
        let data = self.blobs.read(&attachment.storage_path).await?;
        Ok((attachment, data))
    }
}

/// Keep only a safe basename: path separators and control characters
/// collapse to underscores.
fn sanitize_file_name(raw: &str) -> String {
    let trimmed = raw.trim();
    let cleaned: String = trimmed
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    if cleaned == "." || cleaned == ".." {
        "_".to_string()
    } else {
        cleaned
    }
}
