//! Comment operations.

use std::sync::Arc;

use serde::Deserialize;

use snag_core::{
    model::COMMENT_MAX, Caller, Comment, CommentId, DefectId, Error, Result, Timestamp,
};
use snag_policy::{Action, PermissionMatrix};
use snag_query::{Page, Paged};
use snag_store::{CommentStore, DefectStore};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    pub text: String,
}

pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    defects: Arc<dyn DefectStore>,
    matrix: Arc<PermissionMatrix>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentStore>,
        defects: Arc<dyn DefectStore>,
        matrix: Arc<PermissionMatrix>,
    ) -> Self {
        Self {
            comments,
            defects,
            matrix,
        }
    }

    pub async fn create(
        &self,
        defect_id: DefectId,
        caller: &Caller,
        input: CreateCommentInput,
    ) -> Result<CommentId> {
        let text = input.text.trim().to_string();
        if text.is_empty() {
            return Err(Error::validation("comment text is required"));
        }
        if text.chars().count() > COMMENT_MAX {
            return Err(Error::validation(format!(
                "comment exceeds {COMMENT_MAX} characters"
            )));
        }
        if self.defects.get_defect(defect_id).await?.is_none() {
            return Err(Error::not_found("defect"));
        }

        let comment = Comment {
            id: CommentId::new(),
            defect_id,
            author_id: caller.id,
            text,
            created_at: Timestamp::now(),
        };
        let id = comment.id;
        self.comments.insert_comment(comment).await?;
        Ok(id)
    }

    /// Comments for a defect, oldest first.
    pub async fn list(
        &self,
        defect_id: DefectId,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> Result<Paged<Comment>> {
        let page = Page::from_raw(limit, offset);
        self.comments.list_comments(defect_id, page).await
    }

    /// Delete a comment: its author may, and so may any moderator role.
    pub async fn delete(&self, id: CommentId, caller: &Caller) -> Result<()> {
        let comment = self
            .comments
            .get_comment(id)
            .await?
            .ok_or_else(|| Error::not_found("comment"))?;
        self.matrix
            .authorize(
                caller,
                &Action::DeleteComment {
                    author: comment.author_id,
                },
            )
            .require()?;
        if !self.comments.delete_comment(id).await? {
            return Err(Error::not_found("comment"));
        }
        Ok(())
    }
}
