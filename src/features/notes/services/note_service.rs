use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::{self, Role};
use crate::features::notes::dtos::{
    DownloadResponseDto, NoteQueryParams, NoteResponseDto, NoteStatsDto,
};
use crate::features::notes::models::{Note, NoteFilter, NoteStatus};
use crate::features::notes::repositories::NoteRepository;
use crate::modules::storage::ObjectStore;
use crate::shared::types::PaginationQuery;

/// A note is visible when approved, to its uploader, and to moderators
pub fn is_visible_to(note: &Note, viewer: Option<&AuthenticatedUser>) -> bool {
    note.status == NoteStatus::Approved
        || viewer.is_some_and(|v| v.is_moderator() || note.is_owned_by(v.user_id))
}

/// Read side of notes: browsing, detail, download links and counters
pub struct NoteService {
    notes: Arc<dyn NoteRepository>,
    store: Arc<dyn ObjectStore>,
    presign_ttl_secs: u32,
}

impl NoteService {
    pub fn new(
        notes: Arc<dyn NoteRepository>,
        store: Arc<dyn ObjectStore>,
        presign_ttl_secs: u32,
    ) -> Self {
        Self {
            notes,
            store,
            presign_ttl_secs,
        }
    }

    /// Visible note, or `NotFound` so hidden notes do not leak their existence
    async fn find_visible(&self, viewer: Option<&AuthenticatedUser>, id: Uuid) -> Result<Note> {
        self.notes
            .find_by_id(id)
            .await?
            .filter(|note| is_visible_to(note, viewer))
            .ok_or_else(|| AppError::NotFound(format!("Note '{}' not found", id)))
    }

    pub async fn list(
        &self,
        viewer: Option<&AuthenticatedUser>,
        params: NoteQueryParams,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<NoteResponseDto>, i64)> {
        let mut filter = NoteFilter::from(params);
        if !viewer.is_some_and(|v| v.is_moderator()) {
            filter.status = Some(NoteStatus::Approved);
        }

        let (notes, total) = self
            .notes
            .list(&filter, pagination.limit(), pagination.offset())
            .await?;
        Ok((notes.into_iter().map(Into::into).collect(), total))
    }

    /// The caller's own uploads in every status
    pub async fn mine(
        &self,
        user: &AuthenticatedUser,
        params: NoteQueryParams,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<NoteResponseDto>, i64)> {
        let filter = NoteFilter {
            uploader_id: Some(user.user_id),
            ..NoteFilter::from(params)
        };

        let (notes, total) = self
            .notes
            .list(&filter, pagination.limit(), pagination.offset())
            .await?;
        Ok((notes.into_iter().map(Into::into).collect(), total))
    }

    /// Note detail with a best-effort download link
    pub async fn get(
        &self,
        viewer: Option<&AuthenticatedUser>,
        id: Uuid,
    ) -> Result<NoteResponseDto> {
        let note = self.find_visible(viewer, id).await?;

        let download_url = match self
            .store
            .presigned_get_url(
                &note.file.file_key,
                self.presign_ttl_secs,
                Some(&note.file.file_name),
            )
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Failed to sign download URL for note {}: {}", id, e);
                None
            }
        };

        Ok(NoteResponseDto {
            download_url,
            ..note.into()
        })
    }

    /// Sign a download link and count the download
    pub async fn download(
        &self,
        viewer: Option<&AuthenticatedUser>,
        id: Uuid,
    ) -> Result<DownloadResponseDto> {
        let note = self.find_visible(viewer, id).await?;

        let url = self
            .store
            .presigned_get_url(
                &note.file.file_key,
                self.presign_ttl_secs,
                Some(&note.file.file_name),
            )
            .await?;

        if let Err(e) = self.notes.increment_downloads(id).await {
            tracing::warn!("Failed to count download of note {}: {}", id, e);
        }

        Ok(DownloadResponseDto {
            url,
            file_name: note.file.file_name,
            expires_in: self.presign_ttl_secs,
        })
    }

    /// Catalogue-wide counts per status
    pub async fn stats(&self, actor: &AuthenticatedUser) -> Result<NoteStatsDto> {
        policy::require(actor.role, Role::Moderator)?;
        Ok(self.notes.status_counts(None).await?.into())
    }
}
