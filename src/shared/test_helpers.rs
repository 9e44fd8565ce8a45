//! In-memory doubles and fixtures shared by unit and handler tests.

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::Utc;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use sqlx::types::Json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::core::config::{AutoApprovePolicy, ModerationConfig};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::policy::Role;
use crate::features::auth::IdentityVerifier;
use crate::features::delete_requests::models::{
    DeleteRequest, DeleteRequestStatus, NewDeleteRequest,
};
use crate::features::delete_requests::repositories::DeleteRequestRepository;
use crate::features::delete_requests::DeleteRequestService;
use crate::features::moderator_requests::models::{ModeratorRequest, ModeratorRequestStatus};
use crate::features::moderator_requests::repositories::ModeratorRequestRepository;
use crate::features::moderator_requests::ModeratorRequestService;
use crate::features::notes::dtos::UploadNoteDto;
use crate::features::notes::models::{
    search_keywords, FileRef, ModerationAction, ModerationCounts, ModerationEvent, NewNote, Note,
    NoteChanges, NoteFilter, NoteStatus, ProgramLevel, StatusCounts, UploadType,
};
use crate::features::notes::repositories::NoteRepository;
use crate::features::notes::services::storage_key::{build_storage_key, KeyLocation};
use crate::features::notes::{ModerationService, NoteService};
use crate::features::notifications::models::{NewNotification, Notification, NotificationKind};
use crate::features::notifications::repositories::NotificationRepository;
use crate::features::notifications::{InMemoryNotificationHub, NotificationService};
use crate::features::users::models::{GoogleProfile, User, UserFilter, UserStats};
use crate::features::users::repositories::UserRepository;
use crate::features::users::UserService;
use crate::modules::storage::MemoryObjectStore;

fn injected_failure(what: &str) -> AppError {
    AppError::Internal(format!("injected {} failure", what))
}

fn page<T: Clone>(items: &[T], limit: i64, offset: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .cloned()
        .collect()
}

pub fn sample_user(role: Role) -> User {
    let now = Utc::now();
    let email: String = SafeEmail().fake();
    User {
        id: Uuid::now_v7(),
        email: email.to_lowercase(),
        name: Name().fake(),
        avatar_url: None,
        google_sub: Some(Uuid::new_v4().to_string()),
        role,
        is_active: true,
        stats: UserStats::default(),
        created_at: now,
        updated_at: now,
        last_login_at: None,
    }
}

pub fn authenticated(user: &User) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
    }
}

/// Attach `user` to every request, standing in for the auth middleware
pub fn with_user(router: Router, user: &User) -> Router {
    let identity = authenticated(user);
    router.layer(axum::middleware::from_fn(
        move |mut request: Request, next: Next| {
            let identity = identity.clone();
            async move {
                request.extensions_mut().insert(identity);
                next.run(request).await
            }
        },
    ))
}

/// Valid upload metadata for an OS lecture note at NITK
pub fn sample_upload() -> UploadNoteDto {
    UploadNoteDto {
        title: "Operating Systems Unit 1".to_string(),
        description: Some("Processes and scheduling".to_string()),
        college: "nitk".to_string(),
        course: "cse".to_string(),
        subcourse: None,
        program_level: Some(ProgramLevel::Ug),
        semester: "6".to_string(),
        subject: "os".to_string(),
        upload_type: UploadType::Notes,
        professor: Some("Dr. Rao".to_string()),
        year: Some(2024),
        tags: vec!["scheduling".to_string()],
    }
}

// =============================================================================
// USERS
// =============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    /// Insert or replace by id
    pub fn put(&self, user: User) {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user,
            None => users.push(user),
        }
    }

    fn update<F: FnOnce(&mut User)>(&self, id: Uuid, f: F) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        users.iter_mut().find(|u| u.id == id).map(|user| {
            f(user);
            user.updated_at = Utc::now();
            user.clone()
        })
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn upsert_google(&self, profile: &GoogleProfile, promote_admin: bool) -> Result<User> {
        let email = profile.email.to_lowercase();
        let now = Utc::now();
        let mut users = self.users.lock().unwrap();

        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            if user.name.is_empty() {
                user.name = profile.name.clone();
            }
            if user.avatar_url.is_none() {
                user.avatar_url = profile.avatar_url.clone();
            }
            user.google_sub = Some(profile.sub.clone());
            if promote_admin {
                user.role = Role::Admin;
            }
            user.last_login_at = Some(now);
            user.updated_at = now;
            return Ok(user.clone());
        }

        let user = User {
            id: Uuid::now_v7(),
            email,
            name: profile.name.clone(),
            avatar_url: profile.avatar_url.clone(),
            google_sub: Some(profile.sub.clone()),
            role: if promote_admin { Role::Admin } else { Role::User },
            is_active: true,
            stats: UserStats::default(),
            created_at: now,
            updated_at: now,
            last_login_at: Some(now),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn list(&self, filter: &UserFilter, limit: i64, offset: i64) -> Result<(Vec<User>, i64)> {
        let search = filter.search.as_ref().map(|s| s.trim().to_lowercase());
        let mut matching: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| filter.role.is_none_or(|role| u.role == role))
            .filter(|u| {
                search.as_ref().is_none_or(|s| {
                    u.email.to_lowercase().contains(s) || u.name.to_lowercase().contains(s)
                })
            })
            .cloned()
            .collect();
        matching.reverse();
        let total = matching.len() as i64;
        Ok((page(&matching, limit, offset), total))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>> {
        Ok(self.update(id, |user| {
            if let Some(name) = name {
                user.name = name.to_string();
            }
            if let Some(avatar_url) = avatar_url {
                user.avatar_url = Some(avatar_url.to_string());
            }
        }))
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>> {
        Ok(self.update(id, |user| user.role = role))
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> Result<Option<User>> {
        Ok(self.update(id, |user| user.is_active = is_active))
    }

    async fn save_stats(&self, id: Uuid, stats: &UserStats) -> Result<Option<User>> {
        Ok(self.update(id, |user| {
            user.stats = UserStats {
                stats_updated_at: Some(Utc::now()),
                ..stats.clone()
            };
        }))
    }
}

// =============================================================================
// NOTES
// =============================================================================

#[derive(Default)]
pub struct InMemoryNoteRepository {
    notes: Mutex<Vec<Note>>,
    fail_inserts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl InMemoryNoteRepository {
    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn update<F: FnOnce(&mut Note)>(&self, id: Uuid, f: F) -> Option<Note> {
        let mut notes = self.notes.lock().unwrap();
        notes.iter_mut().find(|n| n.id == id).map(|note| {
            f(note);
            note.updated_at = Utc::now();
            note.clone()
        })
    }

    /// Apply `f` only while the note is still pending
    fn transition<F: FnOnce(&mut Note)>(&self, id: Uuid, f: F) -> Option<Note> {
        let mut notes = self.notes.lock().unwrap();
        notes
            .iter_mut()
            .find(|n| n.id == id && n.status == NoteStatus::Pending)
            .map(|note| {
                f(note);
                note.updated_at = Utc::now();
                note.clone()
            })
    }
}

fn matches_filter(note: &Note, filter: &NoteFilter) -> bool {
    let eq = |wanted: &Option<String>, actual: &str| wanted.as_deref().is_none_or(|w| w == actual);

    filter.status.is_none_or(|s| note.status == s)
        && eq(&filter.college, &note.college)
        && eq(&filter.course, &note.course)
        && filter
            .subcourse
            .as_deref()
            .is_none_or(|s| note.subcourse.as_deref() == Some(s))
        && filter
            .program_level
            .is_none_or(|l| note.program_level == Some(l))
        && eq(&filter.semester, &note.semester)
        && eq(&filter.subject, &note.subject)
        && filter.upload_type.is_none_or(|t| note.upload_type == t)
        && filter.uploader_id.is_none_or(|id| note.uploader_id == Some(id))
        && filter.search.as_deref().is_none_or(|s| {
            note.search_keywords
                .contains(&s.trim().to_lowercase())
        })
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    async fn insert(&self, note: NewNote, event: ModerationEvent) -> Result<Note> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(injected_failure("note insert"));
        }
        let now = Utc::now();
        let note = Note {
            id: note.id,
            title: note.title,
            description: note.description,
            college: note.college,
            course: note.course,
            subcourse: note.subcourse,
            program_level: note.program_level,
            semester: note.semester,
            subject: note.subject,
            upload_type: note.upload_type,
            professor: note.professor,
            year: note.year,
            tags: note.tags,
            file: note.file,
            uploader_id: note.uploader_id,
            status: NoteStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            moderation_history: Json(vec![event]),
            search_keywords: note.search_keywords,
            download_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.notes.lock().unwrap().push(note.clone());
        Ok(note)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Note>> {
        Ok(self.notes.lock().unwrap().iter().find(|n| n.id == id).cloned())
    }

    async fn list(&self, filter: &NoteFilter, limit: i64, offset: i64) -> Result<(Vec<Note>, i64)> {
        let mut matching: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| matches_filter(n, filter))
            .cloned()
            .collect();
        // newest first
        matching.reverse();
        let total = matching.len() as i64;
        Ok((page(&matching, limit, offset), total))
    }

    async fn mark_approved(
        &self,
        id: Uuid,
        actor_id: Option<Uuid>,
        event: ModerationEvent,
    ) -> Result<Option<Note>> {
        Ok(self.transition(id, |note| {
            note.status = NoteStatus::Approved;
            note.approved_by = actor_id;
            note.approved_at = Some(Utc::now());
            note.moderation_history.0.push(event);
        }))
    }

    async fn mark_rejected(
        &self,
        id: Uuid,
        actor_id: Uuid,
        reason: &str,
        event: ModerationEvent,
    ) -> Result<Option<Note>> {
        Ok(self.transition(id, |note| {
            note.status = NoteStatus::Rejected;
            note.rejected_by = Some(actor_id);
            note.rejected_at = Some(Utc::now());
            note.rejection_reason = Some(reason.to_string());
            note.moderation_history.0.push(event);
        }))
    }

    async fn append_history(&self, id: Uuid, event: ModerationEvent) -> Result<Option<Note>> {
        Ok(self.update(id, |note| note.moderation_history.0.push(event)))
    }

    async fn update_file_key(&self, id: Uuid, file_key: &str) -> Result<Option<Note>> {
        Ok(self.update(id, |note| note.file.file_key = file_key.to_string()))
    }

    async fn update_details(
        &self,
        id: Uuid,
        changes: &NoteChanges,
        search_keywords: &str,
        event: ModerationEvent,
    ) -> Result<Option<Note>> {
        Ok(self.update(id, |note| {
            if let Some(title) = &changes.title {
                note.title = title.clone();
            }
            if let Some(description) = &changes.description {
                note.description = Some(description.clone());
            }
            if let Some(professor) = &changes.professor {
                note.professor = Some(professor.clone());
            }
            if let Some(year) = changes.year {
                note.year = Some(year);
            }
            if let Some(tags) = &changes.tags {
                note.tags = tags.clone();
            }
            note.search_keywords = search_keywords.to_string();
            note.moderation_history.0.push(event);
        }))
    }

    async fn increment_downloads(&self, id: Uuid) -> Result<()> {
        let mut notes = self.notes.lock().unwrap();
        if let Some(note) = notes.iter_mut().find(|n| n.id == id) {
            note.download_count += 1;
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected_failure("note delete"));
        }
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|n| n.id != id);
        Ok(notes.len() < before)
    }

    async fn status_counts(&self, uploader_id: Option<Uuid>) -> Result<StatusCounts> {
        let notes = self.notes.lock().unwrap();
        let mut counts = StatusCounts::default();
        for note in notes
            .iter()
            .filter(|n| uploader_id.is_none_or(|id| n.uploader_id == Some(id)))
        {
            match note.status {
                NoteStatus::Pending => counts.pending += 1,
                NoteStatus::Approved => counts.approved += 1,
                NoteStatus::Rejected => counts.rejected += 1,
            }
        }
        Ok(counts)
    }

    async fn moderation_counts(&self, moderator_id: Uuid) -> Result<ModerationCounts> {
        let notes = self.notes.lock().unwrap();
        Ok(ModerationCounts {
            approved: notes
                .iter()
                .filter(|n| n.approved_by == Some(moderator_id))
                .count() as i64,
            rejected: notes
                .iter()
                .filter(|n| n.rejected_by == Some(moderator_id))
                .count() as i64,
        })
    }

    async fn list_stranded(&self, prefix: &str, limit: i64) -> Result<Vec<Note>> {
        let dir = format!("{}/", prefix);
        let mut stranded: Vec<Note> = self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.status == NoteStatus::Approved && n.file.file_key.starts_with(&dir))
            .cloned()
            .collect();
        stranded.sort_by_key(|n| n.approved_at);
        stranded.truncate(limit.max(0) as usize);
        Ok(stranded)
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    notifications: Mutex<Vec<Notification>>,
    fail_inserts: AtomicBool,
}

impl InMemoryNotificationRepository {
    pub fn len(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Kinds delivered to `user_id`, oldest first
    pub fn kinds_for(&self, user_id: Uuid) -> Vec<NotificationKind> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.kind)
            .collect()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn insert(&self, notification: NewNotification) -> Result<Notification> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(injected_failure("notification insert"));
        }
        let notification = Notification {
            id: Uuid::now_v7(),
            user_id: notification.user_id,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            note_id: notification.note_id,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(notification)
    }

    async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Notification>, i64)> {
        let mut matching: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        matching.reverse();
        let total = matching.len() as i64;
        Ok((page(&matching, limit, offset), total))
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Option<Notification>> {
        let mut notifications = self.notifications.lock().unwrap();
        Ok(notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let mut notifications = self.notifications.lock().unwrap();
        let mut flipped = 0;
        for n in notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            flipped += 1;
        }
        Ok(flipped)
    }
}

// =============================================================================
// DELETE REQUESTS
// =============================================================================

#[derive(Default)]
pub struct InMemoryDeleteRequestRepository {
    requests: Mutex<Vec<DeleteRequest>>,
}

#[async_trait]
impl DeleteRequestRepository for InMemoryDeleteRequestRepository {
    async fn insert(&self, request: NewDeleteRequest) -> Result<DeleteRequest> {
        let mut requests = self.requests.lock().unwrap();
        let duplicate = requests.iter().any(|r| {
            r.status == DeleteRequestStatus::Pending && r.note_id == Some(request.note_id)
        });
        if duplicate {
            return Err(AppError::Conflict(
                "A delete request for this note is already pending".to_string(),
            ));
        }

        let now = Utc::now();
        let request = DeleteRequest {
            id: Uuid::now_v7(),
            note_id: Some(request.note_id),
            note_title: request.note_title,
            requested_by: request.requested_by,
            reason: request.reason,
            status: DeleteRequestStatus::Pending,
            reviewed_by: None,
            review_reason: None,
            reviewed_at: None,
            executed_at: None,
            created_at: now,
            updated_at: now,
        };
        requests.push(request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DeleteRequest>> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list(
        &self,
        status: Option<DeleteRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<DeleteRequest>, i64)> {
        let matching: Vec<DeleteRequest> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        Ok((page(&matching, limit, offset), total))
    }

    async fn mark_reviewed(
        &self,
        id: Uuid,
        status: DeleteRequestStatus,
        reviewer_id: Uuid,
        review_reason: Option<&str>,
    ) -> Result<Option<DeleteRequest>> {
        let mut requests = self.requests.lock().unwrap();
        Ok(requests
            .iter_mut()
            .find(|r| r.id == id && r.status == DeleteRequestStatus::Pending)
            .map(|r| {
                let now = Utc::now();
                r.status = status;
                r.reviewed_by = Some(reviewer_id);
                r.review_reason = review_reason.map(str::to_string);
                r.reviewed_at = Some(now);
                r.updated_at = now;
                r.clone()
            }))
    }

    async fn mark_executed(&self, id: Uuid) -> Result<Option<DeleteRequest>> {
        let mut requests = self.requests.lock().unwrap();
        Ok(requests
            .iter_mut()
            .find(|r| r.id == id && r.status == DeleteRequestStatus::Approved)
            .map(|r| {
                let now = Utc::now();
                r.status = DeleteRequestStatus::Executed;
                r.executed_at = Some(now);
                r.updated_at = now;
                r.clone()
            }))
    }
}

// =============================================================================
// MODERATOR REQUESTS
// =============================================================================

#[derive(Default)]
pub struct InMemoryModeratorRequestRepository {
    requests: Mutex<Vec<ModeratorRequest>>,
}

#[async_trait]
impl ModeratorRequestRepository for InMemoryModeratorRequestRepository {
    async fn insert(&self, user_id: Uuid, motivation: &str) -> Result<ModeratorRequest> {
        let mut requests = self.requests.lock().unwrap();
        if requests
            .iter()
            .any(|r| r.user_id == user_id && r.status == ModeratorRequestStatus::Pending)
        {
            return Err(AppError::Conflict(
                "You already have a pending moderator application".to_string(),
            ));
        }

        let now = Utc::now();
        let request = ModeratorRequest {
            id: Uuid::now_v7(),
            user_id,
            motivation: motivation.to_string(),
            status: ModeratorRequestStatus::Pending,
            reviewed_by: None,
            review_reason: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };
        requests.push(request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ModeratorRequest>> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<ModeratorRequest>> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.user_id == user_id)
            .cloned())
    }

    async fn list(
        &self,
        status: Option<ModeratorRequestStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ModeratorRequest>, i64)> {
        let matching: Vec<ModeratorRequest> = self
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        Ok((page(&matching, limit, offset), total))
    }

    async fn mark_reviewed(
        &self,
        id: Uuid,
        status: ModeratorRequestStatus,
        reviewer_id: Uuid,
        review_reason: Option<&str>,
    ) -> Result<Option<ModeratorRequest>> {
        let mut requests = self.requests.lock().unwrap();
        Ok(requests
            .iter_mut()
            .find(|r| r.id == id && r.status == ModeratorRequestStatus::Pending)
            .map(|r| {
                let now = Utc::now();
                r.status = status;
                r.reviewed_by = Some(reviewer_id);
                r.review_reason = review_reason.map(str::to_string);
                r.reviewed_at = Some(now);
                r.updated_at = now;
                r.clone()
            }))
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Verifier that either accepts every token for one email or rejects all
pub struct StaticIdentityVerifier {
    email: Option<String>,
}

impl StaticIdentityVerifier {
    pub fn accepting(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
        }
    }

    pub fn rejecting() -> Self {
        Self { email: None }
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, _id_token: &str) -> Result<GoogleProfile> {
        let email = self
            .email
            .clone()
            .ok_or_else(|| AppError::Auth("Invalid Google ID token".to_string()))?;
        Ok(GoogleProfile {
            sub: format!("google-{}", email),
            name: email.split('@').next().unwrap_or_default().to_string(),
            email,
            avatar_url: None,
        })
    }
}

// =============================================================================
// WIRING
// =============================================================================

/// Every service wired against in-memory doubles
pub struct TestContext {
    pub users: Arc<UserService>,
    pub user_repo: Arc<InMemoryUserRepository>,
    pub note_repo: Arc<InMemoryNoteRepository>,
    pub notification_repo: Arc<InMemoryNotificationRepository>,
    pub store: Arc<MemoryObjectStore>,
    pub moderation: Arc<ModerationService>,
    pub notes: Arc<NoteService>,
    pub delete_requests: Arc<DeleteRequestService>,
    pub moderator_requests: Arc<ModeratorRequestService>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_auto_approve(AutoApprovePolicy::Off)
    }

    pub fn with_auto_approve(auto_approve: AutoApprovePolicy) -> Self {
        let user_repo = Arc::new(InMemoryUserRepository::default());
        let note_repo = Arc::new(InMemoryNoteRepository::default());
        let notification_repo = Arc::new(InMemoryNotificationRepository::default());
        let store = Arc::new(MemoryObjectStore::new());

        let notifications = Arc::new(NotificationService::new(
            notification_repo.clone(),
            Arc::new(InMemoryNotificationHub::new()),
        ));
        let users = Arc::new(UserService::new(
            user_repo.clone(),
            note_repo.clone(),
            notifications.clone(),
        ));
        let moderation = Arc::new(ModerationService::new(
            note_repo.clone(),
            store.clone(),
            users.clone(),
            notifications.clone(),
            ModerationConfig {
                auto_approve,
                max_upload_size: 1024 * 1024,
            },
        ));
        let notes = Arc::new(NoteService::new(note_repo.clone(), store.clone(), 3600));
        let delete_requests = Arc::new(DeleteRequestService::new(
            Arc::new(InMemoryDeleteRequestRepository::default()),
            note_repo.clone(),
            moderation.clone(),
            notifications.clone(),
        ));
        let moderator_requests = Arc::new(ModeratorRequestService::new(
            Arc::new(InMemoryModeratorRequestRepository::default()),
            users.clone(),
            notifications,
        ));

        Self {
            users,
            user_repo,
            note_repo,
            notification_repo,
            store,
            moderation,
            notes,
            delete_requests,
            moderator_requests,
        }
    }

    pub async fn seed_user(&self, role: Role) -> User {
        let user = sample_user(role);
        self.user_repo.put(user.clone());
        user
    }

    /// Pending note whose blob sits under the pending prefix
    pub async fn seed_pending_note(&self, uploader_id: Option<Uuid>) -> Note {
        let dto = sample_upload();
        let now = Utc::now();
        let location = KeyLocation {
            college: &dto.college,
            program_level: dto.program_level,
            course: &dto.course,
            subcourse: dto.subcourse.as_deref(),
            semester: &dto.semester,
            subject: &dto.subject,
            upload_type: dto.upload_type,
        };
        let file_name = format!("notes-{}.pdf", Uuid::new_v4().simple());
        let key = build_storage_key(
            &location,
            &file_name,
            "application/pdf",
            true,
            now.timestamp_millis(),
        );
        self.store.insert(&key, b"%PDF-1.7 seeded");

        let note = NewNote {
            id: Uuid::now_v7(),
            search_keywords: search_keywords(
                &dto.title,
                &dto.subject,
                &dto.course,
                None,
                dto.professor.as_deref(),
                &dto.tags,
            ),
            title: dto.title,
            description: dto.description,
            college: dto.college,
            course: dto.course,
            subcourse: dto.subcourse,
            program_level: dto.program_level,
            semester: dto.semester,
            subject: dto.subject,
            upload_type: dto.upload_type,
            professor: dto.professor,
            year: dto.year,
            tags: dto.tags,
            file: FileRef {
                file_name,
                file_key: key,
                bucket: "test-bucket".to_string(),
                mime_type: "application/pdf".to_string(),
                file_size: 15,
                checksum: None,
                uploaded_at: now,
            },
            uploader_id,
        };
        let event = ModerationEvent::new(ModerationAction::Uploaded, uploader_id);
        self.note_repo.insert(note, event).await.unwrap()
    }

    /// Approved note without relocation or notifications; its blob is still
    /// under the pending prefix
    pub async fn seed_approved_note(&self, uploader_id: Option<Uuid>) -> Note {
        let note = self.seed_pending_note(uploader_id).await;
        let event = ModerationEvent::new(ModerationAction::Approved, None);
        self.note_repo
            .mark_approved(note.id, None, event)
            .await
            .unwrap()
            .unwrap()
    }
}
