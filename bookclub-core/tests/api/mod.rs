//! API integration tests infrastructure
//!
//! In-memory repository implementations that honour the same uniqueness
//! rules as the MySQL schema, so handler tests see realistic conflicts.

pub mod http;

use async_trait::async_trait;
use bookclub_core::domain::{
    Member, MemberId, MemberSummary, NewSketch, Session, Sketch, SketchId, SketchMetadata,
};
use bookclub_core::error::{AppError, Result};
use bookclub_core::repository::sketch::slug_conflict;
use bookclub_core::repository::{MemberRepository, SessionRepository, SketchRepository};
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::RwLock;

// ============================================================================
// Members
// ============================================================================

pub struct TestMemberRepository {
    members: RwLock<Vec<Member>>,
    next_id: AtomicI64,
}

impl TestMemberRepository {
    pub fn new() -> Self {
        Self {
            members: RwLock::new(vec![]),
            next_id: AtomicI64::new(1),
        }
    }

    pub async fn set_verified(&self, name: &str, verified: bool) {
        let mut members = self.members.write().await;
        if let Some(member) = members.iter_mut().find(|m| m.name == name) {
            member.verified = verified;
        }
    }
}

#[async_trait]
impl MemberRepository for TestMemberRepository {
    async fn create(&self, name: &str, password_hash: &str) -> Result<Member> {
        let mut members = self.members.write().await;
        if members.iter().any(|m| m.name == name) {
            return Err(AppError::Conflict("name already exists".to_string()));
        }

        let now = Utc::now();
        let member = Member {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            verified: false,
            created_at: now,
            updated_at: now,
        };
        members.push(member.clone());
        Ok(member)
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>> {
        let members = self.members.read().await;
        Ok(members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Member>> {
        let members = self.members.read().await;
        Ok(members.iter().find(|m| m.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<MemberSummary>> {
        let mut list: Vec<MemberSummary> = self
            .members
            .read()
            .await
            .iter()
            .cloned()
            .map(MemberSummary::from)
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn update_password_hash(&self, id: MemberId, password_hash: &str) -> Result<()> {
        let mut members = self.members.write().await;
        let member = members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| AppError::NotFound("Member not found".to_string()))?;
        member.password_hash = password_hash.to_string();
        member.updated_at = Utc::now();
        Ok(())
    }
}

// ============================================================================
// Sessions
// ============================================================================

pub struct TestSessionRepository {
    sessions: RwLock<Vec<Session>>,
}

impl TestSessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(vec![]),
        }
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Move every session's expiry into the past
    pub async fn expire_all(&self) {
        let past = Utc::now() - Duration::seconds(1);
        for session in self.sessions.write().await.iter_mut() {
            session.created_at = past - Duration::hours(24);
            session.expires_at = past;
        }
    }
}

#[async_trait]
impl SessionRepository for TestSessionRepository {
    async fn create(&self, session: &Session) -> Result<()> {
        self.sessions.write().await.push(session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.write().await.retain(|s| s.id != id);
        Ok(())
    }
}

// ============================================================================
// Sketches
// ============================================================================

pub struct TestSketchRepository {
    sketches: RwLock<Vec<Sketch>>,
    next_id: AtomicI64,
    /// Simulates a concurrent writer: existence checks see nothing, so only
    /// the insert-time uniqueness rule can catch duplicates.
    blind_existence_checks: AtomicBool,
}

impl TestSketchRepository {
    pub fn new() -> Self {
        Self {
            sketches: RwLock::new(vec![]),
            next_id: AtomicI64::new(1),
            blind_existence_checks: AtomicBool::new(false),
        }
    }

    pub fn blind_existence_checks(&self) {
        self.blind_existence_checks.store(true, Ordering::SeqCst);
    }

    pub async fn slugs_for(&self, member_id: MemberId) -> Vec<String> {
        self.sketches
            .read()
            .await
            .iter()
            .filter(|s| s.member_id == member_id)
            .map(|s| s.slug.clone())
            .collect()
    }

    fn not_found() -> AppError {
        AppError::NotFound("Sketch not found".to_string())
    }
}

#[async_trait]
impl SketchRepository for TestSketchRepository {
    async fn create(&self, sketch: &NewSketch) -> Result<Sketch> {
        let mut sketches = self.sketches.write().await;
        if sketches
            .iter()
            .any(|s| s.member_id == sketch.member_id && s.slug == sketch.slug)
        {
            return Err(slug_conflict(&sketch.slug));
        }

        let now = Utc::now();
        let stored = Sketch {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            member_id: sketch.member_id,
            slug: sketch.slug.clone(),
            title: sketch.title.clone(),
            description: sketch.description.clone(),
            keywords: sketch.keywords.clone(),
            tags: sketch.tags.clone(),
            external_libs: sketch.external_libs.clone(),
            source_code: sketch.source_code.clone(),
            created_at: now,
            updated_at: now,
        };
        sketches.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: SketchId) -> Result<Option<Sketch>> {
        let sketches = self.sketches.read().await;
        Ok(sketches.iter().find(|s| s.id == id).cloned())
    }

    async fn find_by_member_and_slug(
        &self,
        member_id: MemberId,
        slug: &str,
    ) -> Result<Option<Sketch>> {
        let sketches = self.sketches.read().await;
        Ok(sketches
            .iter()
            .find(|s| s.member_id == member_id && s.slug == slug)
            .cloned())
    }

    async fn slug_exists(
        &self,
        member_id: MemberId,
        slug: &str,
        exclude_id: Option<SketchId>,
    ) -> Result<bool> {
        if self.blind_existence_checks.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let sketches = self.sketches.read().await;
        Ok(sketches.iter().any(|s| {
            s.member_id == member_id && s.slug == slug && Some(s.id) != exclude_id
        }))
    }

    async fn list_by_member(&self, member_id: MemberId) -> Result<Vec<Sketch>> {
        let mut list: Vec<Sketch> = self
            .sketches
            .read()
            .await
            .iter()
            .filter(|s| s.member_id == member_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(list)
    }

    async fn update_source(&self, id: SketchId, source_code: &str) -> Result<Sketch> {
        let mut sketches = self.sketches.write().await;
        let sketch = sketches
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(Self::not_found)?;
        sketch.source_code = source_code.to_string();
        sketch.updated_at = Utc::now();
        Ok(sketch.clone())
    }

    async fn update_metadata(&self, id: SketchId, metadata: &SketchMetadata) -> Result<Sketch> {
        let mut sketches = self.sketches.write().await;
        let member_id = sketches
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.member_id)
            .ok_or_else(Self::not_found)?;
        if sketches
            .iter()
            .any(|s| s.member_id == member_id && s.slug == metadata.slug && s.id != id)
        {
            return Err(slug_conflict(&metadata.slug));
        }

        let sketch = sketches
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(Self::not_found)?;
        sketch.slug = metadata.slug.clone();
        sketch.title = metadata.title.clone();
        sketch.description = metadata.description.clone();
        sketch.keywords = metadata.keywords.clone();
        sketch.tags = metadata.tags.clone();
        sketch.external_libs = metadata.external_libs.clone();
        sketch.updated_at = Utc::now();
        Ok(sketch.clone())
    }

    async fn delete(&self, id: SketchId) -> Result<()> {
        let mut sketches = self.sketches.write().await;
        let before = sketches.len();
        sketches.retain(|s| s.id != id);
        if sketches.len() == before {
            return Err(Self::not_found());
        }
        Ok(())
    }
}
