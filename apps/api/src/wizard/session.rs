//! Wizard session state and its guarded transitions.
//!
//! Every mutation names a `WizardAction`; the action is only legal from one
//! stage, and the session refuses anything else with `InvalidTransition`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::trends::TrendReport;
use crate::wizard::models::{Recommendation, SkillSet, UserProfile, VerificationItem};

/// Rating a freshly confirmed skill starts with.
pub const DEFAULT_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    Start,
    DetailsSubmitted,
    SkillsSelected,
    RatingsSubmitted,
    Verified,
    Recommended,
}

impl fmt::Display for WizardStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardStage::Start => "start",
            WizardStage::DetailsSubmitted => "details_submitted",
            WizardStage::SkillsSelected => "skills_selected",
            WizardStage::RatingsSubmitted => "ratings_submitted",
            WizardStage::Verified => "verified",
            WizardStage::Recommended => "recommended",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    SubmitDetails,
    SuggestMore,
    AddCustomSkill,
    ConfirmSkills,
    RateSkills,
    AttachVerification,
    RecordAnswers,
    RecordRecommendation,
}

impl WizardAction {
    /// The only stage this action may run from.
    pub fn allowed_from(self) -> WizardStage {
        match self {
            WizardAction::SubmitDetails => WizardStage::Start,
            WizardAction::SuggestMore
            | WizardAction::AddCustomSkill
            | WizardAction::ConfirmSkills => WizardStage::DetailsSubmitted,
            WizardAction::RateSkills | WizardAction::AttachVerification => {
                WizardStage::SkillsSelected
            }
            WizardAction::RecordAnswers => WizardStage::RatingsSubmitted,
            WizardAction::RecordRecommendation => WizardStage::Verified,
        }
    }
}

impl fmt::Display for WizardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardAction::SubmitDetails => "submit details",
            WizardAction::SuggestMore => "suggest more skills",
            WizardAction::AddCustomSkill => "add a custom skill",
            WizardAction::ConfirmSkills => "confirm skills",
            WizardAction::RateSkills => "rate skills",
            WizardAction::AttachVerification => "submit ratings",
            WizardAction::RecordAnswers => "submit verification answers",
            WizardAction::RecordRecommendation => "generate recommendations",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("cannot {action} while the session is at stage '{from}'")]
    InvalidTransition {
        from: WizardStage,
        action: WizardAction,
    },

    #[error("select at least one skill")]
    EmptySelection,

    #[error("rating for '{skill}' must be between 1 and 10, got {rating}")]
    RatingOutOfRange { skill: String, rating: i64 },

    #[error("'{0}' is not one of the selected skills")]
    UnknownSkill(String),

    #[error("no verification questions matched the selected skills")]
    NoVerificationItems,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillAnswer {
    pub skill: String,
    pub answer: String,
}

/// Everything one user has entered or received so far.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub stage: WizardStage,
    /// Row id in `users`, once the profile has been stored.
    pub user_id: Option<i64>,
    pub profile: Option<UserProfile>,
    pub suggested_skills: Vec<String>,
    pub skills: SkillSet,
    pub verification: Vec<VerificationItem>,
    pub answers: Vec<SkillAnswer>,
    pub recommendation: Option<Recommendation>,
    pub trends: Option<TrendReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            stage: WizardStage::Start,
            user_id: None,
            profile: None,
            suggested_skills: Vec::new(),
            skills: SkillSet::default(),
            verification: Vec::new(),
            answers: Vec::new(),
            recommendation: None,
            trends: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the stage guard for `action` without changing anything.
    pub fn ensure(&self, action: WizardAction) -> Result<(), SessionError> {
        if self.stage == action.allowed_from() {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.stage,
                action,
            })
        }
    }

    fn advance(&mut self, to: WizardStage) {
        self.stage = to;
        self.updated_at = Utc::now();
    }

    pub fn profession(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.profession.as_str())
    }

    pub fn submit_details(
        &mut self,
        profile: UserProfile,
        user_id: Option<i64>,
        suggestions: Vec<String>,
    ) -> Result<(), SessionError> {
        self.ensure(WizardAction::SubmitDetails)?;
        self.profile = Some(profile);
        self.user_id = user_id;
        self.suggested_skills.clear();
        self.merge_suggestions(suggestions);
        self.advance(WizardStage::DetailsSubmitted);
        Ok(())
    }

    /// Adds new suggestions, ignoring ones already offered. Returns how many were new.
    pub fn add_suggestions(&mut self, suggestions: Vec<String>) -> Result<usize, SessionError> {
        self.ensure(WizardAction::SuggestMore)?;
        let added = self.merge_suggestions(suggestions);
        self.updated_at = Utc::now();
        Ok(added)
    }

    pub fn add_custom_skill(&mut self, skill: &str) -> Result<bool, SessionError> {
        self.ensure(WizardAction::AddCustomSkill)?;
        let skill = skill.trim();
        if skill.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        let added = self.merge_suggestions(vec![skill.to_string()]) == 1;
        self.updated_at = Utc::now();
        Ok(added)
    }

    fn merge_suggestions(&mut self, suggestions: Vec<String>) -> usize {
        let mut added = 0;
        for skill in suggestions {
            let skill = skill.trim();
            if skill.is_empty()
                || self
                    .suggested_skills
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(skill))
            {
                continue;
            }
            self.suggested_skills.push(skill.to_string());
            added += 1;
        }
        added
    }

    /// Fixes the skill set. Selections not among the suggestions are added to them.
    pub fn confirm_skills(&mut self, selected: &[String]) -> Result<(), SessionError> {
        self.ensure(WizardAction::ConfirmSkills)?;
        let mut skills = SkillSet::default();
        for skill in selected.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            skills.insert(skill, DEFAULT_RATING);
        }
        if skills.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        self.merge_suggestions(skills.iter().map(|r| r.skill.clone()).collect());
        self.skills = skills;
        self.advance(WizardStage::SkillsSelected);
        Ok(())
    }

    /// Applies ratings. Either all are applied or, on any bad entry, none.
    pub fn rate_skills(&mut self, ratings: &[(String, i64)]) -> Result<(), SessionError> {
        self.ensure(WizardAction::RateSkills)?;
        for (skill, rating) in ratings {
            if !self.skills.contains(skill) {
                return Err(SessionError::UnknownSkill(skill.clone()));
            }
            if !(1..=10).contains(rating) {
                return Err(SessionError::RatingOutOfRange {
                    skill: skill.clone(),
                    rating: *rating,
                });
            }
        }
        for (skill, rating) in ratings {
            if let Some(record) = self.skills.get_mut(skill) {
                // range checked above
                record.rating = *rating as u8;
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Stores the questions for known skills, respelled to match the skill set.
    /// Returns the skill names of items that were dropped.
    pub fn attach_verification(
        &mut self,
        items: Vec<VerificationItem>,
    ) -> Result<Vec<String>, SessionError> {
        self.ensure(WizardAction::AttachVerification)?;
        let mut kept = Vec::new();
        let mut dropped = Vec::new();
        for mut item in items {
            match self.skills.get(&item.skill) {
                Some(record) => {
                    item.skill = record.skill.clone();
                    kept.push(item);
                }
                None => dropped.push(item.skill),
            }
        }
        if kept.is_empty() {
            return Err(SessionError::NoVerificationItems);
        }
        self.verification = kept;
        self.advance(WizardStage::RatingsSubmitted);
        Ok(dropped)
    }

    /// Stores answers and scores for known skills. Returns names that were ignored.
    /// Only the first answer per skill is kept.
    pub fn record_answers(
        &mut self,
        answers: Vec<SkillAnswer>,
        scores: &[(String, u8)],
    ) -> Result<Vec<String>, SessionError> {
        self.ensure(WizardAction::RecordAnswers)?;
        let mut ignored = Vec::new();

        self.answers.clear();
        for mut answer in answers {
            let Some(record) = self.skills.get(&answer.skill) else {
                ignored.push(answer.skill);
                continue;
            };
            if self.answer_for(&record.skill).is_some() {
                continue;
            }
            answer.skill = record.skill.clone();
            self.answers.push(answer);
        }

        self.skills.clear_scores();
        for (skill, score) in scores {
            match self.skills.get_mut(skill) {
                Some(record) => record.score = Some(*score),
                None => ignored.push(skill.clone()),
            }
        }

        self.advance(WizardStage::Verified);
        Ok(ignored)
    }

    pub fn record_recommendation(
        &mut self,
        recommendation: Recommendation,
    ) -> Result<(), SessionError> {
        self.ensure(WizardAction::RecordRecommendation)?;
        self.recommendation = Some(recommendation);
        self.advance(WizardStage::Recommended);
        Ok(())
    }

    pub fn answer_for(&self, skill: &str) -> Option<&str> {
        self.answers
            .iter()
            .find(|a| a.skill.eq_ignore_ascii_case(skill))
            .map(|a| a.answer.as_str())
    }

    pub fn prerequisite_for(&self, skill: &str) -> Option<&str> {
        self.verification
            .iter()
            .find(|v| v.skill.eq_ignore_ascii_case(skill))
            .and_then(|v| v.prerequisite.as_deref())
    }

    /// Start over: same id, everything else cleared.
    pub fn reset(&mut self) {
        let id = self.id;
        *self = Session::new();
        self.id = id;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Most sessions held at once; the least recently updated go first.
const MAX_SESSIONS: usize = 10_000;
/// Sessions not updated for this many hours are dropped.
const SESSION_IDLE_HOURS: i64 = 24;

/// In-memory sessions keyed by id. Idle and excess sessions are swept
/// whenever a new one is created.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
    capacity: usize,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_limits(MAX_SESSIONS, Duration::hours(SESSION_IDLE_HOURS))
    }

    pub fn with_limits(capacity: usize, idle_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
            idle_ttl,
        }
    }

    pub async fn create(&self) -> Session {
        let session = Session::new();
        let mut sessions = self.inner.write().await;

        let before = sessions.len();
        let cutoff = Utc::now() - self.idle_ttl;
        sessions.retain(|_, s| s.updated_at >= cutoff);
        while sessions.len() >= self.capacity {
            let oldest = sessions
                .values()
                .min_by_key(|s| s.updated_at)
                .map(|s| s.id);
            match oldest {
                Some(id) => sessions.remove(&id),
                None => break,
            };
        }
        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!("Dropped {dropped} idle or excess session(s), {} left", sessions.len());
        }

        sessions.insert(session.id, session.clone());
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Runs `f` on the session under the write lock. `None` if the id is unknown.
    pub async fn update<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut sessions = self.inner.write().await;
        sessions.get_mut(&id).map(f)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            profession: "Data Analyst".to_string(),
        }
    }

    fn item(skill: &str) -> VerificationItem {
        VerificationItem {
            skill: skill.to_string(),
            question: format!("Explain {skill}"),
            hint: "think".to_string(),
            prerequisite: None,
        }
    }

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn selected_session() -> Session {
        let mut session = Session::new();
        session
            .submit_details(profile(), Some(1), skills(&["SQL", "Excel", "Python"]))
            .unwrap();
        session.confirm_skills(&skills(&["SQL", "Python"])).unwrap();
        session
    }

    #[test]
    fn test_full_linear_flow() {
        let mut session = selected_session();
        assert_eq!(session.stage, WizardStage::SkillsSelected);
        assert_eq!(session.skills.get("SQL").unwrap().rating, DEFAULT_RATING);

        session
            .rate_skills(&[("SQL".to_string(), 8), ("python".to_string(), 3)])
            .unwrap();
        assert_eq!(session.skills.get("Python").unwrap().rating, 3);

        let dropped = session
            .attach_verification(vec![item("sql"), item("Python"), item("Tableau")])
            .unwrap();
        assert_eq!(dropped, ["Tableau"]);
        assert_eq!(session.verification[0].skill, "SQL");
        assert_eq!(session.stage, WizardStage::RatingsSubmitted);

        let ignored = session
            .record_answers(
                vec![SkillAnswer {
                    skill: "SQL".to_string(),
                    answer: "joins".to_string(),
                }],
                &[("SQL".to_string(), 7), ("Go".to_string(), 2)],
            )
            .unwrap();
        assert_eq!(ignored, ["Go"]);
        assert_eq!(session.skills.get("SQL").unwrap().score, Some(7));
        assert_eq!(session.skills.get("Python").unwrap().score, None);
        assert_eq!(session.stage, WizardStage::Verified);
    }

    #[test]
    fn test_out_of_order_action_is_rejected() {
        let mut session = Session::new();
        let err = session.confirm_skills(&skills(&["SQL"])).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                from: WizardStage::Start,
                action: WizardAction::ConfirmSkills,
            }
        );
        assert_eq!(session.stage, WizardStage::Start);
    }

    #[test]
    fn test_details_cannot_be_resubmitted() {
        let mut session = selected_session();
        let err = session.submit_details(profile(), None, vec![]).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(session.user_id, Some(1));
    }

    #[test]
    fn test_rating_out_of_range_changes_nothing() {
        let mut session = selected_session();
        let err = session
            .rate_skills(&[("SQL".to_string(), 9), ("Python".to_string(), 11)])
            .unwrap_err();
        assert!(matches!(err, SessionError::RatingOutOfRange { rating: 11, .. }));
        assert_eq!(session.skills.get("SQL").unwrap().rating, DEFAULT_RATING);
    }

    #[test]
    fn test_rating_unknown_skill_is_rejected() {
        let mut session = selected_session();
        let err = session.rate_skills(&[("Rust".to_string(), 5)]).unwrap_err();
        assert_eq!(err, SessionError::UnknownSkill("Rust".to_string()));
    }

    #[test]
    fn test_confirm_requires_selection_and_dedupes() {
        let mut session = Session::new();
        session.submit_details(profile(), None, vec![]).unwrap();
        assert_eq!(
            session.confirm_skills(&skills(&["  "])).unwrap_err(),
            SessionError::EmptySelection
        );
        session
            .confirm_skills(&skills(&["Excel", "excel", "Power BI"]))
            .unwrap();
        assert_eq!(session.skills.len(), 2);
        assert_eq!(session.suggested_skills, ["Excel", "Power BI"]);
    }

    #[test]
    fn test_suggestions_merge_without_duplicates() {
        let mut session = Session::new();
        session
            .submit_details(profile(), None, skills(&["SQL", "Excel"]))
            .unwrap();
        let added = session
            .add_suggestions(skills(&["excel", "Statistics"]))
            .unwrap();
        assert_eq!(added, 1);
        assert!(session.add_custom_skill("Storytelling").unwrap());
        assert!(!session.add_custom_skill("sql").unwrap());
        assert_eq!(
            session.suggested_skills,
            ["SQL", "Excel", "Statistics", "Storytelling"]
        );
    }

    #[test]
    fn test_verification_without_matches_keeps_stage() {
        let mut session = selected_session();
        let err = session.attach_verification(vec![item("Cooking")]).unwrap_err();
        assert_eq!(err, SessionError::NoVerificationItems);
        assert_eq!(session.stage, WizardStage::SkillsSelected);
    }

    #[test]
    fn test_reset_keeps_id() {
        let mut session = selected_session();
        let id = session.id;
        session.reset();
        assert_eq!(session.id, id);
        assert_eq!(session.stage, WizardStage::Start);
        assert!(session.profile.is_none());
        assert!(session.skills.is_empty());
    }

    #[test]
    fn test_repeated_answers_keep_the_first() {
        let mut session = selected_session();
        session.attach_verification(vec![item("SQL")]).unwrap();
        let answer = |skill: &str, text: &str| SkillAnswer {
            skill: skill.to_string(),
            answer: text.to_string(),
        };
        let ignored = session
            .record_answers(
                vec![
                    answer("SQL", "joins"),
                    answer("sql", "unions"),
                    answer("Python", "lists"),
                    answer("SQL", "views"),
                ],
                &[],
            )
            .unwrap();
        assert!(ignored.is_empty());
        assert_eq!(session.answers.len(), 2);
        assert_eq!(session.answer_for("SQL"), Some("joins"));
        assert_eq!(session.answer_for("Python"), Some("lists"));
    }

    #[tokio::test]
    async fn test_store_evicts_least_recently_updated_at_capacity() {
        let store = SessionStore::with_limits(2, Duration::hours(1));
        let first = store.create().await;
        let second = store.create().await;
        store
            .update(first.id, |s| s.updated_at -= Duration::minutes(5))
            .await;

        let third = store.create().await;
        assert_eq!(store.len().await, 2);
        assert!(store.get(first.id).await.is_none());
        assert!(store.get(second.id).await.is_some());
        assert!(store.get(third.id).await.is_some());
    }

    #[tokio::test]
    async fn test_store_drops_idle_sessions_on_create() {
        let store = SessionStore::with_limits(10, Duration::hours(1));
        let idle = store.create().await;
        let active = store.create().await;
        store
            .update(idle.id, |s| s.updated_at = Utc::now() - Duration::hours(2))
            .await;

        store.create().await;
        assert_eq!(store.len().await, 2);
        assert!(store.get(idle.id).await.is_none());
        assert!(store.get(active.id).await.is_some());
    }

    #[tokio::test]
    async fn test_store_update_unknown_id_is_none() {
        let store = SessionStore::new();
        let session = store.create().await;
        assert_eq!(store.len().await, 1);
        assert!(store.update(Uuid::new_v4(), |s| s.stage).await.is_none());
        assert_eq!(
            store.update(session.id, |s| s.stage).await,
            Some(WizardStage::Start)
        );
    }
}
