//! Wizard steps: each one validates input, calls the model if the step needs
//! it, and commits the result to the session.
//!
//! The model is never called while the session store is locked. A step
//! reads a snapshot, does the slow work, then commits through the session's
//! own guarded transition, so a concurrent step that got there first turns
//! the commit into an `InvalidTransition` instead of a lost update.
//!
//! Model failures degrade the step rather than failing the request; what
//! went wrong is reported in `StepResponse::warnings`.

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::prompts::{self, ProfileLine};
use crate::report::{render_learning_path_pdf_blocking, ReportInput};
use crate::state::AppState;
use crate::trends::TrendReport;
use crate::users::upsert_user;
use crate::wizard::parser::{
    parse_recommendation, parse_scores, parse_skill_list, parse_verification_items, Parsed,
};
use crate::wizard::session::{Session, SessionError, SkillAnswer, WizardAction, WizardStage};
use crate::wizard::validation::{validate_details, DetailsForm};

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub session: Session,
    pub warnings: Vec<String>,
}

impl StepResponse {
    fn new(session: Session, warnings: Vec<String>) -> Self {
        Self { session, warnings }
    }
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub trends: TrendReport,
    pub warnings: Vec<String>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}

async fn snapshot(state: &AppState, id: Uuid) -> Result<Session, AppError> {
    state.sessions.get(id).await.ok_or_else(|| not_found(id))
}

/// Runs a transition under the store lock and returns its result plus the
/// session as it stands afterwards.
async fn apply<T>(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut Session) -> Result<T, SessionError>,
) -> Result<(T, Session), AppError> {
    state
        .sessions
        .update(id, |session| f(session).map(|value| (value, session.clone())))
        .await
        .ok_or_else(|| not_found(id))?
        .map_err(AppError::from)
}

fn skipped_warning<T>(parsed: &Parsed<T>, what: &str, warnings: &mut Vec<String>) {
    if !parsed.skipped.is_empty() {
        warnings.push(format!(
            "Ignored {} line(s) of the {what} that did not match the expected format",
            parsed.skipped.len()
        ));
    }
}

fn profession_of(session: &Session) -> Result<String, AppError> {
    session
        .profession()
        .map(str::to_string)
        .ok_or_else(|| AppError::Conflict("Submit your details first".to_string()))
}

pub async fn create_session(state: &AppState) -> Session {
    let session = state.sessions.create().await;
    info!(session_id = %session.id, "Session created");
    session
}

pub async fn get_session(state: &AppState, id: Uuid) -> Result<Session, AppError> {
    snapshot(state, id).await
}

/// Start over with the same session id.
pub async fn reset_session(state: &AppState, id: Uuid) -> Result<Session, AppError> {
    let (_, session) = apply(state, id, |s| {
        s.reset();
        Ok(())
    })
    .await?;
    info!(session_id = %id, "Session reset");
    Ok(session)
}

/// Asks the model for skills relevant to `profession`. Failures yield an
/// empty list and a warning.
async fn fetch_suggestions(
    state: &AppState,
    profession: &str,
    warnings: &mut Vec<String>,
) -> Vec<String> {
    match state.model.generate(&prompts::suggest_skills(profession)).await {
        Ok(text) => {
            let skills = parse_skill_list(&text);
            if skills.is_empty() {
                warnings.push("The skill suggestions came back empty".to_string());
            }
            skills
        }
        Err(e) => {
            warn!("Skill suggestion failed: {e}");
            warnings.push(
                "Could not fetch skill suggestions; add your own skills instead".to_string(),
            );
            Vec::new()
        }
    }
}

#[instrument(level = "info", skip(state, form), fields(session_id = %id))]
pub async fn submit_details(
    state: &AppState,
    id: Uuid,
    form: DetailsForm,
) -> Result<StepResponse, AppError> {
    let profile = validate_details(&form).map_err(AppError::Validation)?;
    snapshot(state, id).await?.ensure(WizardAction::SubmitDetails)?;

    let mut warnings = Vec::new();
    let user_id = match upsert_user(&state.db, &profile).await {
        Ok(user_id) => Some(user_id),
        Err(e) => {
            warn!("Failed to store user profile: {e}");
            warnings.push("Your details could not be saved; progress tracking is unavailable".to_string());
            None
        }
    };

    let suggestions = fetch_suggestions(state, &profile.profession, &mut warnings).await;
    let (_, session) = apply(state, id, |s| s.submit_details(profile, user_id, suggestions)).await?;
    Ok(StepResponse::new(session, warnings))
}

pub async fn suggest_more(state: &AppState, id: Uuid) -> Result<StepResponse, AppError> {
    let current = snapshot(state, id).await?;
    current.ensure(WizardAction::SuggestMore)?;
    let profession = profession_of(&current)?;

    let mut warnings = Vec::new();
    let suggestions = fetch_suggestions(state, &profession, &mut warnings).await;
    let (added, session) = apply(state, id, |s| s.add_suggestions(suggestions)).await?;
    if added == 0 && warnings.is_empty() {
        warnings.push("No new skills were suggested".to_string());
    }
    Ok(StepResponse::new(session, warnings))
}

pub async fn add_custom_skill(
    state: &AppState,
    id: Uuid,
    skill: &str,
) -> Result<StepResponse, AppError> {
    let (added, session) = apply(state, id, |s| s.add_custom_skill(skill)).await?;
    let mut warnings = Vec::new();
    if !added {
        warnings.push(format!("'{}' is already in the list", skill.trim()));
    }
    Ok(StepResponse::new(session, warnings))
}

pub async fn confirm_skills(
    state: &AppState,
    id: Uuid,
    selected: &[String],
) -> Result<StepResponse, AppError> {
    let (_, session) = apply(state, id, |s| s.confirm_skills(selected)).await?;
    Ok(StepResponse::new(session, Vec::new()))
}

/// Applies the ratings, then generates verification questions. Without
/// usable questions the session stays in `SkillsSelected` so the user can
/// submit again.
#[instrument(level = "info", skip(state, ratings), fields(session_id = %id))]
pub async fn submit_ratings(
    state: &AppState,
    id: Uuid,
    ratings: &[(String, i64)],
) -> Result<StepResponse, AppError> {
    let (_, rated) = apply(state, id, |s| s.rate_skills(ratings)).await?;
    let profession = profession_of(&rated)?;
    let prompt = prompts::verification_questions(
        &profession,
        rated.skills.iter().map(|r| (r.skill.as_str(), r.rating)),
    );

    let mut warnings = Vec::new();
    let text = match state.model.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Verification question generation failed: {e}");
            warnings.push(
                "Could not generate verification questions; please submit your ratings again"
                    .to_string(),
            );
            return Ok(StepResponse::new(rated, warnings));
        }
    };

    let parsed = parse_verification_items(&text);
    skipped_warning(&parsed, "verification questions", &mut warnings);

    let committed = state
        .sessions
        .update(id, |s| {
            s.attach_verification(parsed.value)
                .map(|dropped| (dropped, s.clone()))
        })
        .await
        .ok_or_else(|| not_found(id))?;

    match committed {
        Ok((dropped, session)) => {
            for skill in dropped {
                warnings.push(format!("Ignored a question for '{skill}', which you did not select"));
            }
            Ok(StepResponse::new(session, warnings))
        }
        Err(SessionError::NoVerificationItems) => {
            warnings.push(SessionError::NoVerificationItems.to_string());
            Ok(StepResponse::new(snapshot(state, id).await?, warnings))
        }
        Err(e) => Err(e.into()),
    }
}

/// Records answers and asks the model to score them. Scoring failures still
/// move the session on, with every score left empty.
#[instrument(level = "info", skip(state, answers), fields(session_id = %id))]
pub async fn submit_answers(
    state: &AppState,
    id: Uuid,
    answers: Vec<SkillAnswer>,
) -> Result<StepResponse, AppError> {
    let current = snapshot(state, id).await?;
    current.ensure(WizardAction::RecordAnswers)?;
    let profession = profession_of(&current)?;

    // first answer per skill wins, matching what the session keeps
    let mut seen: Vec<&str> = Vec::new();
    let mut answered: Vec<(&str, &str)> = Vec::new();
    for a in &answers {
        if !current.skills.contains(&a.skill)
            || seen.iter().any(|s| s.eq_ignore_ascii_case(&a.skill))
        {
            continue;
        }
        seen.push(&a.skill);
        if !a.answer.trim().is_empty() {
            answered.push((a.skill.as_str(), a.answer.trim()));
        }
    }

    let mut warnings = Vec::new();
    let scores = if answered.is_empty() {
        warnings.push("No answers to score".to_string());
        Vec::new()
    } else {
        match state
            .model
            .generate(&prompts::score_answers(&profession, answered))
            .await
        {
            Ok(text) => {
                let parsed = parse_scores(&text);
                skipped_warning(&parsed, "scores", &mut warnings);
                parsed.value
            }
            Err(e) => {
                warn!("Answer scoring failed: {e}");
                warnings.push("Could not score your answers".to_string());
                Vec::new()
            }
        }
    };

    let (ignored, session) = apply(state, id, |s| s.record_answers(answers, &scores)).await?;
    for skill in ignored {
        warnings.push(format!("Ignored '{skill}', which is not one of your skills"));
    }
    Ok(StepResponse::new(session, warnings))
}

fn profile_prompt(session: &Session, profession: &str) -> String {
    prompts::recommendations(
        profession,
        session.skills.iter().map(|record| ProfileLine {
            skill: &record.skill,
            rating: record.rating,
            answer: session.answer_for(&record.skill),
            score: record.score,
            prerequisite: session.prerequisite_for(&record.skill),
        }),
    )
}

/// Generates the learning path. Asking again once it exists returns the
/// stored one.
#[instrument(level = "info", skip(state), fields(session_id = %id))]
pub async fn recommend(state: &AppState, id: Uuid) -> Result<StepResponse, AppError> {
    let current = snapshot(state, id).await?;
    if current.stage == WizardStage::Recommended {
        return Ok(StepResponse::new(current, Vec::new()));
    }
    current.ensure(WizardAction::RecordRecommendation)?;
    let profession = profession_of(&current)?;

    let mut warnings = Vec::new();
    let text = match state.model.generate(&profile_prompt(&current, &profession)).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Recommendation generation failed: {e}");
            warnings.push("Could not generate recommendations; please try again".to_string());
            return Ok(StepResponse::new(current, warnings));
        }
    };

    let recommendation = parse_recommendation(&text);
    if recommendation.phases.is_empty() {
        warnings.push("The learning path did not name any Beginner, Intermediate or Advanced phase".to_string());
    }
    let (_, session) = apply(state, id, |s| s.record_recommendation(recommendation)).await?;
    Ok(StepResponse::new(session, warnings))
}

/// Looks up trends for the session's profession and keeps them for the report.
pub async fn trends(state: &AppState, id: Uuid) -> Result<TrendsResponse, AppError> {
    let current = snapshot(state, id).await?;
    let profession = profession_of(&current)?;

    let mut warnings = Vec::new();
    let report = match state.trends.lookup(&profession).await {
        Ok(report) => report,
        Err(e) => {
            warn!("Trends lookup failed: {e}");
            warnings.push("Trending topics are unavailable right now".to_string());
            TrendReport::empty_live()
        }
    };

    let stored = report.clone();
    state
        .sessions
        .update(id, move |s| s.trends = Some(stored))
        .await
        .ok_or_else(|| not_found(id))?;
    Ok(TrendsResponse {
        trends: report,
        warnings,
    })
}

/// The learning-path PDF for the session as it stands.
pub async fn report(state: &AppState, id: Uuid) -> Result<Vec<u8>, AppError> {
    let current = snapshot(state, id).await?;
    let input = ReportInput::from_session(&current)
        .ok_or_else(|| AppError::Conflict("Submit your details before exporting".to_string()))?;
    let bytes = render_learning_path_pdf_blocking(input).await?;
    info!(session_id = %id, bytes = bytes.len(), "Report rendered");
    Ok(bytes)
}
