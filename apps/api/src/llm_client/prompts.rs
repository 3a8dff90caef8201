// Prompt templates for every model call the service makes.
// Placeholders are `{name}` markers filled with `str::replace`.

pub const SUGGEST_SKILLS: &str = "\
You are an expert career advisor. For a '{profession}', \
suggest 8-10 key skills that are essential for success in this profession. \
Return the skills as a comma-separated list (e.g., 'Python, Machine Learning, Data Analysis').";

pub const VERIFICATION_QUESTIONS: &str = "\
You are an expert in skill assessment. For a {profession}, \
the user has rated their skills as follows:
{skill_ratings}
1. Generate one open-ended question per skill to verify proficiency. \
2. Provide a brief hint for each question. \
3. For skills rated below 5/10, suggest one prerequisite skill. \
Return in format: 'Skill: Question | Hint | Prerequisite (if applicable)' (one per line).";

pub const SCORE_ANSWERS: &str = "\
You are an expert assessor. Evaluate these verification answers for a {profession}:
{answers}
Score each answer out of 10 based on depth and relevance. \
Return in format: 'Skill: Score' (one per line).";

pub const RECOMMENDATIONS: &str = "\
You are an expert education consultant. For a '{profession}', \
the user has this skill profile:
{skill_info}
Provide a detailed, personalized learning path with 3 phases (Beginner, Intermediate, Advanced). \
For each phase, recommend free online courses, books, YouTube channels, or other resources. \
Include URLs where possible and explain why each resource fits.";

pub const COURSE_OUTLINE: &str = "\
You are an experienced instructional designer. Draft a course titled '{title}' \
that teaches {skill} at the {level} level. \
Start with a two-sentence description, then list 4-6 modules, one per line, \
in the format 'Module N: Title - what the learner will be able to do'.";

pub fn suggest_skills(profession: &str) -> String {
    SUGGEST_SKILLS.replace("{profession}", profession)
}

/// `ratings` is `(skill, rating)` in display order.
pub fn verification_questions<'a>(
    profession: &str,
    ratings: impl IntoIterator<Item = (&'a str, u8)>,
) -> String {
    let skill_ratings = ratings
        .into_iter()
        .map(|(skill, rating)| format!("{skill}: {rating}/10"))
        .collect::<Vec<_>>()
        .join("\n");
    VERIFICATION_QUESTIONS
        .replace("{profession}", profession)
        .replace("{skill_ratings}", &skill_ratings)
}

pub fn score_answers<'a>(
    profession: &str,
    answers: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    let answers = answers
        .into_iter()
        .map(|(skill, answer)| format!("{skill}: {answer}"))
        .collect::<Vec<_>>()
        .join("\n");
    SCORE_ANSWERS
        .replace("{profession}", profession)
        .replace("{answers}", &answers)
}

/// One line of the skill profile fed into the recommendation prompt.
pub struct ProfileLine<'a> {
    pub skill: &'a str,
    pub rating: u8,
    pub answer: Option<&'a str>,
    pub score: Option<u8>,
    pub prerequisite: Option<&'a str>,
}

pub fn recommendations<'a>(
    profession: &str,
    profile: impl IntoIterator<Item = ProfileLine<'a>>,
) -> String {
    let skill_info = profile
        .into_iter()
        .map(|line| {
            let score = line
                .score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string());
            format!(
                "{}: Self-rated {}/10, Verification: {}, Score: {}/10, Prerequisite: {}",
                line.skill,
                line.rating,
                line.answer.filter(|a| !a.trim().is_empty()).unwrap_or("Not provided"),
                score,
                line.prerequisite.unwrap_or("None"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    RECOMMENDATIONS
        .replace("{profession}", profession)
        .replace("{skill_info}", &skill_info)
}

pub fn course_outline(title: &str, skill: &str, level: &str) -> String {
    COURSE_OUTLINE
        .replace("{title}", title)
        .replace("{skill}", skill)
        .replace("{level}", level)
}
