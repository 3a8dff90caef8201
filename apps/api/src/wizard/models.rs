use serde::{Deserialize, Serialize};

/// Who the learning path is for. Fixed once the details step is submitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub profession: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillRecord {
    pub skill: String,
    /// Self-rating, 1-10.
    pub rating: u8,
    /// Verification score from the assessor, 0-10.
    pub score: Option<u8>,
}

/// Ordered skill records; insertion order is display order and names are
/// unique ignoring ASCII case.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SkillSet {
    records: Vec<SkillRecord>,
}

impl SkillSet {
    /// Appends `skill` unless an equal name is already present. Returns whether it was added.
    pub fn insert(&mut self, skill: &str, rating: u8) -> bool {
        if self.contains(skill) {
            return false;
        }
        self.records.push(SkillRecord {
            skill: skill.to_string(),
            rating,
            score: None,
        });
        true
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.get(skill).is_some()
    }

    pub fn get(&self, skill: &str) -> Option<&SkillRecord> {
        self.records
            .iter()
            .find(|r| r.skill.eq_ignore_ascii_case(skill))
    }

    pub fn get_mut(&mut self, skill: &str) -> Option<&mut SkillRecord> {
        self.records
            .iter_mut()
            .find(|r| r.skill.eq_ignore_ascii_case(skill))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillRecord> {
        self.records.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear_scores(&mut self) {
        for record in &mut self.records {
            record.score = None;
        }
    }
}

/// Generated question, hint and optional prerequisite for one skill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationItem {
    pub skill: String,
    pub question: String,
    pub hint: String,
    pub prerequisite: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PhaseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl PhaseLevel {
    pub const ALL: [PhaseLevel; 3] = [
        PhaseLevel::Beginner,
        PhaseLevel::Intermediate,
        PhaseLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseLevel::Beginner => "Beginner",
            PhaseLevel::Intermediate => "Intermediate",
            PhaseLevel::Advanced => "Advanced",
        }
    }

    /// Case-insensitive match on the level name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// First level whose name appears verbatim in `line`.
    pub fn mentioned_in(line: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| line.contains(level.as_str()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Course,
    Book,
    Video,
    Article,
    Other,
}

/// A link pulled out of a recommendation line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub name: String,
    pub url: String,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationLine {
    pub text: String,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase {
    pub level: PhaseLevel,
    pub heading: String,
    pub lines: Vec<RecommendationLine>,
}

/// Model-written learning path, kept verbatim and segmented by phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub raw: String,
    pub preamble: Vec<RecommendationLine>,
    pub phases: Vec<Phase>,
}

impl Recommendation {
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.preamble
            .iter()
            .chain(self.phases.iter().flat_map(|p| p.lines.iter()))
            .flat_map(|line| line.resources.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_set_keeps_first_spelling_and_order() {
        let mut skills = SkillSet::default();
        assert!(skills.insert("Python", 5));
        assert!(skills.insert("SQL", 5));
        assert!(!skills.insert("python", 9));

        let names: Vec<_> = skills.iter().map(|r| r.skill.as_str()).collect();
        assert_eq!(names, ["Python", "SQL"]);
        assert_eq!(skills.get("PYTHON").unwrap().rating, 5);
    }

    #[test]
    fn test_skill_set_serializes_as_array() {
        let mut skills = SkillSet::default();
        skills.insert("Excel", 3);
        let json = serde_json::to_value(&skills).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"skill": "Excel", "rating": 3, "score": null}])
        );
    }

    #[test]
    fn test_phase_level_parse_and_mention() {
        assert_eq!(PhaseLevel::parse(" advanced "), Some(PhaseLevel::Advanced));
        assert_eq!(PhaseLevel::parse("expert"), None);
        assert_eq!(
            PhaseLevel::mentioned_in("## Phase 2: Intermediate"),
            Some(PhaseLevel::Intermediate)
        );
        assert_eq!(PhaseLevel::mentioned_in("beginner"), None);
    }
}
