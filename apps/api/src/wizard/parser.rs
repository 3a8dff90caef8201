//! Best-effort parsers for the line formats the prompts ask the model for.
//!
//! None of these fail: lines that do not fit the expected shape are dropped
//! and reported in `Parsed::skipped` so the caller can surface a warning.

use std::sync::OnceLock;

use regex::Regex;
use tracing::warn;

use crate::wizard::models::{
    Phase, PhaseLevel, Recommendation, RecommendationLine, Resource, ResourceKind,
    VerificationItem,
};

/// Parser output plus the raw lines that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub skipped: Vec<String>,
}

impl<T> Parsed<T> {
    fn new(value: T, skipped: Vec<String>) -> Self {
        if !skipped.is_empty() {
            warn!("Skipped {} malformed model line(s)", skipped.len());
        }
        Self { value, skipped }
    }
}

const FIELD_SEPARATOR: &str = " | ";

const NO_PREREQUISITE: &[&str] = &["", "none", "n/a", "na", "-", "not applicable", "(none)"];

/// Splits a comma (or newline) separated skill list. Order is kept,
/// duplicates (ignoring ASCII case) are dropped.
pub fn parse_skill_list(text: &str) -> Vec<String> {
    let mut skills: Vec<String> = Vec::new();
    for raw in text.split(|c: char| c == ',' || c == '\n') {
        let skill = clean_label(raw);
        let skill = skill.trim_end_matches('.').trim();
        if skill.is_empty() || skills.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            continue;
        }
        skills.push(skill.to_string());
    }
    skills
}

/// Parses `Skill: Question | Hint | Prerequisite` lines.
pub fn parse_verification_items(text: &str) -> Parsed<Vec<VerificationItem>> {
    let mut items: Vec<VerificationItem> = Vec::new();
    let mut skipped = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match parse_verification_line(line) {
            Some(item) if items.iter().any(|i| i.skill.eq_ignore_ascii_case(&item.skill)) => {
                skipped.push(line.to_string());
            }
            Some(item) => items.push(item),
            None => skipped.push(line.to_string()),
        }
    }

    Parsed::new(items, skipped)
}

fn parse_verification_line(line: &str) -> Option<VerificationItem> {
    if !line.contains(FIELD_SEPARATOR) {
        return None;
    }
    let (skill, rest) = line.split_once(": ")?;
    let skill = clean_label(skill);
    let parts: Vec<&str> = rest.split(FIELD_SEPARATOR).map(str::trim).collect();
    if skill.is_empty() || !(2..=3).contains(&parts.len()) {
        return None;
    }
    let (question, hint) = (parts[0], parts[1]);
    if question.is_empty() || hint.is_empty() {
        return None;
    }
    let prerequisite = parts.get(2).and_then(|p| clean_prerequisite(p));

    Some(VerificationItem {
        skill,
        question: question.to_string(),
        hint: strip_prefix_ci(hint, "hint:").to_string(),
        prerequisite,
    })
}

fn clean_prerequisite(raw: &str) -> Option<String> {
    let value = strip_prefix_ci(raw.trim(), "prerequisite:");
    let value = value.trim_matches(|c: char| c == '*' || c.is_whitespace());
    if NO_PREREQUISITE.contains(&value.to_ascii_lowercase().as_str()) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Parses `Skill: Score` lines. Scores must be plain integers in 0..=10.
pub fn parse_scores(text: &str) -> Parsed<Vec<(String, u8)>> {
    let mut scores: Vec<(String, u8)> = Vec::new();
    let mut skipped = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let parsed = line.split_once(": ").and_then(|(skill, token)| {
            let skill = clean_label(skill);
            let token = token.trim();
            if skill.is_empty() || token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let score = token.parse::<u8>().ok().filter(|s| *s <= 10)?;
            Some((skill, score))
        });

        match parsed {
            Some((skill, score)) => {
                if let Some(existing) = scores
                    .iter_mut()
                    .find(|(s, _)| s.eq_ignore_ascii_case(&skill))
                {
                    existing.1 = score;
                } else {
                    scores.push((skill, score));
                }
            }
            None => skipped.push(line.to_string()),
        }
    }

    Parsed::new(scores, skipped)
}

/// Segments recommendation text into phases. A URL-free line naming a phase
/// level starts that phase; lines before the first phase form the preamble.
pub fn parse_recommendation(text: &str) -> Recommendation {
    let mut preamble = Vec::new();
    let mut phases: Vec<Phase> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let has_url = url_regex().is_match(line);
        if let Some(level) = PhaseLevel::mentioned_in(line).filter(|_| !has_url) {
            phases.push(Phase {
                level,
                heading: clean_heading(line),
                lines: Vec::new(),
            });
            continue;
        }

        let entry = RecommendationLine {
            text: line.to_string(),
            resources: extract_resources(line),
        };
        match phases.last_mut() {
            Some(phase) => phase.lines.push(entry),
            None => preamble.push(entry),
        }
    }

    Recommendation {
        raw: text.to_string(),
        preamble,
        phases,
    }
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"https?://[^\s<>()\[\]]+").expect("valid url regex"))
}

fn markdown_link_regex() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| {
        Regex::new(r"\[([^\]]+)\]\((https?://[^\s)]+)\)").expect("valid markdown link regex")
    })
}

/// Pulls every URL out of a line, as markdown links first, then bare URLs.
pub fn extract_resources(line: &str) -> Vec<Resource> {
    let kind = infer_kind(line);
    let mut resources = Vec::new();
    let mut covered: Vec<(usize, usize)> = Vec::new();

    for caps in markdown_link_regex().captures_iter(line) {
        let (Some(whole), Some(label), Some(url)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        covered.push((whole.start(), whole.end()));
        resources.push(Resource {
            kind,
            name: clean_label(label.as_str()),
            url: url.as_str().to_string(),
            rationale: rationale_after(&line[whole.end()..]),
        });
    }

    for m in url_regex().find_iter(line) {
        if covered.iter().any(|(s, e)| m.start() >= *s && m.end() <= *e) {
            continue;
        }
        let url = m
            .as_str()
            .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':' | '*'));
        let end = m.start() + url.len();
        let before = clean_label(&line[..m.start()]);
        let before = before
            .trim_end_matches(|c: char| matches!(c, ':' | '-' | '(' | '–') || c.is_whitespace());
        let name = if before.is_empty() {
            host_of(url).to_string()
        } else {
            before.to_string()
        };
        resources.push(Resource {
            kind,
            name,
            url: url.to_string(),
            rationale: rationale_after(&line[end..]),
        });
    }

    resources
}

fn infer_kind(line: &str) -> ResourceKind {
    let lower = line.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["youtube", "video", "channel"][..]) {
        ResourceKind::Video
    } else if has(&["course", "coursera", "udemy", "edx", "mooc", "khan academy"][..]) {
        ResourceKind::Course
    } else if has(&["book", "ebook"][..]) {
        ResourceKind::Book
    } else if has(&["article", "blog", "docs", "documentation", "tutorial", "guide"][..]) {
        ResourceKind::Article
    } else {
        ResourceKind::Other
    }
}

fn rationale_after(rest: &str) -> Option<String> {
    let rest = rest
        .trim_start_matches(|c: char| {
            matches!(c, ')' | '-' | ':' | '–' | '—' | '*' | '.' | ',') || c.is_whitespace()
        })
        .trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

fn host_of(url: &str) -> &str {
    let without_scheme = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    without_scheme.split('/').next().unwrap_or(without_scheme)
}

/// Strips list bullets, numbering and markdown emphasis from a label.
fn clean_label(raw: &str) -> String {
    let mut s = raw
        .trim()
        .trim_start_matches(|c: char| matches!(c, '-' | '•' | '#') || c.is_whitespace());
    if let Some((num, rest)) = s.split_once(|c: char| c == '.' || c == ')') {
        if !num.is_empty() && num.bytes().all(|b| b.is_ascii_digit()) {
            s = rest;
        }
    }
    s.trim()
        .trim_matches(|c: char| matches!(c, '*' | '_' | '"' | '\'' | '`'))
        .trim()
        .to_string()
}

fn clean_heading(line: &str) -> String {
    clean_label(line)
        .trim_end_matches(|c: char| c == ':' || c == '*' || c.is_whitespace())
        .to_string()
}

fn strip_prefix_ci<'a>(value: &'a str, prefix: &str) -> &'a str {
    match value.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => value[prefix.len()..].trim_start(),
        _ => value,
    }
}
