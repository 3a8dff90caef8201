//! Page layout for the learning-path report: turns report content into
//! positioned text lines, page by page. Pure and font-agnostic; `pdf.rs`
//! draws the result.

use serde::Serialize;

use crate::trends::{TrendReport, TrendSource};
use crate::wizard::models::{Recommendation, RecommendationLine, SkillRecord, UserProfile};
use crate::wizard::session::Session;

pub const PAGE_WIDTH_MM: f32 = 215.9;
pub const PAGE_HEIGHT_MM: f32 = 279.4;
pub const MARGIN_X_MM: f32 = 19.0;
/// Half an inch, top and bottom.
pub const MARGIN_Y_MM: f32 = 12.7;

const PT_TO_MM: f32 = 0.3528;

/// Characters per line before wrapping, per text style.
const BODY_WRAP: usize = 95;
const HEADING_WRAP: usize = 60;
const SKILL_COLUMN_WRAP: usize = 40;

const SKILL_COLUMN_MM: f32 = MARGIN_X_MM;
const RATING_COLUMN_MM: f32 = 110.0;
const SCORE_COLUMN_MM: f32 = 145.0;

pub const REPORT_TITLE: &str = "SkillPath - Personalized Learning Path";
pub const REPORT_FOOTER: &str = "Generated by SkillPath";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextStyle {
    Title,
    Heading,
    Body,
    TableHeader,
}

impl TextStyle {
    pub fn size_pt(self) -> f32 {
        match self {
            TextStyle::Title => 24.0,
            TextStyle::Heading => 16.0,
            TextStyle::Body => 10.0,
            TextStyle::TableHeader => 12.0,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, TextStyle::Title | TextStyle::Heading | TextStyle::TableHeader)
    }

    /// Baseline-to-baseline distance in millimetres.
    fn leading_mm(self) -> f32 {
        let leading_pt = match self {
            TextStyle::Body => 14.0,
            other => other.size_pt() * 1.25,
        };
        leading_pt * PT_TO_MM
    }

    fn wrap_width(self) -> usize {
        match self {
            TextStyle::Body | TextStyle::TableHeader => BODY_WRAP,
            TextStyle::Title | TextStyle::Heading => HEADING_WRAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedText {
    pub text: String,
    pub style: TextStyle,
    pub x_mm: f32,
    /// Baseline, measured from the bottom edge of the page.
    pub y_mm: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageLayout {
    pub items: Vec<PlacedText>,
}

/// Everything that goes into one report.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub profile: UserProfile,
    pub skills: Vec<SkillRecord>,
    pub trends: Option<TrendReport>,
    pub recommendation: Option<Recommendation>,
}

impl ReportInput {
    /// `None` until the session has a profile.
    pub fn from_session(session: &Session) -> Option<Self> {
        Some(Self {
            profile: session.profile.clone()?,
            skills: session.skills.iter().cloned().collect(),
            trends: session.trends.clone(),
            recommendation: session.recommendation.clone(),
        })
    }
}

/// Cursor that flows text down the page and opens new pages as needed.
struct Flow {
    pages: Vec<PageLayout>,
    y_mm: f32,
}

impl Flow {
    fn new() -> Self {
        Self {
            pages: vec![PageLayout::default()],
            y_mm: PAGE_HEIGHT_MM - MARGIN_Y_MM,
        }
    }

    fn ensure_room(&mut self, height_mm: f32) {
        if self.y_mm - height_mm < MARGIN_Y_MM {
            self.pages.push(PageLayout::default());
            self.y_mm = PAGE_HEIGHT_MM - MARGIN_Y_MM;
        }
    }

    fn current(&mut self) -> &mut PageLayout {
        // `pages` starts non-empty and only grows
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// One row of text at the given x offsets; all cells share the baseline.
    fn row(&mut self, cells: &[(f32, &str)], style: TextStyle) {
        let leading = style.leading_mm();
        self.ensure_room(leading);
        self.y_mm -= leading;
        let y = self.y_mm;
        for (x, text) in cells {
            self.current().items.push(PlacedText {
                text: text.to_string(),
                style,
                x_mm: *x,
                y_mm: y,
            });
        }
    }

    fn paragraph(&mut self, text: &str, style: TextStyle) {
        for line in wrap(text, style.wrap_width()) {
            self.row(&[(MARGIN_X_MM, line.as_str())], style);
        }
    }

    fn spacer(&mut self, height_mm: f32) {
        self.y_mm -= height_mm;
        if self.y_mm < MARGIN_Y_MM {
            self.ensure_room(0.0);
        }
    }
}

/// Greedy word wrap at `width` characters. Words longer than the width are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn rating_cell(value: Option<u8>) -> String {
    value
        .map(|v| format!("{v}/10"))
        .unwrap_or_else(|| "N/A".to_string())
}

fn recommendation_lines(lines: &[RecommendationLine], flow: &mut Flow) {
    for line in lines {
        flow.paragraph(&line.text, TextStyle::Body);
    }
}

/// Lays out the full report: header, profile, skill table, trends,
/// phased recommendations, footer.
pub fn layout_report(input: &ReportInput) -> Vec<PageLayout> {
    let mut flow = Flow::new();

    flow.paragraph(REPORT_TITLE, TextStyle::Title);
    flow.spacer(5.0);
    flow.paragraph(&format!("Prepared for: {}", input.profile.name), TextStyle::Heading);
    flow.paragraph(&format!("Profession: {}", input.profile.profession), TextStyle::Body);
    flow.spacer(5.0);

    flow.paragraph("Your Skill Set", TextStyle::Heading);
    flow.row(
        &[
            (SKILL_COLUMN_MM, "Skill"),
            (RATING_COLUMN_MM, "Self-Rating"),
            (SCORE_COLUMN_MM, "Verification Score"),
        ],
        TextStyle::TableHeader,
    );
    for record in &input.skills {
        let wrapped = wrap(&record.skill, SKILL_COLUMN_WRAP);
        let rating = format!("{}/10", record.rating);
        let score = rating_cell(record.score);
        for (i, part) in wrapped.iter().enumerate() {
            if i == 0 {
                flow.row(
                    &[
                        (SKILL_COLUMN_MM, part.as_str()),
                        (RATING_COLUMN_MM, rating.as_str()),
                        (SCORE_COLUMN_MM, score.as_str()),
                    ],
                    TextStyle::Body,
                );
            } else {
                flow.row(&[(SKILL_COLUMN_MM, part.as_str())], TextStyle::Body);
            }
        }
    }
    flow.spacer(5.0);

    if let Some(trends) = &input.trends {
        flow.paragraph("Trending Now", TextStyle::Heading);
        if trends.topics.is_empty() {
            flow.paragraph("No trending skills found.", TextStyle::Body);
        }
        for topic in &trends.topics {
            let text = match trends.source {
                TrendSource::Live => format!("{} ({} posts)", topic.keyword, topic.mentions),
                TrendSource::Sample => topic.keyword.clone(),
            };
            flow.paragraph(&text, TextStyle::Body);
        }
        flow.spacer(5.0);
    }

    flow.paragraph("Recommended Learning Path", TextStyle::Heading);
    match &input.recommendation {
        Some(rec) => {
            recommendation_lines(&rec.preamble, &mut flow);
            for phase in &rec.phases {
                flow.paragraph(&phase.heading, TextStyle::Heading);
                recommendation_lines(&phase.lines, &mut flow);
            }
        }
        None => flow.paragraph("Recommendations have not been generated yet.", TextStyle::Body),
    }
    flow.spacer(5.0);

    flow.paragraph(REPORT_FOOTER, TextStyle::Body);
    flow.pages
}
