//! Draws laid-out report pages with printpdf's builtin Helvetica fonts.

use anyhow::{anyhow, Result};
use printpdf::{
    BuiltinFont, FontId, Layer, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, Pt,
    TextItem, TextMatrix, TextRenderingMode,
};
use tracing::{debug, warn};

use crate::report::layout::{
    layout_report, PageLayout, ReportInput, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};

const DOCUMENT_TITLE: &str = "SkillPath Learning Path";

fn load_builtin(doc: &mut PdfDocument, builtin: BuiltinFont) -> Result<FontId> {
    let font_bytes = builtin.get_subset_font().bytes;
    let font = ParsedFont::from_bytes(&font_bytes, 0, &mut Vec::new())
        .ok_or_else(|| anyhow!("Failed to parse built-in font {builtin:?}"))?;
    Ok(doc.add_font(&font))
}

/// Builtin fonts only carry Latin-1 glyphs; map common typography to ASCII
/// and replace anything else outside Latin-1.
pub fn to_latin1(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '‘' | '’' | '′' => '\'',
            '“' | '”' | '″' => '"',
            '–' | '—' | '‑' => '-',
            '•' | '●' | '▪' => '-',
            '★' => '*',
            '☆' => 'o',
            '\u{00a0}' => ' ',
            c if (c as u32) < 0x100 => c,
            _ => '?',
        })
        .collect()
}

/// Renders already laid-out pages to PDF bytes.
pub fn render_pages(pages: &[PageLayout]) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::new(DOCUMENT_TITLE);
    let regular = load_builtin(&mut doc, BuiltinFont::Helvetica)?;
    let bold = load_builtin(&mut doc, BuiltinFont::HelveticaBold)?;

    for page in pages {
        let layer_id = doc.add_layer(&Layer::new("Content"));
        let mut ops = vec![Op::BeginLayer {
            layer_id: layer_id.clone(),
        }];

        for item in &page.items {
            let font = if item.style.is_bold() { &bold } else { &regular };
            ops.extend([
                Op::SetFontSize {
                    size: Pt(item.style.size_pt()),
                    font: font.clone(),
                },
                Op::StartTextSection,
                Op::SetTextMatrix {
                    matrix: TextMatrix::Translate(Mm(item.x_mm).into(), Mm(item.y_mm).into()),
                },
                Op::SetTextRenderingMode {
                    mode: TextRenderingMode::Fill,
                },
                Op::WriteText {
                    items: vec![TextItem::Text(to_latin1(&item.text))],
                    font: font.clone(),
                },
                Op::EndTextSection,
            ]);
        }

        ops.push(Op::EndLayer { layer_id });
        doc.pages
            .push(PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops));
    }

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if !warnings.is_empty() {
        warn!("PDF generation produced {} warning(s)", warnings.len());
    }
    debug!("Rendered {} page(s), {} bytes", pages.len(), bytes.len());
    Ok(bytes)
}

/// Lays out and renders a learning-path report.
pub fn render_learning_path_pdf(input: &ReportInput) -> Result<Vec<u8>> {
    render_pages(&layout_report(input))
}

/// Same as `render_learning_path_pdf`, on the blocking thread pool.
pub async fn render_learning_path_pdf_blocking(input: ReportInput) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || render_learning_path_pdf(&input)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::models::{SkillRecord, UserProfile};

    fn input() -> ReportInput {
        ReportInput {
            profile: UserProfile {
                name: "Zoë".into(),
                email: "zoe@example.com".into(),
                profession: "Nurse".into(),
            },
            skills: vec![SkillRecord {
                skill: "Triage".into(),
                rating: 6,
                score: Some(8),
            }],
            trends: None,
            recommendation: None,
        }
    }

    #[test]
    fn test_to_latin1_maps_typography() {
        assert_eq!(to_latin1("“Don’t” – ★☆ Zoë 你"), "\"Don't\" - *o Zoë ?");
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = render_learning_path_pdf(&input()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_blocking_render_matches_header() {
        let bytes = render_learning_path_pdf_blocking(input()).await.unwrap();
        assert!(bytes.len() > 100);
        assert!(bytes.starts_with(b"%PDF"));
    }
}
