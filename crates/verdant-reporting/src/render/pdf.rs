//! Single-page A4 rendering of an ESG report.
//!
//! Uses the PDF builtin Helvetica faces, which only cover ASCII; text is
//! transliterated before it is drawn.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rect, Rgb,
};

use super::ReportError;
use crate::domain::report::EsgReport;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const MAX_TOOL_LINES: usize = 8;

/// Optional sections of the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfOptions {
    /// Adds the tool usage list.
    pub include_tools: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            include_tools: true,
        }
    }
}

/// Renders the report as a one-page PDF.
///
/// # Errors
///
/// Returns `ReportError::Pdf` if the document cannot be assembled.
pub fn render_pdf(report: &EsgReport, options: &PdfOptions) -> Result<Vec<u8>, ReportError> {
    let title = format!("Reporte ESG - {}", ascii(&report.company_name));
    let (doc, page, layer) =
        PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;

    // Header band.
    fill(&layer, (0.09, 0.40, 0.24));
    layer.add_rect(
        Rect::new(Mm(0.0), Mm(PAGE_HEIGHT - 40.0), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT))
            .with_mode(PaintMode::Fill),
    );
    fill(&layer, (1.0, 1.0, 1.0));
    layer.use_text(
        "Reporte de Impacto ESG",
        22.0,
        Mm(MARGIN),
        Mm(PAGE_HEIGHT - 20.0),
        &bold,
    );
    layer.use_text(
        format!(
            "{}  |  Generado {}",
            ascii(&report.company_name),
            report.generated_at.format("%Y-%m-%d %H:%M UTC")
        ),
        11.0,
        Mm(MARGIN),
        Mm(PAGE_HEIGHT - 30.0),
        &regular,
    );

    let cards = [
        ("Empleados", report.totals.employees.to_string()),
        (
            "Tasa de finalizacion",
            format!("{:.1}%", report.totals.completion_rate),
        ),
        ("XP total", report.totals.total_xp.to_string()),
        (
            "CO2 reducido (kg)",
            format!("{:.1}", report.impact.co2_reduction_kg),
        ),
    ];
    let card_width = (PAGE_WIDTH - 2.0 * MARGIN - 3.0 * 4.0) / 4.0;
    let card_top = PAGE_HEIGHT - 50.0;
    for (i, (label, value)) in cards.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = MARGIN + i as f32 * (card_width + 4.0);
        fill(&layer, (0.91, 0.96, 0.92));
        layer.add_rect(
            Rect::new(Mm(x), Mm(card_top - 26.0), Mm(x + card_width), Mm(card_top))
                .with_mode(PaintMode::Fill),
        );
        fill(&layer, (0.09, 0.40, 0.24));
        layer.use_text(value.clone(), 16.0, Mm(x + 3.0), Mm(card_top - 12.0), &bold);
        fill(&layer, (0.25, 0.25, 0.25));
        layer.use_text(*label, 8.0, Mm(x + 3.0), Mm(card_top - 20.0), &regular);
    }

    let mut y = card_top - 40.0;
    y = section(&layer, &bold, "Valores fundamentales", y);
    if report.core_values.is_empty() {
        line(&layer, &regular, "Sin inscripciones todavia.", y);
        y -= 6.0;
    }
    for value in &report.core_values {
        line(
            &layer,
            &regular,
            &format!(
                "{}: {} inscripciones, {} completadas",
                ascii(&value.label),
                value.enrollments,
                value.completions
            ),
            y,
        );
        y -= 6.0;
    }

    y -= 4.0;
    y = section(&layer, &bold, "Impacto medido", y);
    for text in [
        format!("Agua ahorrada: {:.1} L", report.impact.water_saved_liters),
        format!("Residuos desviados: {:.1} kg", report.impact.waste_diverted_kg),
        format!("Ahorro economico: ${:.2}", report.impact.cost_savings),
    ] {
        line(&layer, &regular, &text, y);
        y -= 6.0;
    }

    if options.include_tools && !report.tools.is_empty() {
        y -= 4.0;
        y = section(&layer, &bold, "Herramientas utilizadas", y);
        for tool in report.tools.iter().take(MAX_TOOL_LINES) {
            line(
                &layer,
                &regular,
                &format!(
                    "{}: {} usos, {} empleados",
                    ascii(&tool.tool_name),
                    tool.uses,
                    tool.users
                ),
                y,
            );
            y -= 6.0;
        }
    }

    fill(&layer, (0.5, 0.5, 0.5));
    layer.use_text(
        "Verdant - capacitacion corporativa en sostenibilidad",
        8.0,
        Mm(MARGIN),
        Mm(10.0),
        &regular,
    );

    doc.save_to_bytes()
        .map_err(|e| ReportError::Pdf(e.to_string()))
}

fn fill(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
}

fn section(layer: &PdfLayerReference, font: &IndirectFontRef, title: &str, y: f32) -> f32 {
    fill(layer, (0.09, 0.40, 0.24));
    layer.use_text(title, 13.0, Mm(MARGIN), Mm(y), font);
    fill(layer, (0.15, 0.15, 0.15));
    y - 8.0
}

fn line(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, y: f32) {
    layer.use_text(ascii(text), 10.0, Mm(MARGIN + 2.0), Mm(y), font);
}

/// Transliterates to the ASCII range the builtin fonts can draw.
fn ascii(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => Some('a'),
            'é' | 'è' | 'ë' | 'ê' => Some('e'),
            'í' | 'ì' | 'ï' | 'î' => Some('i'),
            'ó' | 'ò' | 'ö' | 'ô' => Some('o'),
            'ú' | 'ù' | 'ü' | 'û' => Some('u'),
            'Á' => Some('A'),
            'É' => Some('E'),
            'Í' => Some('I'),
            'Ó' => Some('O'),
            'Ú' | 'Ü' => Some('U'),
            'ñ' => Some('n'),
            'Ñ' => Some('N'),
            '₂' => Some('2'),
            '¿' | '¡' => None,
            c if c.is_ascii() => Some(c),
            _ => Some('?'),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::report::{ImpactMetrics, ReportTotals, ToolUsage};

    fn sample() -> EsgReport {
        EsgReport {
            corporate_account_id: Uuid::new_v4(),
            company_name: "Compañía Ñandú".to_owned(),
            generated_at: Utc::now(),
            totals: ReportTotals {
                employees: 12,
                active_employees: 8,
                enrollments: 20,
                completed_enrollments: 9,
                completion_rate: 45.0,
                total_xp: 4200,
                lessons_completed: 70,
            },
            core_values: Vec::new(),
            modules: Vec::new(),
            employees: Vec::new(),
            tools: vec![ToolUsage {
                tool_name: "carbon_calculator".to_owned(),
                uses: 3,
                users: 2,
            }],
            impact: ImpactMetrics {
                co2_reduction_kg: 31.5,
                ..ImpactMetrics::default()
            },
        }
    }

    #[test]
    fn test_render_pdf_produces_a_pdf_document() {
        let bytes = render_pdf(&sample(), &PdfOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_pdf_without_tools() {
        let bytes = render_pdf(
            &sample(),
            &PdfOptions {
                include_tools: false,
            },
        )
        .unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_ascii_transliteration() {
        assert_eq!(ascii("Compañía Ñandú CO₂ ¿sí?"), "Compania Nandu CO2 si?");
        assert_eq!(ascii("日本"), "??");
    }
}
