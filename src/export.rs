//! Medication-course report as PDF, for handing to a physician.
//!
//! Text assembly (`course_block`) is separate from rendering so the content
//! can be checked without parsing PDF output.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use printpdf::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::enums::{CourseType, DiscontinuationReason, ImpairmentLevel};
use crate::models::MedicationCourse;

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: Mm = Mm(280.0);
const BOTTOM_MARGIN: Mm = Mm(20.0);
const LEFT: Mm = Mm(20.0);
const INDENT: Mm = Mm(25.0);
const WRAP_CHARS: usize = 85;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("PDF font error: {0}")]
    Font(String),

    #[error("PDF save error: {0}")]
    Save(String),

    #[error("Cannot write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Report header fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub patient_name: Option<String>,
    pub clinician: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

/// Courses overlapping the report period; open bounds include everything.
pub fn courses_in_period<'a>(
    courses: &'a [MedicationCourse],
    meta: &ReportMeta,
) -> Vec<&'a MedicationCourse> {
    courses
        .iter()
        .filter(|c| match (meta.period_end, c.start_date) {
            (Some(end), Some(start)) => start <= end,
            _ => true,
        })
        .filter(|c| match (meta.period_start, c.end_date) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        })
        .collect()
}

/// Lines of one course block; the first is the heading.
pub fn course_block(course: &MedicationCourse) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({})",
        course.medication_name,
        course_type_label(course.course_type)
    )];

    if let Some(dose) = course.dose_text.as_deref().filter(|d| !d.is_empty()) {
        lines.push(format!("Dosierung: {dose}"));
    }
    lines.push(format!("Zeitraum: {}", period_label(course)));

    let baseline = &course.baseline;
    let days = match (baseline.days_with_symptom_min, baseline.days_with_symptom_max) {
        (Some(min), Some(max)) if min != max => Some(format!("{min}-{max} Kopfschmerztage/Monat")),
        (Some(n), _) | (None, Some(n)) => Some(format!("{n} Kopfschmerztage/Monat")),
        (None, None) => None,
    };
    let impairment = baseline.impairment.map(impairment_label);
    match (days, impairment) {
        (Some(d), Some(i)) => lines.push(format!("Ausgangslage: {d}, Beeinträchtigung {i}")),
        (Some(d), None) => lines.push(format!("Ausgangslage: {d}")),
        (None, Some(i)) => lines.push(format!("Ausgangslage: Beeinträchtigung {i}")),
        (None, None) => {}
    }

    if let Some(effectiveness) = course.effectiveness {
        lines.push(format!("Wirksamkeit: {effectiveness}/10"));
    }
    if course.has_side_effects {
        let detail = course.side_effects.as_deref().unwrap_or("ja");
        lines.push(format!("Nebenwirkungen: {detail}"));
    }
    if let Some(reason) = course.discontinuation_reason {
        let mut line = format!("Abbruchgrund: {}", discontinuation_label(reason));
        if let Some(details) = course.discontinuation_details.as_deref() {
            line.push_str(&format!(" ({details})"));
        }
        lines.push(line);
    }
    if let Some(note) = course.physician_note.as_deref() {
        lines.push(format!("Notiz für Ärztin/Arzt: {note}"));
    }
    lines
}

fn period_label(course: &MedicationCourse) -> String {
    let fmt = |d: NaiveDate| d.format("%d.%m.%Y").to_string();
    match (course.start_date, course.end_date) {
        (Some(s), Some(e)) => format!("{} bis {}", fmt(s), fmt(e)),
        (Some(s), None) if course.is_active => format!("seit {}", fmt(s)),
        (Some(s), None) => format!("ab {}", fmt(s)),
        (None, Some(e)) => format!("bis {}", fmt(e)),
        (None, None) => "unbekannt".into(),
    }
}

fn course_type_label(t: CourseType) -> &'static str {
    match t {
        CourseType::Prophylaxis => "Prophylaxe",
        CourseType::Acute => "Akutmedikation",
        CourseType::Other => "Sonstige",
    }
}

fn impairment_label(level: ImpairmentLevel) -> &'static str {
    match level {
        ImpairmentLevel::Unimpaired => "keine",
        ImpairmentLevel::Mild => "leicht",
        ImpairmentLevel::Moderate => "mittel",
        ImpairmentLevel::Severe => "schwer",
    }
}

fn discontinuation_label(reason: DiscontinuationReason) -> &'static str {
    match reason {
        DiscontinuationReason::Ineffective => "unwirksam",
        DiscontinuationReason::SideEffects => "Nebenwirkungen",
        DiscontinuationReason::PlannedEnd => "geplantes Ende",
        DiscontinuationReason::Other => "sonstiger Grund",
    }
}

// ─── PDF generation ───────────────────────────────────────────────────────────

/// Cursor over the document that starts a new page at the bottom margin.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Self {
        let (doc, page, layer) = PdfDocument::new(title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        Self { doc, layer, y: TOP, pages: 1 }
    }

    fn ensure_space(&mut self, needed: Mm) {
        if self.y - needed < BOTTOM_MARGIN {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
            self.pages += 1;
        }
    }

    fn text(&mut self, text: &str, size: f32, x: Mm, advance: Mm, font: &IndirectFontRef) {
        self.ensure_space(advance);
        self.layer.use_text(text, size, x, self.y, font);
        self.y -= advance;
    }

    fn gap(&mut self, space: Mm) {
        self.y -= space;
    }
}

/// Renders the report. Returns PDF bytes.
pub fn generate_course_report_pdf(
    courses: &[MedicationCourse],
    meta: &ReportMeta,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let title = "Medikamentenverlauf Migräne";
    let mut writer = PageWriter::new(title);
    let font = writer
        .doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Font(e.to_string()))?;
    let bold = writer
        .doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ExportError::Font(e.to_string()))?;

    writer.text(title, 14.0, LEFT, Mm(8.0), &bold);
    for line in header_lines(meta, generated_at) {
        writer.text(&line, 9.0, LEFT, Mm(4.5), &font);
    }
    writer.gap(Mm(6.0));

    let selected = courses_in_period(courses, meta);
    if selected.is_empty() {
        writer.text("Keine Medikamentenverläufe im gewählten Zeitraum.", 10.0, LEFT, Mm(5.0), &font);
    }
    for course in selected {
        let block = course_block(course);
        let mut lines = block.iter();
        if let Some(heading) = lines.next() {
            // keep heading together with at least one detail line
            writer.ensure_space(Mm(12.0));
            writer.text(heading, 11.0, LEFT, Mm(6.0), &bold);
        }
        for line in lines {
            for wrapped in wrap_text(line, WRAP_CHARS) {
                writer.text(&wrapped, 9.0, INDENT, Mm(4.5), &font);
            }
        }
        writer.gap(Mm(4.0));
    }

    tracing::info!(pages = writer.pages, courses = courses.len(), "Course report rendered");

    let mut buf = BufWriter::new(Vec::new());
    writer
        .doc
        .save(&mut buf)
        .map_err(|e| ExportError::Save(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| ExportError::Save(e.to_string()))
}

fn header_lines(meta: &ReportMeta, generated_at: DateTime<Utc>) -> Vec<String> {
    let fmt = |d: NaiveDate| d.format("%d.%m.%Y").to_string();
    let mut lines = Vec::new();
    if let Some(patient) = meta.patient_name.as_deref() {
        lines.push(format!("Patient/in: {patient}"));
    }
    if let Some(clinician) = meta.clinician.as_deref() {
        lines.push(format!("Für: {clinician}"));
    }
    match (meta.period_start, meta.period_end) {
        (Some(s), Some(e)) => lines.push(format!("Zeitraum: {} bis {}", fmt(s), fmt(e))),
        (Some(s), None) => lines.push(format!("Zeitraum: ab {}", fmt(s))),
        (None, Some(e)) => lines.push(format!("Zeitraum: bis {}", fmt(e))),
        (None, None) => {}
    }
    lines.push(format!("Erstellt am {}", generated_at.format("%d.%m.%Y")));
    lines
}

/// File name of a report created at `generated_at`.
pub fn report_filename(generated_at: DateTime<Utc>) -> String {
    format!("medikamentenverlauf-{}.pdf", generated_at.format("%Y-%m-%d"))
}

/// Writes PDF bytes to `exports_dir/filename`, creating the directory.
pub fn export_pdf_to_file(
    pdf_bytes: &[u8],
    filename: &str,
    exports_dir: &Path,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(exports_dir)?;
    let path = exports_dir.join(filename);
    std::fs::write(&path, pdf_bytes)?;
    tracing::info!(path = %path.display(), "Report exported");
    Ok(path)
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let current_len = current.chars().count();
        if current_len + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaselineSeverity;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn generated() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 20, 10, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn course(name: &str, start: Option<NaiveDate>, end: Option<NaiveDate>) -> MedicationCourse {
        MedicationCourse {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            medication_name: name.into(),
            course_type: CourseType::Prophylaxis,
            dose_text: Some("50 mg 1-0-1-0".into()),
            start_date: start,
            end_date: end,
            is_active: end.is_none(),
            baseline: BaselineSeverity {
                days_with_symptom_min: Some(8),
                days_with_symptom_max: Some(12),
                impairment: Some(ImpairmentLevel::Severe),
            },
            effectiveness: Some(3),
            has_side_effects: true,
            side_effects: Some("Wortfindungsstörungen".into()),
            discontinuation_reason: end.map(|_| DiscontinuationReason::SideEffects),
            discontinuation_details: None,
            physician_note: None,
            created_at: generated(),
            updated_at: generated(),
        }
    }

    #[test]
    fn course_block_lists_all_sections() {
        let c = course("Topiramat", date(2025, 6, 1), date(2025, 12, 31));
        let lines = course_block(&c);
        assert_eq!(lines[0], "Topiramat (Prophylaxe)");
        assert!(lines.contains(&"Dosierung: 50 mg 1-0-1-0".to_string()));
        assert!(lines.contains(&"Zeitraum: 01.06.2025 bis 31.12.2025".to_string()));
        assert!(lines.contains(&"Ausgangslage: 8-12 Kopfschmerztage/Monat, Beeinträchtigung schwer".to_string()));
        assert!(lines.contains(&"Wirksamkeit: 3/10".to_string()));
        assert!(lines.contains(&"Nebenwirkungen: Wortfindungsstörungen".to_string()));
        assert!(lines.contains(&"Abbruchgrund: Nebenwirkungen".to_string()));
    }

    #[test]
    fn active_course_period_reads_since() {
        let c = course("Amitriptylin", date(2026, 2, 1), None);
        assert!(course_block(&c).contains(&"Zeitraum: seit 01.02.2026".to_string()));
    }

    #[test]
    fn period_filter_keeps_overlapping_courses() {
        let courses = vec![
            course("alt", date(2024, 1, 1), date(2024, 6, 1)),
            course("überlappend", date(2025, 11, 1), date(2026, 2, 1)),
            course("laufend", date(2026, 3, 1), None),
            course("ohne Datum", None, None),
        ];
        let meta = ReportMeta {
            period_start: date(2026, 1, 1),
            period_end: date(2026, 12, 31),
            ..ReportMeta::default()
        };
        let names: Vec<_> = courses_in_period(&courses, &meta)
            .iter()
            .map(|c| c.medication_name.as_str())
            .collect();
        assert_eq!(names, vec!["überlappend", "laufend", "ohne Datum"]);
    }

    #[test]
    fn pdf_has_magic_bytes() {
        let meta = ReportMeta {
            patient_name: Some("Erika Mustermann".into()),
            clinician: Some("Dr. Weber".into()),
            ..ReportMeta::default()
        };
        let courses = vec![course("Topiramat", date(2025, 6, 1), None)];
        let bytes = generate_course_report_pdf(&courses, &meta, generated()).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn long_report_paginates() {
        let courses: Vec<_> = (0..40)
            .map(|i| course(&format!("Medikament {i}"), date(2025, 1, 1), None))
            .collect();
        let bytes = generate_course_report_pdf(&courses, &ReportMeta::default(), generated()).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn empty_report_still_renders() {
        let bytes = generate_course_report_pdf(&[], &ReportMeta::default(), generated()).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn export_writes_into_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("exports");
        let path = export_pdf_to_file(b"%PDF-1.4 test", &report_filename(generated()), &dir).unwrap();
        assert!(path.exists());
        assert!(path.ends_with("medikamentenverlauf-2026-05-20.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 test");
    }

    #[test]
    fn wrap_text_counts_characters() {
        let lines = wrap_text("Übelkeit Übelkeit Übelkeit", 18);
        assert_eq!(lines, vec!["Übelkeit Übelkeit", "Übelkeit"]);
        assert_eq!(wrap_text("", 40), vec![String::new()]);
    }
}
