//! Report review and confirmation screen content

use ayu_api::AppointmentDetails;
use ayu_tui::Theme;
use ratatui::{
    style::Modifier,
    text::{Line, Span},
};

use crate::store::StoredResult;

/// Spoken once when the report review opens
pub const REVIEW_GREETING: &str = "Please review your consultation details carefully. \
    If everything looks correct, confirm to generate your medical report.";

/// Spoken once when the appointment confirmation opens
pub const CONFIRMATION_VOICE: &str = "Your appointment is confirmed. Your medical report \
    has been generated and sent to your email. Please check your inbox for complete details.";

fn section(theme: &Theme, roman: &str, title: &str) -> Vec<Line<'static>> {
    vec![
        Line::default(),
        Line::from(vec![
            Span::styled(format!("{} ", roman), theme.accent_bold()),
            Span::styled(
                title.to_uppercase(),
                theme.dim_style().add_modifier(Modifier::BOLD),
            ),
        ]),
    ]
}

fn row(theme: &Theme, label: &str, value: Option<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<22}", label), theme.dim_style()),
        Span::styled(value.unwrap_or_else(|| "N/A".to_string()), theme.base_style()),
    ])
}

fn bullet(theme: &Theme, marker: &str, text: &str, style: ratatui::style::Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {} ", marker), style),
        Span::styled(text.to_string(), theme.base_style()),
    ])
}

/// Priority badge styled by urgency
fn priority_badge(theme: &Theme, priority: Option<&str>) -> Span<'static> {
    match priority {
        Some(p @ ("High" | "Emergency")) => Span::styled(
            format!("● {} PRIORITY", p.to_uppercase()),
            theme.error_style().add_modifier(Modifier::BOLD),
        ),
        Some(p @ "Medium") => Span::styled(
            format!("● {} PRIORITY", p.to_uppercase()),
            theme.warning_style().add_modifier(Modifier::BOLD),
        ),
        _ => Span::styled("● STANDARD".to_string(), theme.success_bold()),
    }
}

/// A patient field, preferring the backend-assembled report data and falling
/// back to the collected answers.
fn patient_value(stored: &StoredResult, key: &str) -> Option<String> {
    stored
        .report
        .patient_field(key)
        .or_else(|| stored.collected.get(key).cloned())
}

/// Build the full report review as renderable lines
pub fn report_lines(stored: &StoredResult, theme: &Theme) -> Vec<Line<'static>> {
    let analysis = &stored.report.medical_analysis;
    let priority = analysis.priority().map(str::to_string);
    let doctor = patient_value(stored, "assigned_doctor")
        .or_else(|| {
            analysis
                .doctor_recommendation
                .as_ref()
                .and_then(|r| r.specialist_type.clone())
        })
        .unwrap_or_else(|| "General Physician".to_string());
    let slot =
        patient_value(stored, "selected_slot").unwrap_or_else(|| "To be assigned".to_string());

    let mut lines = vec![
        Line::from(Span::styled(
            "Appointment Consultation Report".to_string(),
            theme.accent_bold(),
        )),
        Line::from(Span::styled(
            "Please verify the information below before we generate your final medical report."
                .to_string(),
            theme.dim_style(),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("Assigned specialist: ".to_string(), theme.dim_style()),
            Span::styled(doctor, theme.base_style().add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled("Fee: ₹500".to_string(), theme.success_bold()),
        ]),
        Line::from(vec![
            Span::styled("Appt. slot: ".to_string(), theme.dim_style()),
            Span::styled(slot, theme.base_style()),
            Span::raw("    "),
            priority_badge(theme, priority.as_deref()),
        ]),
    ];
    if analysis.is_high_priority() {
        lines.push(Line::from(Span::styled(
            "⚠ URGENT ATTENTION REQUIRED".to_string(),
            theme.error_style().add_modifier(Modifier::BOLD),
        )));
    }

    lines.extend(section(theme, "I.", "Patient information"));
    lines.push(row(theme, "Patient name", patient_value(stored, "name")));
    lines.push(row(
        theme,
        "Age / DOB",
        patient_value(stored, "dob").or_else(|| patient_value(stored, "age")),
    ));
    lines.push(row(theme, "Gender", patient_value(stored, "gender")));
    lines.push(row(theme, "Email", patient_value(stored, "email")));
    lines.push(row(theme, "Phone", patient_value(stored, "phone")));

    lines.extend(section(theme, "II.", "Clinical observations"));
    lines.push(row(theme, "Primary symptom", patient_value(stored, "symptoms")));
    lines.push(row(
        theme,
        "Clinical duration",
        patient_value(stored, "symptom_duration").or_else(|| patient_value(stored, "duration")),
    ));
    let conditions = [
        patient_value(stored, "bp_history").map(|v| format!("BP: {}", v)),
        patient_value(stored, "sugar_history").map(|v| format!("Diabetes: {}", v)),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" · ");
    lines.push(row(
        theme,
        "Associated conditions",
        if conditions.is_empty() {
            patient_value(stored, "chronic_diseases")
        } else {
            Some(conditions)
        },
    ));
    lines.push(row(theme, "Past surgeries", patient_value(stored, "surgeries")));
    if let Some(medications) = patient_value(stored, "medications") {
        lines.push(row(theme, "Current medications", Some(medications)));
    }

    lines.extend(section(theme, "III.", "Report preferences"));
    lines.push(row(theme, "Language output", patient_value(stored, "language")));
    if let Some(rec) = &analysis.doctor_recommendation {
        if let Some(specialist) = &rec.specialist_type {
            lines.push(row(theme, "Recommended specialist", Some(specialist.clone())));
        }
    }

    if let Some(summary) = analysis.summary() {
        lines.extend(section(theme, "IV.", "AI preliminary observation"));
        for wrapped in textwrap_lines(summary) {
            lines.push(Line::from(Span::styled(format!("  {}", wrapped), theme.base_style())));
        }
        if !analysis.possible_conditions.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  Possible: {}", analysis.possible_conditions.join(" · ")),
                theme.accent_style(),
            )));
        }
    }

    if let Some(tests) = &analysis.suggested_tests {
        let all = tests.all();
        if !all.is_empty() {
            lines.extend(section(theme, "V.", "Recommended tests"));
            for (i, test) in all.iter().enumerate() {
                let mut text = format!("  {}. {}", i + 1, test.test_name);
                if let Some(reason) = &test.reason {
                    text.push_str(&format!(" — {}", reason));
                }
                lines.push(Line::from(Span::styled(text, theme.base_style())));
            }
        }
    }

    if !analysis.lifestyle_recommendations.is_empty() {
        lines.extend(section(theme, "VI.", "Lifestyle recommendations"));
        for item in &analysis.lifestyle_recommendations {
            lines.push(bullet(theme, "✓", item, theme.success_style()));
        }
    }
    if !analysis.precautions.is_empty() {
        lines.extend(section(theme, "VII.", "Precautions"));
        for item in &analysis.precautions {
            lines.push(bullet(theme, "!", item, theme.warning_style()));
        }
    }
    if !analysis.emergency_signs.is_empty() {
        lines.extend(section(theme, "⚠", "Emergency warning signs"));
        lines.push(Line::from(Span::styled(
            "  Seek immediate medical attention if you experience any of the following:"
                .to_string(),
            theme.error_style(),
        )));
        for sign in &analysis.emergency_signs {
            lines.push(bullet(theme, "⚠", sign, theme.error_style()));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "By proceeding you confirm this AI-generated summary is based on your provided \
         information and is not a substitute for professional medical advice."
            .to_string(),
        theme.dim_style(),
    )));
    lines
}

/// Build the appointment confirmation card as renderable lines
pub fn confirmation_lines(
    details: &AppointmentDetails,
    stored: Option<&StoredResult>,
    fallback_id: &str,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let patient = |key: &str| stored.and_then(|s| patient_value(s, key));

    let appointment_id = details
        .appointment_id
        .clone()
        .unwrap_or_else(|| fallback_id.to_string());
    let doctor = details
        .doctor_specialist
        .clone()
        .or_else(|| patient("assigned_doctor"))
        .unwrap_or_else(|| "Dr. Arun Kumar".to_string());
    let time = details
        .appointment_time
        .clone()
        .or_else(|| patient("selected_slot"))
        .unwrap_or_else(|| "To be confirmed".to_string());
    let consult_type = details
        .consultation_type
        .clone()
        .unwrap_or_else(|| "Online Consultation".to_string());
    let expertise = details
        .expertise
        .clone()
        .or_else(|| patient("doctor_specialty"))
        .unwrap_or_else(|| "General Medicine".to_string());

    let mut lines = vec![
        Line::from(Span::styled(
            "✔ Appointment Confirmed!".to_string(),
            theme.success_bold(),
        )),
        Line::from(Span::styled(
            "Your health consultation has been successfully scheduled.".to_string(),
            theme.dim_style(),
        )),
        Line::default(),
        row(theme, "Appointment ID", Some(appointment_id)),
        row(theme, "Appointment type", Some(consult_type)),
        row(theme, "Doctor / Specialist", Some(doctor)),
        row(theme, "Doctor expertise", Some(expertise)),
        row(theme, "Date & time", Some(time)),
        Line::default(),
        Line::from(Span::styled(
            "Your medical report and appointment details have been sent to your registered \
             email address."
                .to_string(),
            theme.accent_style(),
        )),
    ];
    if let Some(email) = patient("email") {
        lines.push(Line::from(Span::styled(email, theme.accent_bold())));
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "This is a digitally generated health summary. In case of emergency, please visit \
         the nearest hospital."
            .to_string(),
        theme.dim_style(),
    )));
    lines
}

fn textwrap_lines(text: &str) -> Vec<String> {
    textwrap::wrap(text, 76)
        .into_iter()
        .map(|s| s.into_owned())
        .collect()
}
