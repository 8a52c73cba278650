//! Core types for the intake backend contract

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// The kind of answer the backend expects for the field it is asking about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Options,
    Choice,
    Payment,
}

impl FieldType {
    /// Parse the wire string. Unknown strings are a boundary error, not a
    /// silent fallback.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "options" => Ok(FieldType::Options),
            "choice" => Ok(FieldType::Choice),
            "payment" => Ok(FieldType::Payment),
            other => Err(Error::UnknownFieldType(other.to_string())),
        }
    }

    /// Get the wire name for this field type
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Options => "options",
            FieldType::Choice => "choice",
            FieldType::Payment => "payment",
        }
    }

    /// Whether answers come from a provided option list
    pub fn is_selection(&self) -> bool {
        matches!(self, FieldType::Options | FieldType::Choice)
    }

    /// Whether the field accepts typed free-text input
    pub fn accepts_free_text(&self) -> bool {
        !self.is_selection() && *self != FieldType::Payment
    }
}

/// What the UI must solicit next: a field key, its type, and any options.
/// Fully replaced on every exchange, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Key the answer will be stored under (assigned by the backend)
    pub key: String,
    /// Expected answer type
    pub kind: FieldType,
    /// Options when `kind` is a selection type; empty otherwise
    #[serde(default)]
    pub options: Vec<String>,
}

impl FieldDescriptor {
    /// Create a free-text field descriptor
    pub fn text(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: FieldType::Text,
            options: Vec::new(),
        }
    }

    /// Create a selection field descriptor
    pub fn options(key: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            key: key.into(),
            kind: FieldType::Options,
            options,
        }
    }

    /// Create a payment field descriptor
    pub fn payment(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: FieldType::Payment,
            options: Vec::new(),
        }
    }
}

/// One exchange request: everything collected so far plus the latest answer
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExchangeRequest {
    /// All answers accumulated so far, keyed by backend-assigned field key
    pub collected_data: BTreeMap<String, String>,
    /// The answer being submitted ("" for the opening exchange)
    pub latest_input: String,
    /// Key of the field this input answers; `None` on the opening exchange
    pub last_field_key: Option<String>,
}

/// Decoded speech payload ready for playback
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    bytes: Vec<u8>,
}

impl AudioClip {
    /// Decode a base64 speech payload
    pub fn from_base64(encoded: &str) -> Result<Self> {
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        Ok(Self { bytes })
    }

    /// Wrap raw audio bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The decoded audio bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume into the decoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AudioClip({} bytes)", self.bytes.len())
    }
}

/// Validated exchange response
#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    /// Question text to show as the assistant's bubble
    pub question: String,
    /// Synthesized speech for the question, when the backend provided it
    pub speech: Option<AudioClip>,
    /// What the exchange means for the conversation
    pub outcome: ExchangeOutcome,
}

/// Outcome of one exchange
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// Conversation continues; solicit this field next
    Ask(FieldDescriptor),
    /// Completion signal; the report is handed to the report view verbatim
    Complete(Box<Report>),
    /// The backend rejected the latest answer; the field stays active
    Rejected { message: String },
}

// --- Report payload ---

/// Final report returned with the completion signal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// Patient demographics and answers as assembled by the backend
    #[serde(default)]
    pub patient_data: BTreeMap<String, serde_json::Value>,
    /// The AI analysis block
    #[serde(default)]
    pub medical_analysis: MedicalAnalysis,
}

impl Report {
    /// Look up a patient field as display text
    pub fn patient_field(&self, key: &str) -> Option<String> {
        self.patient_data.get(key).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// AI analysis section of the report. Every field is optional; the backend
/// fills in what its model produced and nothing more.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalAnalysis {
    pub patient_summary: Option<String>,
    pub explanation: Option<String>,
    #[serde(default)]
    pub possible_conditions: Vec<String>,
    pub doctor_recommendation: Option<DoctorRecommendation>,
    #[serde(alias = "recommended_tests")]
    pub suggested_tests: Option<SuggestedTests>,
    #[serde(default)]
    pub lifestyle_recommendations: Vec<String>,
    #[serde(default)]
    pub precautions: Vec<String>,
    #[serde(default)]
    pub emergency_signs: Vec<String>,
}

impl MedicalAnalysis {
    /// Summary text, preferring the patient-facing wording
    pub fn summary(&self) -> Option<&str> {
        self.patient_summary
            .as_deref()
            .or(self.explanation.as_deref())
    }

    /// Consultation priority label, whichever alias the backend used
    pub fn priority(&self) -> Option<&str> {
        let rec = self.doctor_recommendation.as_ref()?;
        rec.consultation_priority
            .as_deref()
            .or(rec.urgency.as_deref())
    }

    /// Whether the priority label calls for urgent attention
    pub fn is_high_priority(&self) -> bool {
        matches!(self.priority(), Some("High") | Some("Emergency"))
    }
}

/// Specialist recommendation block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorRecommendation {
    pub specialist_type: Option<String>,
    pub consultation_priority: Option<String>,
    pub urgency: Option<String>,
}

/// Test recommendations, grouped the way the backend groups them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestedTests {
    #[serde(default)]
    pub blood_tests: Vec<TestItem>,
    #[serde(default)]
    pub basic_tests: Vec<TestItem>,
    #[serde(default)]
    pub imaging: Vec<TestItem>,
    #[serde(default)]
    pub special_tests: Vec<TestItem>,
    #[serde(default)]
    pub additional_tests: Vec<TestItem>,
}

impl SuggestedTests {
    /// All tests flattened in display order
    pub fn all(&self) -> Vec<&TestItem> {
        self.blood_tests
            .iter()
            .chain(&self.basic_tests)
            .chain(&self.imaging)
            .chain(&self.special_tests)
            .chain(&self.additional_tests)
            .collect()
    }
}

/// One recommended test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestItem {
    pub test_name: String,
    pub reason: Option<String>,
}

// --- Speech synthesis ---

/// Request body for the speech synthesis endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    pub text: String,
    pub language: String,
}

// --- Appointment booking ---

/// Request body for the booking endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BookingRequest {
    pub patient_data: BTreeMap<String, serde_json::Value>,
    pub medical_analysis: MedicalAnalysis,
}

/// Booking response
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfirmation {
    #[serde(default)]
    pub success: bool,
    pub appointment_details: Option<AppointmentDetails>,
}

/// Details of a confirmed appointment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentDetails {
    pub appointment_id: Option<String>,
    pub doctor_specialist: Option<String>,
    pub appointment_time: Option<String>,
    pub consultation_type: Option<String>,
    pub expertise: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_parse_roundtrip() {
        for kind in [
            FieldType::Text,
            FieldType::Number,
            FieldType::Date,
            FieldType::Options,
            FieldType::Choice,
            FieldType::Payment,
        ] {
            assert_eq!(FieldType::parse(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_field_type_parse_unknown() {
        let err = FieldType::parse("slider").unwrap_err();
        assert!(matches!(err, Error::UnknownFieldType(s) if s == "slider"));
    }

    #[test]
    fn test_field_type_predicates() {
        assert!(FieldType::Options.is_selection());
        assert!(FieldType::Choice.is_selection());
        assert!(!FieldType::Payment.is_selection());

        assert!(FieldType::Text.accepts_free_text());
        assert!(FieldType::Number.accepts_free_text());
        assert!(FieldType::Date.accepts_free_text());
        assert!(!FieldType::Options.accepts_free_text());
        assert!(!FieldType::Payment.accepts_free_text());
    }

    #[test]
    fn test_audio_clip_base64() {
        let clip = AudioClip::from_base64("aGVsbG8=").unwrap();
        assert_eq!(clip.bytes(), b"hello");
        assert!(AudioClip::from_base64("not base64!!!").is_err());
    }

    #[test]
    fn test_exchange_request_serialization() {
        let mut collected = BTreeMap::new();
        collected.insert("language".to_string(), "English".to_string());
        let request = ExchangeRequest {
            collected_data: collected,
            latest_input: "Asha".to_string(),
            last_field_key: Some("name".to_string()),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["latest_input"], "Asha");
        assert_eq!(json["last_field_key"], "name");
        assert_eq!(json["collected_data"]["language"], "English");

        // Opening exchange serializes the missing key as null
        let opening = ExchangeRequest::default();
        let json = serde_json::to_value(&opening).unwrap();
        assert!(json["last_field_key"].is_null());
    }

    #[test]
    fn test_report_patient_field_stringifies() {
        let report: Report = serde_json::from_value(serde_json::json!({
            "patient_data": { "name": "Asha", "age": 34 }
        }))
        .unwrap();
        assert_eq!(report.patient_field("name").as_deref(), Some("Asha"));
        assert_eq!(report.patient_field("age").as_deref(), Some("34"));
        assert_eq!(report.patient_field("missing"), None);
    }

    #[test]
    fn test_analysis_priority_aliases() {
        let analysis: MedicalAnalysis = serde_json::from_value(serde_json::json!({
            "doctor_recommendation": { "urgency": "High" }
        }))
        .unwrap();
        assert_eq!(analysis.priority(), Some("High"));
        assert!(analysis.is_high_priority());

        let analysis: MedicalAnalysis = serde_json::from_value(serde_json::json!({
            "doctor_recommendation": {
                "consultation_priority": "Medium",
                "urgency": "High"
            }
        }))
        .unwrap();
        // consultation_priority wins over urgency
        assert_eq!(analysis.priority(), Some("Medium"));
        assert!(!analysis.is_high_priority());
    }

    #[test]
    fn test_suggested_tests_flatten_order() {
        let tests: SuggestedTests = serde_json::from_value(serde_json::json!({
            "blood_tests": [{ "test_name": "CBC" }],
            "imaging": [{ "test_name": "Chest X-ray", "reason": "persistent cough" }],
            "additional_tests": [{ "test_name": "ECG" }]
        }))
        .unwrap();
        let names: Vec<&str> = tests.all().iter().map(|t| t.test_name.as_str()).collect();
        assert_eq!(names, ["CBC", "Chest X-ray", "ECG"]);
    }

    #[test]
    fn test_analysis_accepts_recommended_tests_alias() {
        let analysis: MedicalAnalysis = serde_json::from_value(serde_json::json!({
            "recommended_tests": { "basic_tests": [{ "test_name": "BP check" }] }
        }))
        .unwrap();
        assert_eq!(analysis.suggested_tests.unwrap().all().len(), 1);
    }
}
