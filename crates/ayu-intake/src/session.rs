//! Cross-view patient session state

use serde::{Deserialize, Serialize};

/// Languages the assistant speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Kannada,
}

impl Language {
    /// All supported languages, in display order
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Kannada];

    /// Wire/display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Kannada => "Kannada",
        }
    }

    /// Native-script label shown on the language picker
    pub fn native_label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "हिन्दी",
            Language::Kannada => "ಕನ್ನಡ",
        }
    }

    /// Parse a stored/configured language name, case-insensitively
    pub fn parse(s: &str) -> Option<Language> {
        match s.to_ascii_lowercase().as_str() {
            "english" => Some(Language::English),
            "hindi" => Some(Language::Hindi),
            "kannada" => Some(Language::Kannada),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session state carried across screens. Explicitly passed into each view;
/// fields are set through the typed setters and cleared only by `reset`.
#[derive(Debug, Clone, Default)]
pub struct PatientSession {
    language: Language,
    name: Option<String>,
    email: Option<String>,
}

impl PatientSession {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            ..Default::default()
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = Some(email.into());
    }

    /// Restore the session to its defaults
    pub fn reset(&mut self) {
        *self = PatientSession::default();
    }
}
