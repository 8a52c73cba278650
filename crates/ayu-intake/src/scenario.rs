//! Canned demo scenarios for the AI-doctor playback

use crate::transcript::Role;

/// A scripted consultation used for demonstration playback. Not backed by
/// the intake backend.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: &'static str,
    pub case_id: &'static str,
    pub label: &'static str,
    pub doctor: &'static str,
    pub specialist: &'static str,
    pub lines: Vec<ScriptLine>,
}

/// One scripted line
#[derive(Debug, Clone)]
pub struct ScriptLine {
    pub role: Role,
    pub text: String,
    /// Referral card attached to the closing assistant line
    pub referral: Option<Referral>,
}

impl ScriptLine {
    fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            text: text.to_string(),
            referral: None,
        }
    }

    fn assistant(text: &str) -> Self {
        Self {
            role: Role::Assistant,
            text: text.to_string(),
            referral: None,
        }
    }

    fn referral(text: &str, referral: Referral) -> Self {
        Self {
            role: Role::Assistant,
            text: text.to_string(),
            referral: Some(referral),
        }
    }
}

/// Priority referral shown on the closing line of a scenario
#[derive(Debug, Clone)]
pub struct Referral {
    pub kind: String,
    pub specialty: String,
    pub slot: String,
}

/// The scenarios shipped with the demo
pub fn builtin_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "chest-pain",
            case_id: "C-1041",
            label: "Chest discomfort",
            doctor: "Dr. Arun Kumar",
            specialist: "Cardiology",
            lines: vec![
                ScriptLine::user("I've had a tight feeling in my chest since this morning."),
                ScriptLine::assistant(
                    "I understand, and I'm glad you reached out. Does the tightness spread to \
                     your arm, jaw, or back, and did it start during activity or at rest?",
                ),
                ScriptLine::user("It stays in the chest. It started while I was climbing stairs."),
                ScriptLine::assistant(
                    "Thank you. Exertional chest tightness deserves prompt attention. Are you \
                     also feeling breathless, sweaty, or nauseated right now?",
                ),
                ScriptLine::user("A little breathless, but no sweating."),
                ScriptLine::referral(
                    "Based on what you've described, I recommend a cardiology review today. \
                     I've flagged your case as a priority referral; please avoid exertion \
                     until you are seen.",
                    Referral {
                        kind: "Cardiology Consultation".into(),
                        specialty: "Interventional Cardiology".into(),
                        slot: "Today, 4:30 PM".into(),
                    },
                ),
            ],
        },
        Scenario {
            id: "fever",
            case_id: "C-1042",
            label: "Fever and body ache",
            doctor: "Dr. Meera Nair",
            specialist: "General Medicine",
            lines: vec![
                ScriptLine::user("I've had a fever and body ache for three days."),
                ScriptLine::assistant(
                    "Sorry to hear that. How high has the fever been, and does it come down \
                     with paracetamol?",
                ),
                ScriptLine::user("Around 101°F. It drops for a few hours and comes back."),
                ScriptLine::assistant(
                    "That pattern is common with viral infections, but three days is the point \
                     where we check for other causes. Any rash, severe headache, or pain \
                     behind the eyes?",
                ),
                ScriptLine::user("No rash, just a mild headache."),
                ScriptLine::referral(
                    "I suggest a physician review with a basic fever panel so we can rule out \
                     dengue and typhoid. Please keep up fluids and rest in the meantime.",
                    Referral {
                        kind: "Physician Consultation".into(),
                        specialty: "General Medicine".into(),
                        slot: "Tomorrow, 10:00 AM".into(),
                    },
                ),
            ],
        },
        Scenario {
            id: "stomach-pain",
            case_id: "C-1043",
            label: "Stomach pain",
            doctor: "Dr. Sanjay Rao",
            specialist: "Gastroenterology",
            lines: vec![
                ScriptLine::user("My upper stomach burns after meals, mostly at night."),
                ScriptLine::assistant(
                    "Thank you for describing that. Does the burning improve with antacids, \
                     and have you noticed black stools or vomiting?",
                ),
                ScriptLine::user("Antacids help a bit. Nothing like black stools."),
                ScriptLine::referral(
                    "This sounds like acid reflux or gastritis. A gastroenterology review \
                     would help, and until then please avoid late, spicy meals and caffeine.",
                    Referral {
                        kind: "Gastroenterology Consultation".into(),
                        specialty: "Digestive Health".into(),
                        slot: "Friday, 2:15 PM".into(),
                    },
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_scenarios_are_well_formed() {
        let scenarios = builtin_scenarios();
        assert!(!scenarios.is_empty());
        for scenario in &scenarios {
            assert!(!scenario.lines.is_empty(), "{} has no lines", scenario.id);
            // Scripts open with the patient speaking and close with the
            // assistant's referral.
            assert_eq!(scenario.lines.first().unwrap().role, Role::User);
            let last = scenario.lines.last().unwrap();
            assert_eq!(last.role, Role::Assistant);
            assert!(last.referral.is_some(), "{} has no referral", scenario.id);
        }
    }

    #[test]
    fn test_scenario_ids_are_unique() {
        let scenarios = builtin_scenarios();
        let mut ids: Vec<_> = scenarios.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), scenarios.len());
    }
}
