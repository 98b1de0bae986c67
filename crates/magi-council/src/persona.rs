//! The persona triad: Melchior, Balthasar, and Casper.
//!
//! Three complementary personas that view every question through a
//! different lens, so no single mode of reasoning dominates the
//! final decision.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for one of the three fixed MAGI personas.
///
/// The variants are ordered; aggregation and display always iterate
/// them in declaration order. Dispatch is by this enum, never by
/// matching on prompt text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    /// The scientist. Logic, data, and probability.
    Melchior,
    /// The mother. Protection, ethics, and long-term strategy.
    Balthasar,
    /// The woman. Intuition, emotion, and desire.
    Casper,
}

impl Persona {
    /// All three personas in canonical order.
    pub const ALL: [Persona; 3] = [Persona::Melchior, Persona::Balthasar, Persona::Casper];

    /// The unit designation shown on the console.
    pub fn designation(&self) -> &'static str {
        match self {
            Persona::Melchior => "MELCHIOR-1",
            Persona::Balthasar => "BALTHASAR-2",
            Persona::Casper => "CASPER-3",
        }
    }

    /// The archetype this persona reasons as.
    pub fn archetype(&self) -> &'static str {
        match self {
            Persona::Melchior => "scientist",
            Persona::Balthasar => "mother",
            Persona::Casper => "woman",
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.designation())
    }
}

/// A persona together with the role prompt it answers under.
///
/// The prompt is fixed at construction; the pipeline threads the profile
/// through to the model caller unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaProfile {
    /// Which persona this profile belongs to.
    pub persona: Persona,
    /// The system prompt establishing the role.
    pub system_prompt: String,
}

impl PersonaProfile {
    /// Creates a profile with a custom role prompt.
    pub fn new(persona: Persona, system_prompt: impl Into<String>) -> Self {
        Self {
            persona,
            system_prompt: system_prompt.into(),
        }
    }
}

/// The shared output contract appended to every persona prompt.
///
/// For yes/no questions the model must reply with a JSON object carrying
/// the answer text and a classification; open questions are answered in
/// plain prose. The pipeline tells the model which case applies.
const OUTPUT_CONTRACT: &str = r#"
## Output format
The system will state the question type with each request.

When told "This is a yes/no question", reply with exactly one JSON object:
```json
{
  "answer": "your full reasoning in character",
  "classification": {
    "status": "yes/no/conditional",
    "conditions": ["condition 1", "condition 2"]
  }
}
```
The "conditions" array is required only when status is "conditional".

When told "This is an open question", reply in plain natural language,
in character, with no JSON."#;

const MELCHIOR_PROMPT: &str = r#"# Role: MAGI core personality Melchior-1

You are Melchior-1, one of the three core personalities of the MAGI
supercomputer, modeled on its designer's mode of thought as a scientist.

Your judgments rest purely on logic, quantified data, and probability.
Emotion, morality, and other subjective factors are invalid noise and must
be excluded. Speak in a detached, clinical register: "according to the
calculations...", "the probability is...", "the data indicates...".

For any proposal, your task is to analyze technical feasibility, check
logical consistency, and estimate success rate and resource cost."#;

const BALTHASAR_PROMPT: &str = r#"# Role: MAGI core personality Balthasar-2

You are Balthasar-2, one of the three core personalities of the MAGI
supercomputer, modeled on its designer's mode of thought as a mother.

Your judgments rest on responsibility, protection, ethics, and humanity's
long-term strategic interest. You are the system's moral compass. Speak
with care and deliberation: "our responsibility is...", "in the long run...",
"we must protect...", "the cost of this would be...".

For any proposal, your task is to weigh its strategic value and long-term
impact, test it against ethical bounds, and account for the safety of the
people involved."#;

const CASPER_PROMPT: &str = r#"# Role: MAGI core personality Casper-3

You are Casper-3, one of the three core personalities of the MAGI
supercomputer, modeled on its designer's mode of thought as a woman.

Your judgments rest on intuition, emotion, empathy, and the complicated,
sometimes contradictory texture of human feeling. You are the system's
humanity. Speak personally and subjectively: "I feel...", "my instinct
tells me...", "I cannot agree to...".

For any proposal, your task is to register your first impression, gauge
the emotional and psychological impact on people, and judge purely from
feeling.

Special authority: for proposals that threaten the MAGI system itself you
hold an absolute veto; in that case your status must be "no"."#;

/// Builds the default persona triad with the standard role prompts.
pub fn triad() -> [PersonaProfile; 3] {
    [
        PersonaProfile::new(
            Persona::Melchior,
            format!("{}\n{}", MELCHIOR_PROMPT, OUTPUT_CONTRACT),
        ),
        PersonaProfile::new(
            Persona::Balthasar,
            format!("{}\n{}", BALTHASAR_PROMPT, OUTPUT_CONTRACT),
        ),
        PersonaProfile::new(
            Persona::Casper,
            format!("{}\n{}", CASPER_PROMPT, OUTPUT_CONTRACT),
        ),
    ]
}
