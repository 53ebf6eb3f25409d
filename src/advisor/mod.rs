//! Flavour-text advisors backed by a generative-text service.
//!
//! - Mixer: mood label -> [`BoilermakerPairing`]
//! - Oracle ("Chicken Sensei"): free-text question -> free-text wisdom
//! - Quiz: five answers -> [`CocktailIdentity`]
//!
//! Everything here except the HTTP transport in [`gemini`] is pure: prompt
//! construction, schema description, reply parsing, fallback lines and the
//! [`RequestGate`] that discards replies for screens the player already left.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{AdvisorError, AdvisorResult};

pub mod gemini;

pub use gemini::GeminiClient;

// --- Catalogues --------------------------------------------------------------

/// Mixer mood buttons: (emoji, label).
pub const MOODS: &[(&str, &str)] = &[
    ("❤️", "In Love"),
    ("🔥", "Spicy"),
    ("🧊", "Chill"),
    ("🎉", "Hype"),
    ("🎷", "Smooth"),
    ("🤔", "Curious"),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub question: &'static str,
    pub options: [&'static str; 4],
}

pub const QUIZ_QUESTIONS: &[QuizQuestion] = &[
    QuizQuestion {
        question: "A stranger drops a gold coin in your drink. You...",
        options: [
            "Down it. Extra minerals!",
            "Call the manager (politely)",
            "Check if it's chocolate",
            "Buy them a drink too",
        ],
    },
    QuizQuestion {
        question: "Your ideal Friday night atmosphere is...",
        options: [
            "Neon chaos & K-Pop",
            "Dim lights & Jazz",
            "Tropical beach fire",
            "Cozy blanket & Dalgona",
        ],
    },
    QuizQuestion {
        question: "If you were a garnish, which one would you be?",
        options: [
            "A spicy chili",
            "A classy gold leaf",
            "A funky umbrella",
            "A salty olive",
        ],
    },
    QuizQuestion {
        question: "You're handed a mysterious key at the door. It opens...",
        options: [
            "The velvet ropes to VIP",
            "A locked vintage fridge",
            "The DJ booth",
            "The secret rooftop garden",
        ],
    },
    QuizQuestion {
        question: "The last song of the night starts playing. It's...",
        options: [
            "A high-energy K-Pop anthem",
            "A smooth R&B slow jam",
            "A funky disco track",
            "A classic power ballad",
        ],
    },
];

/// Signature cocktails the quiz may land on.
pub const SIGNATURE_COCKTAILS: &[&str] = &[
    "Iced SoMaek",
    "Cheng & Tonic",
    "Honey Maksky Sour",
    "Perilla Smash",
    "Bokbunja POP",
    "Hallabong Bellini",
    "Banana Makgeoli Colada",
    "Ice Dalgona Coffee",
    "Buldak Penicillin",
    "K-Town Manhattan",
    "BOP Martini (Filthy Martini)",
    "Honey Butter Godfather",
];

pub const ORACLE_GREETING: &str = "Bawk bawk! I am the Great Chicken Sensei. What weighs on your mind while you wait for the deep fryer?";

// --- Reply shapes ------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoilermakerPairing {
    pub combo_name: String,
    pub beer: String,
    pub whiskey: String,
    pub description: String,
    pub pairing_tip: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CocktailIdentity {
    pub cocktail_name: String,
    pub description: String,
    pub personality: String,
    pub spirit_animal: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvisorKind {
    Mixer,
    Oracle,
    Quiz,
}

/// What the view receives: the reply, or a scripted in-character line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum AdvisorReply<T> {
    Ok(T),
    Fallback(&'static str),
}

impl<T> AdvisorReply<T> {
    pub fn from_result(kind: AdvisorKind, result: AdvisorResult<T>) -> Self {
        match result {
            Ok(value) => AdvisorReply::Ok(value),
            Err(err) => {
                tracing::warn!(?kind, error = %err, "advisor failed, using fallback");
                AdvisorReply::Fallback(fallback_line(kind, &err))
            }
        }
    }
}

/// Scripted reply for a failed advisor call.
pub fn fallback_line(kind: AdvisorKind, err: &AdvisorError) -> &'static str {
    match (kind, err) {
        (AdvisorKind::Oracle, AdvisorError::EmptyReply) => "The fryer is calling me, ask later!",
        (AdvisorKind::Oracle, _) => {
            "Technical errors are like burnt wings, best avoided. Ask again!"
        }
        (AdvisorKind::Mixer, _) => "The taps got tangled. Pick your vibe again!",
        (AdvisorKind::Quiz, _) => "The shaker slipped! Take the quiz again to find your match.",
    }
}

// --- Prompts -----------------------------------------------------------------

/// One request to the text service.
#[derive(Clone, Debug, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub system: Option<&'static str>,
    /// JSON response schema; `None` for free text.
    pub schema: Option<Value>,
}

fn string_object_schema(fields: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = fields
        .iter()
        .map(|f| ((*f).to_string(), json!({ "type": "STRING" })))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": fields,
    })
}

pub fn boilermaker_prompt(mood: &str) -> Prompt {
    Prompt {
        text: format!(
            "Suggest a perfect Boilermaker (Beer + Whiskey shot pairing) for someone feeling \"{mood}\". \
             The bar is named B.O.P (Bartender of Pony). Give a creative name for the combo, \
             explain why they match, and describe the flavor profile."
        ),
        system: None,
        schema: Some(string_object_schema(&[
            "comboName",
            "beer",
            "whiskey",
            "description",
            "pairingTip",
        ])),
    }
}

pub fn wisdom_prompt(question: &str) -> Prompt {
    Prompt {
        text: format!(
            "You are \"Chicken Sensei\", the wise mascot of B.O.P (Bartender of Pony) bar. \
             A customer is waiting for a table and asks: \"{question}\". \
             Provide a short, funny, and slightly philosophical answer using fried chicken or beer metaphors."
        ),
        system: Some(
            "You are a humorous and wise bar mascot who speaks in fried chicken puns and beer wisdom.",
        ),
        schema: None,
    }
}

pub fn cocktail_prompt(answers: &[String]) -> Prompt {
    let options = SIGNATURE_COCKTAILS
        .iter()
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(", ");
    Prompt {
        text: format!(
            "Based on these personality answers: [{}], determine which B.O.P (Bartender of Pony) \
             Signature Cocktail matches the user's soul. Options: {options}. \
             Provide a witty description of why they are this cocktail, their 'drinking personality', \
             and a 'spirit animal' that matches the drink's vibe.",
            answers.join(", ")
        ),
        system: None,
        schema: Some(string_object_schema(&[
            "cocktailName",
            "description",
            "personality",
            "spiritAnimal",
        ])),
    }
}

// --- Reply parsing -----------------------------------------------------------

pub fn parse_pairing(text: &str) -> AdvisorResult<BoilermakerPairing> {
    Ok(serde_json::from_str(text.trim())?)
}

pub fn parse_identity(text: &str) -> AdvisorResult<CocktailIdentity> {
    Ok(serde_json::from_str(text.trim())?)
}

pub fn parse_wisdom(text: &str) -> AdvisorResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AdvisorError::EmptyReply);
    }
    Ok(trimmed.to_string())
}

// --- Supersession ------------------------------------------------------------

/// Identifies one in-flight advisor request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

/// Only the newest request's reply is delivered. Leaving an advisor screen
/// supersedes whatever is still in flight.
#[derive(Debug, Default)]
pub struct RequestGate {
    generation: u64,
}

impl RequestGate {
    pub fn issue(&mut self) -> Ticket {
        self.generation += 1;
        Ticket(self.generation)
    }

    pub fn supersede(&mut self) {
        self.generation += 1;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }
}

// --- Quiz flow ---------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuizStep {
    /// Show the question at this index next.
    Next(usize),
    /// All questions answered, in order.
    Complete(Vec<String>),
}

#[derive(Debug, Default, Clone)]
pub struct QuizProgress {
    answers: Vec<String>,
}

impl QuizProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the question currently on screen.
    pub fn current(&self) -> usize {
        self.answers.len()
    }

    /// Answer the current question with option `choice`. Invalid choices, or
    /// answers after completion, are ignored.
    pub fn answer(&mut self, choice: usize) -> Option<QuizStep> {
        let question = QUIZ_QUESTIONS.get(self.answers.len())?;
        let option = question.options.get(choice)?;
        self.answers.push((*option).to_string());
        if self.answers.len() < QUIZ_QUESTIONS.len() {
            Some(QuizStep::Next(self.answers.len()))
        } else {
            Some(QuizStep::Complete(self.answers.clone()))
        }
    }

    pub fn reset(&mut self) {
        self.answers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing_parses_camel_case_and_requires_all_fields() {
        let ok = r#"{"comboName":"Velvet Pony","beer":"Cass","whiskey":"Jameson","description":"Smooth.","pairingTip":"Drop it fast."}"#;
        let pairing = parse_pairing(ok).unwrap();
        assert_eq!(pairing.combo_name, "Velvet Pony");
        assert_eq!(pairing.pairing_tip, "Drop it fast.");

        let missing = r#"{"comboName":"x","beer":"y","whiskey":"z","description":"d"}"#;
        assert!(matches!(parse_pairing(missing), Err(AdvisorError::Malformed(_))));
    }

    #[test]
    fn test_identity_parse_tolerates_whitespace() {
        let raw = "\n {\"cocktailName\":\"Perilla Smash\",\"description\":\"d\",\"personality\":\"p\",\"spiritAnimal\":\"otter\"} \n";
        assert_eq!(parse_identity(raw).unwrap().spirit_animal, "otter");
        assert!(parse_identity("not json").is_err());
    }

    #[test]
    fn test_blank_wisdom_is_an_empty_reply() {
        assert!(matches!(parse_wisdom("   "), Err(AdvisorError::EmptyReply)));
        assert_eq!(parse_wisdom(" Fry first. ").unwrap(), "Fry first.");
    }

    #[test]
    fn test_fallbacks_stay_in_character() {
        let empty = fallback_line(AdvisorKind::Oracle, &AdvisorError::EmptyReply);
        let net = fallback_line(AdvisorKind::Oracle, &AdvisorError::Transport("offline".into()));
        assert_ne!(empty, net);
        let reply: AdvisorReply<String> =
            AdvisorReply::from_result(AdvisorKind::Mixer, Err(AdvisorError::Status { status: 503 }));
        assert!(matches!(reply, AdvisorReply::Fallback(_)));
    }

    #[test]
    fn test_reply_json_shape() {
        let ok: AdvisorReply<String> = AdvisorReply::Ok("hi".into());
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"status":"ok","data":"hi"}"#);
        let fb: AdvisorReply<String> = AdvisorReply::Fallback("later");
        assert_eq!(
            serde_json::to_string(&fb).unwrap(),
            r#"{"status":"fallback","data":"later"}"#
        );
    }

    #[test]
    fn test_prompts_carry_inputs_and_schemas() {
        let p = boilermaker_prompt("Spicy");
        assert!(p.text.contains("\"Spicy\""));
        let required = p.schema.as_ref().unwrap()["required"].as_array().unwrap().len();
        assert_eq!(required, 5);

        let w = wisdom_prompt("Is the wait long?");
        assert!(w.schema.is_none() && w.system.is_some());

        let c = cocktail_prompt(&["a".into(), "b".into()]);
        assert!(c.text.contains("[a, b]"));
        assert!(c.text.contains("'Honey Butter Godfather'"));
        assert_eq!(c.schema.unwrap()["properties"]["spiritAnimal"]["type"], "STRING");
    }

    #[test]
    fn test_gate_only_accepts_latest_ticket() {
        let mut gate = RequestGate::default();
        let first = gate.issue();
        let second = gate.issue();
        assert!(!gate.is_current(first));
        assert!(gate.is_current(second));
        gate.supersede();
        assert!(!gate.is_current(second));
    }

    #[test]
    fn test_quiz_collects_answers_in_order() {
        let mut quiz = QuizProgress::new();
        assert_eq!(quiz.answer(9), None);
        assert_eq!(quiz.current(), 0);
        for i in 0..QUIZ_QUESTIONS.len() - 1 {
            assert_eq!(quiz.answer(i % 4), Some(QuizStep::Next(i + 1)));
        }
        match quiz.answer(3) {
            Some(QuizStep::Complete(answers)) => {
                assert_eq!(answers.len(), 5);
                assert_eq!(answers[0], "Down it. Extra minerals!");
                assert_eq!(answers[4], "A classic power ballad");
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert_eq!(quiz.answer(0), None);
        quiz.reset();
        assert_eq!(quiz.current(), 0);
    }
}
