//! Conversation phase classifier.
//!
//! Decides which instruction phase to inject into the outbound prompt from the caller-supplied
//! history and the current message. Keyword and length heuristics only; every call recomputes
//! from its inputs, so identical inputs always yield the same phase.

use crate::message::Message;
use serde::Serialize;

/// Assistant phrasing that paraphrases the user's situation back for confirmation.
const SYNTHESIS_MARKERS: &[&str] = &[
    "sounds like",
    "it seems",
    "what you're going through",
    "does that sound right",
    "am i understanding",
];

/// Assistant phrasing that suggests a practice has already been offered.
const GUIDANCE_MARKERS: &[&str] = &["breath", "practice", "technique", "try", "might help"];

const FRUSTRATION_MARKERS: &[&str] = &[
    "useless",
    "not helping",
    "doesn't help",
    "not working",
    "waste",
];

const HELP_REQUEST_MARKERS: &[&str] = &["can you help", "help me", "need help", "what to do"];

const ONE_ON_ONE_MARKERS: &[&str] = &["one-on-one", "speak with a guru", "call"];

const CONFIRMATION_MARKERS: &[&str] = &["yes", "right", "correct", "that's it", "exactly"];

/// Replies shorter than this many characters are read as confirmations.
const SHORT_REPLY_CHARS: usize = 15;

/// Whole words that cancel a confirmation keyword following them ("that's not right").
const NEGATION_WORDS: &[&str] = &["no", "not", "never", "nope"];

/// Punctuation that ends the reach of a negation.
const CLAUSE_BREAKS: &[char] = &['.', ',', ';', ':', '!', '?'];

const SYNTHESIS_TURNS: std::ops::RangeInclusive<usize> = 3..=4;
const UNDERSTANDING_TURNS_BELOW: usize = 3;
const OFFER_AFTER_GUIDANCE_TURNS: usize = 6;
const OFFER_ON_HELP_REQUEST_TURNS: usize = 5;
const OFFER_UNCONDITIONAL_TURNS: usize = 8;

fn contains_any(lowered: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| lowered.contains(m))
}

fn is_negation(word: &str) -> bool {
    NEGATION_WORDS.contains(&word) || word.ends_with("n't") || word.ends_with("n\u{2019}t")
}

/// Byte offset of the first negation word in `clause`, if any.
fn first_negation(clause: &str) -> Option<usize> {
    let is_word_char = |c: char| c.is_alphanumeric() || c == '\'' || c == '\u{2019}';
    let mut start = None;
    for (i, c) in clause.char_indices().chain(std::iter::once((clause.len(), ' '))) {
        if is_word_char(c) {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            if is_negation(&clause[s..i]) {
                return Some(s);
            }
        }
    }
    None
}

/// A confirmation keyword counts unless a negation comes before it in the same clause, so
/// "yes, I don't know" confirms while "I don't think that's right" does not.
fn affirms(lowered: &str) -> bool {
    lowered.split(CLAUSE_BREAKS).any(|clause| {
        let limit = first_negation(clause).unwrap_or(clause.len());
        CONFIRMATION_MARKERS
            .iter()
            .any(|m| clause.match_indices(m).any(|(i, _)| i < limit))
    })
}

fn any_assistant_contains(history: &[Message], markers: &[&str]) -> bool {
    history
        .iter()
        .filter(|m| m.is_assistant())
        .any(|m| contains_any(&m.content.to_lowercase(), markers))
}

/// Where the conversation stands; drives the instruction injected into the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    FirstMessage,
    Understanding,
    Synthesis,
    ContinueUnderstanding,
    Guidance,
    OfferOneOnOne,
    ContinueConversation,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::FirstMessage,
        Phase::Understanding,
        Phase::Synthesis,
        Phase::ContinueUnderstanding,
        Phase::Guidance,
        Phase::OfferOneOnOne,
        Phase::ContinueConversation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::FirstMessage => "FIRST_MESSAGE",
            Phase::Understanding => "UNDERSTANDING_PHASE",
            Phase::Synthesis => "SYNTHESIS_PHASE",
            Phase::ContinueUnderstanding => "CONTINUE_UNDERSTANDING",
            Phase::Guidance => "GUIDANCE_PHASE",
            Phase::OfferOneOnOne => "OFFER_ONE_ON_ONE",
            Phase::ContinueConversation => "CONTINUE_CONVERSATION",
        }
    }

    /// Instruction text for this phase. `user_turns` is only used by the synthesis phase,
    /// which tells the model how many exchanges it has had.
    pub fn instruction(&self, user_turns: usize) -> String {
        let body = match self {
            Phase::FirstMessage => "Give a warm, welcoming greeting that invites them to share what's on their mind. Keep it simple and natural.".to_string(),
            Phase::OfferOneOnOne => "The user needs deeper support. Offer a one-on-one call with a guru naturally. Acknowledge their struggle briefly, then offer: \"Would it help to speak one-on-one with a guru who can provide more personalized guidance for what you're going through?\" Keep it natural and caring, not salesy.".to_string(),
            Phase::Synthesis => format!(
                "You've had {} exchanges. Now synthesize what you understand about their situation and emotional state. Present it back to them in a natural way, like: \"It sounds like you're [feeling/experiencing X] because [situation Y]. You're worried about [concern Z]. Does that sound right?\" Keep it concise (2-3 sentences) and wait for their confirmation before offering guidance.",
                user_turns
            ),
            Phase::Guidance => "User has confirmed your understanding. Now offer practical help - suggest relevant ancient practices, techniques, or perspectives that relate to their situation. For example, if they're stressed/anxious about their teenager, mention calming practices, breathwork, or ways to stay patient. If it's about worry for the future, mention practices for managing anxiety. Keep it practical and natural - 2-4 sentences. Don't use jargon.".to_string(),
            Phase::ContinueUnderstanding => "User is clarifying or adding more context after your synthesis. Continue to understand their situation naturally.".to_string(),
            Phase::Understanding => "Ask natural follow-up questions to understand their situation. Keep questions simple and direct. Match their communication style. One question at a time.".to_string(),
            Phase::ContinueConversation => "Continue the conversation naturally. Be empathetic and supportive.".to_string(),
        };
        format!("{}: {}", self.label(), body)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Every heuristic signal the decision order consults, computed once per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversationSignals {
    pub is_first_message: bool,
    pub user_turns: usize,
    /// The last history entry is an assistant message that reads as a synthesis.
    pub last_was_synthesis: bool,
    pub guidance_offered: bool,
    pub frustrated: bool,
    pub asking_for_help: bool,
    pub one_on_one_offered: bool,
    /// The current message is short, or carries an affirmative keyword not negated in its clause.
    pub confirming: bool,
}

impl ConversationSignals {
    pub fn detect(history: &[Message], message: &str) -> Self {
        let current = message.to_lowercase();
        let last_was_synthesis = history
            .last()
            .filter(|m| m.is_assistant())
            .map(|m| contains_any(&m.content.to_lowercase(), SYNTHESIS_MARKERS))
            .unwrap_or(false);

        Self {
            is_first_message: history.is_empty(),
            user_turns: history.iter().filter(|m| m.is_user()).count(),
            last_was_synthesis,
            guidance_offered: any_assistant_contains(history, GUIDANCE_MARKERS),
            frustrated: contains_any(&current, FRUSTRATION_MARKERS),
            asking_for_help: contains_any(&current, HELP_REQUEST_MARKERS),
            one_on_one_offered: any_assistant_contains(history, ONE_ON_ONE_MARKERS),
            confirming: affirms(&current) || current.chars().count() < SHORT_REPLY_CHARS,
        }
    }

    pub fn should_offer_one_on_one(&self) -> bool {
        !self.one_on_one_offered
            && ((self.guidance_offered && self.user_turns >= OFFER_AFTER_GUIDANCE_TURNS)
                || (self.frustrated && self.guidance_offered)
                || (self.asking_for_help && self.user_turns >= OFFER_ON_HELP_REQUEST_TURNS)
                || self.user_turns >= OFFER_UNCONDITIONAL_TURNS)
    }

    pub fn should_synthesize(&self) -> bool {
        SYNTHESIS_TURNS.contains(&self.user_turns) && !self.last_was_synthesis
    }

    /// Applies the decision order; first match wins.
    pub fn phase(&self) -> Phase {
        if self.is_first_message {
            Phase::FirstMessage
        } else if self.should_offer_one_on_one() {
            Phase::OfferOneOnOne
        } else if self.should_synthesize() {
            Phase::Synthesis
        } else if self.last_was_synthesis {
            if self.confirming {
                Phase::Guidance
            } else {
                Phase::ContinueUnderstanding
            }
        } else if self.user_turns < UNDERSTANDING_TURNS_BELOW {
            Phase::Understanding
        } else {
            Phase::ContinueConversation
        }
    }
}

/// Classifier output: the phase plus the signals it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseDecision {
    pub phase: Phase,
    pub signals: ConversationSignals,
}

impl PhaseDecision {
    pub fn instruction(&self) -> String {
        self.phase.instruction(self.signals.user_turns)
    }
}

/// Classifies the conversation from `(history, message)`.
pub fn classify(history: &[Message], message: &str) -> PhaseDecision {
    let signals = ConversationSignals::detect(history, message);
    PhaseDecision {
        phase: signals.phase(),
        signals,
    }
}
