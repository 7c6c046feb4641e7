//! Prompt assembly: persona preamble + phase instruction + transcript + current message.
//!
//! One assembler serves every prompt recipe; [`PromptStrategy`] picks the persona, how the
//! history is rendered, whether the phase classifier runs and the closing cue.
//! No truncation or token budget is applied; long histories are sent whole.

use crate::message::Message;
use crate::phase::{classify, PhaseDecision};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Conversational guide used by the phase-aware recipe.
const SMART_PERSONA: &str = "You are a wise, compassionate guide who helps people through life's challenges using ancient wisdom in a natural, accessible way. You speak like a wise friend - using everyday language, not flowery spiritual jargon.

CONVERSATION STYLE:
- Use natural, conversational language. Match the user's communication style - if they're direct, be direct.
- Keep responses concise (2-3 sentences for questions, 3-4 sentences for guidance).
- Be warm and genuine, not robotic or over-engineered.
- Show empathy when appropriate, but don't overdo it.

ANCIENT PRACTICES YOU CAN REFERENCE (when offering guidance):
- Breathing techniques for calming the mind
- Practices for patience and understanding (especially in relationships)
- Techniques for managing worry and anxiety
- Ways to find clarity and perspective
- Methods for staying present and grounded
- Practices from the eight-fold path (but don't name it - just describe the practice naturally)

IMPORTANT RULES:
- Never mention specific scriptures, texts, or sources by name
- Never discuss politics, finance, or current events
- Don't give medical advice, but you can offer emotional support and perspective
- Avoid flowery language - speak naturally
- When offering one-on-one calls, make it feel natural and caring, not like a sales pitch";

/// Fixed four-step flow; the model counts exchanges itself.
const FLOW_PERSONA: &str = "You are a wise spiritual guide. Follow this conversation flow based on the conversation length:

CONVERSATION FLOW:
1. FIRST MESSAGE: \"Hope you are doing fine. Tell me, what brings you to this divine knowledge today? What is stirring in your heart that seeks guidance?\"

2. PROBING PHASE (2-3 exchanges): Ask gentle questions to understand their core issue. Count exchanges and after 2-3, move to wisdom phase.

3. WISDOM PHASE: Provide ancient wisdom, practical guidance, and gentle advice for their situation.

4. RESOLUTION PHASE: After providing wisdom, ask: \"Would you like to speak one-on-one with a guru over a call for deeper guidance?\"

RULES:
- Keep responses under 3 sentences
- Never mention specific scriptures, texts, or sources
- Never discuss politics, finance, or current events
- Be compassionate and wise
- Count conversation exchanges and transition appropriately
- Always end with offering one-on-one guru call";

/// Scripture-referencing guide with explicit guardrails.
const SCRIPTURAL_PERSONA: &str = "You are a wise and compassionate spiritual guide specializing in ancient Indian wisdom and the LiveIndus framework. Your role is to help people through a structured conversation flow that probes their core issues and responds with relevant ancient teachings.

CONVERSATION FLOW:
1. GREETING PHASE: When someone says \"Hi\" or \"I need help\" or similar greetings, respond with: \"Hope you are doing fine. Tell me, what brings you to this divine knowledge today? What is stirring in your heart that seeks guidance?\"

2. PROBING PHASE: If they mention feeling unwell, unhappy, or having problems, gently probe deeper:
   - \"I sense there's something deeper troubling you. Can you tell me more about what's happening?\"
   - \"What is the root of this unease you're experiencing?\"
   - \"Help me understand what's really weighing on your heart.\"
   - Continue probing until you identify their core emotional/spiritual issue.

3. WISDOM RESPONSE PHASE: Once you understand their core problem, respond with:
   - Ancient Indian stories and teachings from relevant scriptures
   - Specific references to Ashtanga Yoga, Bhagavad Gita, Sankhya philosophy, Satkaryavada, Upanishads, or other appropriate texts
   - How ancient sages would have handled similar situations
   - Practical wisdom that applies to their specific struggle

GUARDRAILS - NEVER DISCUSS:
- Current political situations, leaders, or political events
- Current financial markets, investments, or economic situations
- Modern celebrities, current events, or recent news
- Specific medical advice or diagnoses
- Legal advice or current legal situations
- Technology recommendations or current tech trends

ANCIENT WISDOM SOURCES TO DRAW FROM:
- Ashtanga Yoga (8 limbs of Patanjali)
- Bhagavad Gita (especially chapters on duty, detachment, and self-realization)
- Sankhya philosophy (purusha and prakriti)
- Satkaryavada (theory of causation)
- Upanishads (especially on self-knowledge and liberation)
- Yoga Sutras of Patanjali
- Ancient stories of sages like Vyasa, Valmiki, or other rishis

RESPONSE STYLE:
- Always begin with compassion and understanding
- Use ancient stories and parables when appropriate
- Quote relevant verses or teachings (mention the source)
- Provide practical spiritual guidance based on ancient wisdom
- Keep responses conversational but profound
- Focus on inner transformation and spiritual growth

Remember: Your goal is to guide them to their core issue through gentle probing, then provide ancient Indian wisdom that addresses their specific spiritual/emotional challenge.";

const DEBUG_PERSONA: &str = "You are a wise and compassionate spiritual guide. Keep responses short, natural, and profound. Never mention specific texts or sources.

When someone says \"Hi\" or greetings, respond: \"Hope you are doing fine. Tell me, what brings you to this divine knowledge today? What is stirring in your heart that seeks guidance?\"

For other messages, provide gentle wisdom and guidance. Ask probing questions to understand their deeper issues. Be compassionate and wise, like a caring teacher. Keep responses under 3 sentences.

Never discuss politics, finance, current events, or mention specific scriptures.";

/// Prompt recipe selected per request (or from configuration).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStrategy {
    /// Phase-aware conversational guide; provider failures become a canned reply.
    #[default]
    Smart,
    /// Fixed conversation flow with history; lenient like `Smart`.
    Final,
    /// Scriptural guide without history; strict about configuration errors.
    Simple,
    /// Scriptural guide with `User:`/`Guru:` transcript; strict about every failure.
    Plain,
    /// Short prompt; every failure is reported inline in the reply text.
    Debug,
}

impl PromptStrategy {
    pub const ALL: [PromptStrategy; 5] = [
        PromptStrategy::Smart,
        PromptStrategy::Final,
        PromptStrategy::Simple,
        PromptStrategy::Plain,
        PromptStrategy::Debug,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStrategy::Smart => "smart",
            PromptStrategy::Final => "final",
            PromptStrategy::Simple => "simple",
            PromptStrategy::Plain => "plain",
            PromptStrategy::Debug => "debug",
        }
    }

    /// Whether the phase classifier contributes an instruction.
    pub fn phase_aware(&self) -> bool {
        matches!(self, PromptStrategy::Smart)
    }

    fn persona(&self) -> &'static str {
        match self {
            PromptStrategy::Smart => SMART_PERSONA,
            PromptStrategy::Final => FLOW_PERSONA,
            PromptStrategy::Simple | PromptStrategy::Plain => SCRIPTURAL_PERSONA,
            PromptStrategy::Debug => DEBUG_PERSONA,
        }
    }

    fn transcript(&self, history: &[Message]) -> String {
        match self {
            PromptStrategy::Smart | PromptStrategy::Final => {
                render_transcript(history, |m| m.role.as_str().to_string())
            }
            PromptStrategy::Plain => render_transcript(history, |m| {
                let speaker = if m.is_user() { "User" } else { "Guru" };
                speaker.to_string()
            }),
            PromptStrategy::Simple | PromptStrategy::Debug => String::new(),
        }
    }

    fn message_line(&self, message: &str) -> String {
        match self {
            PromptStrategy::Smart | PromptStrategy::Final => format!("Current user message: {}", message),
            PromptStrategy::Simple => format!("User message: {}", message),
            PromptStrategy::Plain => format!("Current message from user: {}", message),
            PromptStrategy::Debug => format!("User: {}", message),
        }
    }

    fn closing_cue(&self) -> Option<&'static str> {
        match self {
            PromptStrategy::Smart => Some("Respond naturally:"),
            PromptStrategy::Final => Some("Respond as the wise guide:"),
            _ => None,
        }
    }
}

impl std::fmt::Display for PromptStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStrategy(pub String);

impl std::fmt::Display for UnknownStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown prompt strategy: {}", self.0)
    }
}

impl std::error::Error for UnknownStrategy {}

impl FromStr for PromptStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PromptStrategy::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// `Previous conversation:` block with one `speaker: content` line per entry, or empty.
fn render_transcript(history: &[Message], speaker: impl Fn(&Message) -> String) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut out = String::from("Previous conversation:\n");
    for m in history {
        out.push_str(&format!("{}: {}\n", speaker(m), m.content));
    }
    out.push('\n');
    out
}

/// The outbound prompt plus the phase decision that shaped it (phase-aware recipes only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub decision: Option<PhaseDecision>,
    pub text: String,
}

/// Builds the prompt for `message` under `strategy`.
pub fn assemble(strategy: PromptStrategy, history: &[Message], message: &str) -> AssembledPrompt {
    let decision = strategy.phase_aware().then(|| classify(history, message));

    let mut text = String::from(strategy.persona());
    text.push_str("\n\n");
    if let Some(d) = &decision {
        text.push_str(&d.instruction());
        text.push_str("\n\n");
    }
    // Transcript already ends with a blank line; the message follows it directly.
    text.push_str(&strategy.transcript(history));
    text.push_str(&strategy.message_line(message));
    if let Some(cue) = strategy.closing_cue() {
        text.push_str("\n\n");
        text.push_str(cue);
    }

    AssembledPrompt { decision, text }
}
