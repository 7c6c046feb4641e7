//! Walks a full conversation through the classifier and assembler, turn by turn, the way the
//! gateway does it: the caller resends the whole history each time.

use liveindus_core::{assemble, classify, Message, Phase, PromptStrategy};

/// Appends one exchange and returns the phase the user's message was classified under.
fn exchange(history: &mut Vec<Message>, user: &str, assistant: &str) -> Phase {
    let phase = classify(history, user).phase;
    history.push(Message::user(user));
    history.push(Message::assistant(assistant));
    phase
}

#[test]
fn guided_conversation_reaches_one_on_one_offer() {
    let mut history = Vec::new();

    assert_eq!(
        exchange(&mut history, "Hi", "Hello, what's on your mind today?"),
        Phase::FirstMessage
    );
    assert_eq!(
        exchange(
            &mut history,
            "My teenage son barely talks to me anymore",
            "How long has he been distant?"
        ),
        Phase::Understanding
    );
    assert_eq!(
        exchange(
            &mut history,
            "Since he started high school last year",
            "How do you feel when he shuts you out?"
        ),
        Phase::Understanding
    );
    assert_eq!(
        exchange(
            &mut history,
            "Honestly I feel rejected and I lose my temper",
            "It sounds like you feel rejected by your son and it makes you angry. Does that sound right?"
        ),
        Phase::Synthesis
    );
    assert_eq!(
        exchange(
            &mut history,
            "yes",
            "When you feel anger rising, a slow breathing practice might help you stay patient."
        ),
        Phase::Guidance
    );
    assert_eq!(
        exchange(
            &mut history,
            "I can give that a go next time we argue",
            "That's a good start. Notice how your body feels before you respond."
        ),
        Phase::ContinueConversation
    );
    // Guidance given and six user turns in the history.
    assert_eq!(
        classify(&history, "I still worry about where this is heading").phase,
        Phase::OfferOneOnOne
    );
}

#[test]
fn clarification_after_synthesis_keeps_understanding() {
    let history = vec![
        Message::user("I feel overwhelmed"),
        Message::assistant("What is taking most of your energy?"),
        Message::user("Work and my parents"),
        Message::assistant("Tell me about your parents."),
        Message::user("They are getting older and need more care"),
        Message::assistant("It seems you are carrying a lot. Am I understanding you?"),
    ];
    let phase = classify(
        &history,
        "I don't think that's quite right, let me explain further",
    )
    .phase;
    assert_eq!(phase, Phase::ContinueUnderstanding);

    let prompt = assemble(
        PromptStrategy::Smart,
        &history,
        "I don't think that's quite right, let me explain further",
    );
    assert!(prompt.text.contains("CONTINUE_UNDERSTANDING:"));
    assert!(prompt
        .text
        .contains("assistant: It seems you are carrying a lot. Am I understanding you?\n"));
}

#[test]
fn long_conversation_without_offer_gets_one() {
    let mut history = Vec::new();
    for i in 0..8 {
        history.push(Message::user(format!("Still thinking about point {}", i)));
        history.push(Message::assistant("Go on."));
    }
    let prompt = assemble(PromptStrategy::Smart, &history, "There is more to say");
    assert_eq!(
        prompt.decision.map(|d| d.phase),
        Some(Phase::OfferOneOnOne)
    );
    assert!(prompt.text.contains("OFFER_ONE_ON_ONE:"));
}

#[test]
fn non_phase_strategies_skip_classification() {
    for strategy in PromptStrategy::ALL {
        let prompt = assemble(strategy, &[], "Hi");
        assert_eq!(prompt.decision.is_some(), strategy == PromptStrategy::Smart);
    }
}
