//! A small trivia agent served by `dialogwire serve` and used by
//! `dialogwire simulate`.
//!
//! It exercises every part of a turn: a keep-around typed context, a
//! short-lived raw context, fallback tracking, templates and the Actions on
//! Google integration with user storage and a permission system intent.

use serde::{Deserialize, Serialize};

use dialogwire_agent::{Agent, ContextRegistration, Conversation};
use dialogwire_config::AppConfig;
use dialogwire_core::{JsonObject, Result};
use dialogwire_integrations::actions_on_google::{self, request::Permission};

pub const WELCOME_INTENT: &str = "Default Welcome Intent";
pub const FALLBACK_INTENT: &str = "Default Fallback Intent";
pub const START_TRIVIA_INTENT: &str = "Start Trivia";
pub const ANSWER_INTENT: &str = "Trivia Answer";
pub const REMEMBER_ME_INTENT: &str = "Remember Me";
pub const WHERE_AM_I_INTENT: &str = "Where Am I";
pub const GOODBYE_INTENT: &str = "Goodbye";

/// Keep-around context holding the score.
pub const GAME_CONTEXT: &str = "trivia_game";

/// Set while a question waits for its answer.
pub const AWAITING_ANSWER_CONTEXT: &str = "awaiting_answer";

const WELCOME_TEXT: &str = "Hi! Want to play a round of trivia?";
const QUESTION: &str = "What is the capital of France?";
const ANSWER: &str = "paris";

/// Fallback turns in a row after which the agent gives up.
const MAX_FALLBACKS: u32 = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriviaGame {
    pub score: u32,
    pub questions_asked: u32,
}

/// Build the demo agent on top of the configured one.
pub fn build_agent(config: &AppConfig) -> Result<Agent> {
    let mut agent = Agent::from_config(config)?;
    if !config.agent.track_fallback_level {
        agent = agent.with_fallback_tracking()?;
    }

    agent.register_context(
        ContextRegistration::typed::<TriviaGame>(GAME_CONTEXT)
            .keep_around()
            .with_typed_default::<TriviaGame>(),
    )?;
    agent.register_context(ContextRegistration::new(AWAITING_ANSWER_CONTEXT))?;

    agent.register_handler(WELCOME_INTENT, welcome)?;
    agent.register_handler(FALLBACK_INTENT, fallback)?;
    agent.register_handler(START_TRIVIA_INTENT, start_trivia)?;
    agent.register_handler(ANSWER_INTENT, answer)?;
    agent.register_handler(REMEMBER_ME_INTENT, remember_me)?;
    agent.register_handler(WHERE_AM_I_INTENT, where_am_i)?;
    agent.register_handler(GOODBYE_INTENT, goodbye)?;

    Ok(agent)
}

fn is_google(conv: &Conversation) -> bool {
    conv.source() == Some(actions_on_google::SOURCE)
}

/// Reply on the generic channel and, on Google, as a simple response too.
fn reply(conv: &mut Conversation, text: &str, end: bool) -> Result<()> {
    if is_google(conv) {
        let google = conv.integrations_mut().google()?;
        if end {
            google.tell([text]);
        } else {
            google.ask([text]);
        }
    }
    if end {
        conv.tell([text]);
    } else {
        conv.ask([text]);
    }
    Ok(())
}

fn welcome(mut conv: Conversation) -> Result<Conversation> {
    let text = conv
        .render_template("welcome", &[])
        .unwrap_or_else(|_| WELCOME_TEXT.to_owned());
    reply(&mut conv, &text, false)?;
    conv.show_quick_replies(None, ["Start trivia", "Bye"]);
    if is_google(&conv) {
        conv.integrations_mut()
            .google()?
            .suggest(["Start trivia", "Bye"]);
    }
    Ok(conv)
}

fn fallback(mut conv: Conversation) -> Result<Conversation> {
    if conv.fallback_level() >= MAX_FALLBACKS {
        reply(&mut conv, "I'm having trouble understanding. Let's try again later.", true)?;
    } else {
        reply(&mut conv, "Sorry, could you say that again?", false)?;
    }
    Ok(conv)
}

fn start_trivia(mut conv: Conversation) -> Result<Conversation> {
    let game = conv
        .contexts_mut()
        .get_typed_mut::<TriviaGame>(GAME_CONTEXT)?;
    game.questions_asked = game.questions_asked.saturating_add(1);

    let mut params = JsonObject::new();
    params.insert("question".into(), QUESTION.into());
    conv.contexts_mut()
        .set(AWAITING_ANSWER_CONTEXT, Some(2), params)?;
    reply(&mut conv, QUESTION, false)?;
    Ok(conv)
}

fn answer(mut conv: Conversation) -> Result<Conversation> {
    if !conv.contexts().has(AWAITING_ANSWER_CONTEXT) {
        reply(&mut conv, "There is no open question. Say \"start trivia\" to get one.", false)?;
        return Ok(conv);
    }

    let correct = conv
        .parameter("answer")
        .and_then(|v| v.as_str())
        .is_some_and(|a| a.trim().eq_ignore_ascii_case(ANSWER));

    let game = conv
        .contexts_mut()
        .get_typed_mut::<TriviaGame>(GAME_CONTEXT)?;
    if correct {
        game.score = game.score.saturating_add(1);
    }
    let score = game.score;
    conv.contexts_mut().delete(AWAITING_ANSWER_CONTEXT)?;

    let verdict = if correct { "Correct!" } else { "Not quite, it's Paris." };
    reply(&mut conv, &format!("{verdict} Your score is {score}."), false)?;
    Ok(conv)
}

fn remember_me(mut conv: Conversation) -> Result<Conversation> {
    if !is_google(&conv) {
        reply(&mut conv, "I can only remember you on Google Assistant.", false)?;
        return Ok(conv);
    }

    let google = conv.integrations_mut().google()?;
    let storage = google.user_mut().user_storage_mut();
    let visits = storage.get("visits").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
    storage.insert("visits".into(), visits.into());

    let text = if visits == 1 {
        "Nice to meet you!".to_owned()
    } else {
        format!("Welcome back! This is visit number {visits}.")
    };
    reply(&mut conv, &text, false)?;
    Ok(conv)
}

fn where_am_i(mut conv: Conversation) -> Result<Conversation> {
    if !is_google(&conv) {
        reply(&mut conv, "I can only ask for your location on Google Assistant.", false)?;
        return Ok(conv);
    }

    conv.integrations_mut()
        .google()?
        .ask_for_permission("To tell you where you are", [Permission::DeviceCoarseLocation])?;
    conv.ask(["PLACEHOLDER_FOR_PERMISSION"]);
    Ok(conv)
}

fn goodbye(mut conv: Conversation) -> Result<Conversation> {
    let score = conv
        .contexts()
        .get_typed::<TriviaGame>(GAME_CONTEXT)
        .map(|g| g.score)
        .unwrap_or(0);
    conv.contexts_mut().delete(GAME_CONTEXT)?;
    reply(&mut conv, &format!("Thanks for playing! Final score: {score}."), true)?;
    Ok(conv)
}
