use crate::config::scenario::Scenario;
use crate::models::chat::{ Role, Session, EVENT_TRIGGER };
use std::fmt;

/// Number of trailing history messages replayed to the model.
pub const MAX_HISTORY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No exchange yet: greeting plus the main rules.
    Opening,
    Main,
    /// From `EVENT_TRIGGER` turns on: main rules plus the event rules.
    SpecialEvent,
}

impl Phase {
    pub fn for_turns(turns: u32) -> Self {
        if turns == 0 {
            Phase::Opening
        } else if turns >= EVENT_TRIGGER {
            Phase::SpecialEvent
        } else {
            Phase::Main
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Opening => write!(f, "opening"),
            Phase::Main => write!(f, "main"),
            Phase::SpecialEvent => write!(f, "special_event"),
        }
    }
}

fn system_context(phase: Phase, scenario: &Scenario) -> String {
    match phase {
        Phase::Opening => format!("{}\n{}", scenario.greeting, scenario.main_rules),
        Phase::Main => scenario.main_rules.clone(),
        Phase::SpecialEvent => format!("{}\n{}", scenario.main_rules, scenario.event_rules),
    }
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "AI",
    }
}

/// Flattens the session into the single text prompt sent to the model.
///
/// The instruction block is chosen by [`Phase::for_turns`], followed by the
/// last [`MAX_HISTORY`] messages. When the newest message is from the user it
/// is repeated as a trailing `User: ...\nAI:` cue.
pub fn compose(session: &Session, scenario: &Scenario) -> String {
    let mut prompt = system_context(Phase::for_turns(session.turns), scenario);
    prompt.push_str("\n\n");

    let start = session.history.len().saturating_sub(MAX_HISTORY);
    for msg in &session.history[start..] {
        prompt.push_str(&format!("{}: {}\n", speaker(msg.role), msg.content));
    }

    if let Some(last) = session.last_message() {
        if last.role == Role::User {
            prompt.push_str(&format!("User: {}\nAI:", last.content));
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ChatMessage;
    use pretty_assertions::assert_eq;

    fn scenario() -> Scenario {
        Scenario {
            greeting: "GREETING".to_string(),
            main_rules: "MAIN".to_string(),
            event_rules: "EVENTS".to_string(),
        }
    }

    fn session_with(turns: u32, history: Vec<ChatMessage>) -> Session {
        Session { history, turns }
    }

    #[test]
    fn test_phase_for_turns() {
        assert_eq!(Phase::for_turns(0), Phase::Opening);
        assert_eq!(Phase::for_turns(1), Phase::Main);
        assert_eq!(Phase::for_turns(49), Phase::Main);
        assert_eq!(Phase::for_turns(50), Phase::SpecialEvent);
        assert_eq!(Phase::for_turns(51), Phase::SpecialEvent);
    }

    #[test]
    fn test_opening_prompt_layout() {
        let session = Session::seeded("Hi there").with_user_message("Hello");
        let prompt = compose(&session, &scenario());
        assert_eq!(prompt, "GREETING\nMAIN\n\nAI: Hi there\nUser: Hello\nUser: Hello\nAI:");
    }

    #[test]
    fn test_opening_excludes_event_rules() {
        let prompt = compose(&Session::seeded("Hi"), &scenario());
        assert!(prompt.contains("GREETING"));
        assert!(!prompt.contains("EVENTS"));
    }

    #[test]
    fn test_main_phase_uses_main_rules_only() {
        let session = session_with(12, vec![ChatMessage::assistant("The road forks.")]);
        let prompt = compose(&session, &scenario());
        assert_eq!(prompt, "MAIN\n\nAI: The road forks.\n");
    }

    #[test]
    fn test_special_event_phase_includes_events_excludes_greeting() {
        for turns in [50, 51, 300] {
            let session = session_with(turns, vec![ChatMessage::user("look around")]);
            let prompt = compose(&session, &scenario());
            assert!(prompt.starts_with("MAIN\nEVENTS\n\n"));
            assert!(!prompt.contains("GREETING"));
        }
    }

    #[test]
    fn test_history_window_is_bounded() {
        let history = (0..45)
            .map(|i| ChatMessage::assistant(format!("line-{:02}", i)))
            .collect();
        let prompt = compose(&session_with(7, history), &scenario());

        let replayed = prompt.lines().filter(|l| l.starts_with("AI: line-")).count();
        assert_eq!(replayed, MAX_HISTORY);
        assert!(!prompt.contains("line-24"));
        assert!(prompt.contains("line-25"));
        assert!(prompt.contains("line-44"));
    }

    #[test]
    fn test_history_keeps_original_order() {
        let session = session_with(3, vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("second"),
            ChatMessage::user("third"),
            ChatMessage::assistant("fourth")
        ]);
        let prompt = compose(&session, &scenario());
        assert_eq!(prompt, "MAIN\n\nUser: first\nAI: second\nUser: third\nAI: fourth\n");
    }

    #[test]
    fn test_empty_history_has_no_cue() {
        let prompt = compose(&Session::default(), &scenario());
        assert_eq!(prompt, "GREETING\nMAIN\n\n");
    }
}
