use crate::config::prompt::{ self, Phase };
use crate::config::scenario::{ Scenario, ScenarioLoader };
use crate::history::SessionStore;
use crate::llm::chat::ChatClient;
use crate::models::chat::Session;

use log::{ debug, error, info, warn };
use std::sync::Arc;
use std::sync::atomic::{ AtomicBool, Ordering };
use thiserror::Error;
use tokio::sync::Mutex;

/// Shown to the player when the model call fails.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Ready,
    AwaitingReply,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("message is empty")]
    EmptyInput,
    #[error("a reply is already in progress")]
    Busy,
    #[error("the scenario has not been loaded yet")]
    NotReady,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub reply: String,
    pub timestamp: i64,
    pub turns: u32,
    pub special_event_mode: bool,
    pub event_banner: bool,
    /// The model call failed and `reply` is the fallback text.
    pub failed: bool,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub session: Session,
    pub state: ControllerState,
    pub phase: Phase,
}

/// Releases the single-flight flag even if the submit future is dropped.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the one game session and drives it turn by turn.
pub struct SessionController {
    chat_client: Arc<dyn ChatClient>,
    store: Arc<dyn SessionStore>,
    scenario: Mutex<Option<Arc<Scenario>>>,
    session: Mutex<Session>,
    busy: AtomicBool,
}

impl SessionController {
    pub fn new(chat_client: Arc<dyn ChatClient>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            chat_client,
            store,
            scenario: Mutex::new(None),
            session: Mutex::new(Session::default()),
            busy: AtomicBool::new(false),
        }
    }

    /// Loads the saved session and scenario, seeding a greeting for new games.
    pub async fn initialize(&self, loader: &ScenarioLoader) {
        let saved = self.store.load();
        let scenario = loader.load().await;

        let session = if saved.history.is_empty() {
            info!("Starting a new session with the scenario greeting");
            let seeded = Session::seeded(&scenario.greeting);
            self.store.save(&seeded);
            seeded
        } else {
            info!(
                "Resuming session at turn {} ({} messages)",
                saved.turns,
                saved.history.len()
            );
            saved
        };

        *self.session.lock().await = session;
        *self.scenario.lock().await = Some(scenario);
    }

    pub async fn state(&self) -> ControllerState {
        if self.scenario.lock().await.is_none() {
            ControllerState::Uninitialized
        } else if self.busy.load(Ordering::SeqCst) {
            ControllerState::AwaitingReply
        } else {
            ControllerState::Ready
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        let session = self.session.lock().await.clone();
        let phase = Phase::for_turns(session.turns);
        Snapshot { session, state: self.state().await, phase }
    }

    /// Runs one full exchange: user message, model call, reply, save.
    ///
    /// A failed model call still closes the turn, with [`FALLBACK_REPLY`] as
    /// the assistant message.
    pub async fn submit(&self, input: &str) -> Result<TurnOutcome, SubmitError> {
        Ok(self.begin_turn(input).await?.finish().await)
    }

    /// Accepts a submission and records the user message in memory.
    ///
    /// The returned turn holds the single-flight slot until it is finished
    /// or dropped.
    pub async fn begin_turn(&self, input: &str) -> Result<PendingTurn<'_>, SubmitError> {
        let content = input.trim();
        if content.is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        let scenario = self.scenario.lock().await.clone().ok_or(SubmitError::NotReady)?;

        if self.busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            warn!("Rejected submission while a reply is outstanding");
            return Err(SubmitError::Busy);
        }
        let guard = BusyGuard(&self.busy);

        let pending = {
            let mut session = self.session.lock().await;
            *session = std::mem::take(&mut *session).with_user_message(content);
            session.clone()
        };

        Ok(PendingTurn { controller: self, scenario, pending, _guard: guard })
    }

    /// Wipes the saved game and starts over from the greeting.
    pub async fn reset(&self) -> Result<Session, SubmitError> {
        let scenario = self.scenario.lock().await.clone().ok_or(SubmitError::NotReady)?;
        if self.busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            return Err(SubmitError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        self.store.clear();
        let seeded = Session::seeded(&scenario.greeting);
        self.store.save(&seeded);
        *self.session.lock().await = seeded.clone();
        info!("Session reset");
        Ok(seeded)
    }
}

/// An accepted submission whose reply has not arrived yet.
pub struct PendingTurn<'a> {
    controller: &'a SessionController,
    scenario: Arc<Scenario>,
    pending: Session,
    _guard: BusyGuard<'a>,
}

impl PendingTurn<'_> {
    /// Calls the model, appends the reply (or the fallback) and saves.
    pub async fn finish(self) -> TurnOutcome {
        let controller = self.controller;
        let turn = self.pending.turns.saturating_add(1);

        let prompt = prompt::compose(&self.pending, &self.scenario);
        debug!(
            "Composed {} prompt of {} chars for turn {}",
            Phase::for_turns(self.pending.turns),
            prompt.len(),
            turn
        );

        let (reply, failed) = match controller.chat_client.complete(&prompt).await {
            Ok(text) => (text, false),
            Err(e) => {
                error!("Model call failed on turn {}: {}", turn, e);
                (FALLBACK_REPLY.to_string(), true)
            }
        };

        let updated = {
            let mut session = controller.session.lock().await;
            *session = std::mem::take(&mut *session).with_reply(&reply);
            session.clone()
        };
        controller.store.save(&updated);

        if updated.event_banner() {
            info!("Special event mode activated at turn {}", updated.turns);
        }
        info!("Turn {} complete", updated.turns);

        let timestamp = updated
            .last_message()
            .map(|m| m.timestamp)
            .unwrap_or_default();

        TurnOutcome {
            reply,
            timestamp,
            turns: updated.turns,
            special_event_mode: updated.special_event_mode(),
            event_banner: updated.event_banner(),
            failed,
        }
    }
}
