//! The round controller: a single task owning the state machine of the running match.
//!
//! Every input reaches the controller through one command queue: user events, timer
//! expirations and network completions. The controller applies them to the
//! [`RoundStateMachine`] one at a time, executes the returned effects and publishes a fresh
//! [`RoundSnapshot`] after each accepted transition.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::{
    config::{CueAssets, RoundRules},
    dao::{
        preferences::{PreferenceStore, Preferences},
        quiz::{QuizClient, error::QuizResult, models::SubmitReceipt},
    },
    dto::round::{AnswerRequest, BuzzRequest, EventResponse, RoundSnapshot},
    error::ServiceError,
    services::{
        audio::{AudioCueController, AudioSink},
        input, sse_events,
    },
    state::{
        SharedState, SseHub,
        effects::Effect,
        round::{Player, Quiz},
        state_machine::{AnswerSelection, RoundEvent, RoundStateMachine},
        timers::{TimerHandle, TimerService},
    },
};

/// Collaborators a controller needs for one match.
#[derive(Clone)]
pub struct RoundDeps {
    /// Rules of the match.
    pub rules: RoundRules,
    /// Effect asset URLs.
    pub cues: CueAssets,
    /// Quiz content service.
    pub quiz: Arc<dyn QuizClient>,
    /// Where volume settings are read from.
    pub preferences: Arc<dyn PreferenceStore>,
    /// Playback output.
    pub audio: Arc<dyn AudioSink>,
    /// Renderer stream.
    pub hub: Arc<SseHub>,
}

/// Outcome of a user event.
#[derive(Debug, Clone)]
pub struct EventOutcome {
    /// Whether the event applied to the phase it arrived in.
    pub accepted: bool,
    /// Snapshot right after the event was handled.
    pub snapshot: RoundSnapshot,
}

impl From<EventOutcome> for EventResponse {
    fn from(value: EventOutcome) -> Self {
        Self {
            accepted: value.accepted,
            snapshot: value.snapshot,
        }
    }
}

enum Command {
    Event {
        event: RoundEvent,
        reply: oneshot::Sender<EventOutcome>,
    },
    TimerFired(TimerHandle),
    QuizFetched {
        round: u32,
        result: QuizResult<Quiz>,
    },
    ScoresSubmitted(QuizResult<SubmitReceipt>),
    PreferencesChanged(Preferences),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to the task running a match. Cloning it is cheap.
#[derive(Clone)]
pub struct RoundController {
    match_id: Uuid,
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<RoundSnapshot>,
}

impl RoundController {
    /// Load the preferences, start a new match and request its first round.
    pub async fn spawn(deps: RoundDeps) -> Self {
        let RoundDeps {
            rules,
            cues,
            quiz,
            preferences,
            audio,
            hub,
        } = deps;

        let mut audio = AudioCueController::new(audio, cues);
        match preferences.load().await {
            Ok(loaded) => audio.apply_preferences(loaded),
            Err(err) => warn!(error = %err, "failed to load preferences; using defaults"),
        }

        let machine = RoundStateMachine::new(rules);
        let match_id = machine.state().match_id;
        let (commands, receiver) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) =
            watch::channel(RoundSnapshot::capture(machine.state(), machine.version()));

        let mut worker = RoundWorker {
            machine,
            timers: TimerService::new(),
            audio,
            quiz,
            hub,
            commands: commands.downgrade(),
            snapshots: snapshot_tx,
        };
        worker.dispatch(RoundEvent::Init);
        tokio::spawn(worker.run(receiver));

        info!(%match_id, "match started");
        Self {
            match_id,
            commands,
            snapshots,
        }
    }

    /// Identifier of the match driven by this controller.
    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    /// Feed a user event and wait for it to be handled.
    pub async fn send(&self, event: RoundEvent) -> Result<EventOutcome, ServiceError> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(Command::Event { event, reply })
            .map_err(|_| ServiceError::ControllerClosed)?;
        outcome.await.map_err(|_| ServiceError::ControllerClosed)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> RoundSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<RoundSnapshot> {
        self.snapshots.clone()
    }

    /// Apply new volume settings to the running match.
    pub fn update_preferences(&self, preferences: Preferences) {
        // A stopped controller has nothing left to play.
        let _ = self
            .commands
            .send(Command::PreferencesChanged(preferences));
    }

    /// Stop the controller and wait until it is gone.
    ///
    /// Pending timers are cancelled and the excerpt is silenced. Commands queued before the
    /// shutdown are still handled; nothing is published once this returns.
    pub async fn shutdown(&self) {
        let (done, stopped) = oneshot::channel();
        if self.commands.send(Command::Shutdown(done)).is_ok() {
            let _ = stopped.await;
        }
    }
}

struct RoundWorker {
    machine: RoundStateMachine,
    timers: TimerService,
    audio: AudioCueController,
    quiz: Arc<dyn QuizClient>,
    hub: Arc<SseHub>,
    commands: mpsc::WeakUnboundedSender<Command>,
    snapshots: watch::Sender<RoundSnapshot>,
}

impl RoundWorker {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        let mut stopped = None;
        while let Some(command) = receiver.recv().await {
            match command {
                Command::Event { event, reply } => {
                    let accepted = self.dispatch(event);
                    let _ = reply.send(EventOutcome {
                        accepted,
                        snapshot: self.snapshots.borrow().clone(),
                    });
                }
                Command::TimerFired(handle) => {
                    if !self.timers.is_current(handle) {
                        trace!(timer = %handle.role, generation = handle.generation, "stale timer dropped");
                        continue;
                    }
                    self.timers.complete(handle);
                    self.dispatch(RoundEvent::TimerElapsed(handle.role));
                }
                Command::QuizFetched { round, result } => {
                    let event = match result {
                        Ok(quiz) => RoundEvent::QuizLoaded { round, quiz },
                        Err(err) => {
                            warn!(round, error = %err, "failed to fetch quiz");
                            RoundEvent::QuizFailed {
                                round,
                                reason: err.to_string(),
                            }
                        }
                    };
                    self.dispatch(event);
                }
                Command::ScoresSubmitted(result) => {
                    let event = match result {
                        Ok(receipt) => RoundEvent::ScoresSubmitted {
                            redirect: receipt.redirect,
                        },
                        Err(err) => {
                            warn!(error = %err, "failed to submit scores");
                            RoundEvent::SubmitFailed {
                                reason: err.to_string(),
                            }
                        }
                    };
                    self.dispatch(event);
                }
                Command::PreferencesChanged(preferences) => {
                    self.audio.apply_preferences(preferences)
                }
                Command::Shutdown(done) => {
                    stopped = Some(done);
                    break;
                }
            }
        }

        receiver.close();
        self.timers.cancel_all();
        self.audio.stop_excerpt();
        info!(match_id = %self.machine.state().match_id, "round controller stopped");
        if let Some(done) = stopped {
            let _ = done.send(());
        }
    }

    /// Apply `event`, returning whether it was accepted.
    fn dispatch(&mut self, event: RoundEvent) -> bool {
        match self.machine.handle(event) {
            Ok(transition) => {
                debug!(
                    from = ?transition.from,
                    to = ?transition.to,
                    version = transition.version,
                    "round transition applied"
                );
                self.publish();
                for effect in transition.effects {
                    self.execute(effect);
                }
                true
            }
            Err(ignored) => {
                debug!(phase = ?ignored.from, event = ?ignored.event, "event ignored");
                false
            }
        }
    }

    fn publish(&self) {
        let snapshot = RoundSnapshot::capture(self.machine.state(), self.machine.version());
        sse_events::broadcast_snapshot(&self.hub, &snapshot);
        self.snapshots.send_replace(snapshot);
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::FetchQuiz { round, exclude } => {
                let Some(commands) = self.commands.upgrade() else {
                    return;
                };
                let quiz = self.quiz.clone();
                debug!(round, excluded = exclude.len(), "fetching quiz");
                tokio::spawn(async move {
                    let result = quiz.fetch_quiz(exclude).await;
                    let _ = commands.send(Command::QuizFetched { round, result });
                });
            }
            Effect::Schedule { role, delay, mode } => {
                let commands = self.commands.clone();
                self.timers.schedule(role, delay, mode, move |handle| {
                    if let Some(commands) = commands.upgrade() {
                        let _ = commands.send(Command::TimerFired(handle));
                    }
                });
            }
            Effect::Cancel(role) => self.timers.cancel(role),
            Effect::CancelAll => self.timers.cancel_all(),
            Effect::PlayCue(kind) => self.audio.play_cue(kind),
            Effect::PlayExcerpt { excerpt_ref } => self.audio.play_excerpt(&excerpt_ref),
            Effect::StopExcerpt => self.audio.stop_excerpt(),
            Effect::SubmitScores(scores) => {
                let Some(commands) = self.commands.upgrade() else {
                    return;
                };
                let quiz = self.quiz.clone();
                info!(
                    player1 = scores.player1,
                    player2 = scores.player2,
                    "submitting final scores"
                );
                tokio::spawn(async move {
                    let result = quiz.submit_scores(scores).await;
                    let _ = commands.send(Command::ScoresSubmitted(result));
                });
            }
            Effect::Navigate(exit) => {
                info!(?exit, "leaving match");
                sse_events::broadcast_navigate(&self.hub, &exit);
            }
        }
    }
}

/// Start a new match, stopping the previous one if any.
///
/// The previous controller is fully stopped before the new one publishes anything, so
/// renderers never see its snapshots or audio commands after the new match begins.
pub async fn start_match(state: &SharedState) -> RoundSnapshot {
    if let Some(previous) = state.stop_match().await {
        info!(match_id = %previous, "previous match replaced");
    }
    let controller = RoundController::spawn(state.round_deps()).await;
    let snapshot = controller.snapshot();
    if let Some(raced) = state.replace_match(controller).await {
        raced.shutdown().await;
    }
    snapshot
}

/// Snapshot of the running match.
pub async fn current_snapshot(state: &SharedState) -> Result<RoundSnapshot, ServiceError> {
    Ok(state.require_match().await?.snapshot())
}

/// Feed `event` to the running match.
pub async fn send_event(
    state: &SharedState,
    event: RoundEvent,
) -> Result<EventOutcome, ServiceError> {
    state.require_match().await?.send(event).await
}

/// Register a buzz.
pub async fn buzz(state: &SharedState, request: BuzzRequest) -> Result<EventOutcome, ServiceError> {
    let player = Player::try_from(request.player).map_err(ServiceError::InvalidInput)?;
    send_event(state, RoundEvent::Buzz(player)).await
}

/// Register an answer given by id or by position.
pub async fn answer(
    state: &SharedState,
    request: AnswerRequest,
) -> Result<EventOutcome, ServiceError> {
    let selection = match (request.choice_id, request.position) {
        (Some(id), None) => AnswerSelection::Choice(id),
        (None, Some(position)) => AnswerSelection::Position(position),
        _ => {
            return Err(ServiceError::InvalidInput(
                "exactly one of `choice_id` and `position` must be set".into(),
            ));
        }
    };
    send_event(state, RoundEvent::SelectAnswer(selection)).await
}

/// Resolve a key press through the configured bindings. Unbound keys are ignored.
pub async fn press_key(state: &SharedState, key: &str) -> Result<EventOutcome, ServiceError> {
    let controller = state.require_match().await?;
    match input::event_for_key(&state.config().keys, key) {
        Some(event) => controller.send(event).await,
        None => {
            debug!(key, "unbound key ignored");
            Ok(EventOutcome {
                accepted: false,
                snapshot: controller.snapshot(),
            })
        }
    }
}
