use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::RoundRules,
    state::{
        effects::{CueKind, Effect, MatchExit},
        round::{AnswerRecord, Choice, Player, Quiz},
        score::ScoreTracker,
        timers::{TimerMode, TimerRole},
    },
};

/// Phases a match goes through; exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Waiting for quiz content.
    Loading,
    /// Content loaded; waiting for the round to be started.
    ReadyToPlay,
    /// The question cue is playing.
    PlayingCue,
    /// The excerpt is playing and the countdown runs; players may buzz.
    PlayingExcerpt,
    /// A player buzzed and must pick an answer.
    Answering,
    /// Outcome of the last answer (or timeout) is displayed.
    ShowingResult(RoundOutcome),
    /// Last round is over; final scores are being submitted.
    Ended,
    /// Content retrieval or score submission failed.
    Failed,
}

/// What ended an answering attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// The answering player picked the right song; the answer is revealed.
    Correct,
    /// The answering player picked a wrong song; play resumes shortly.
    Wrong,
    /// The countdown ran out; the answer is revealed.
    Timeout,
}

/// How a player designates an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSelection {
    /// By song identifier.
    Choice(u32),
    /// By 1-based position among the displayed choices.
    Position(usize),
}

/// Inputs accepted by the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    /// Begin the match by requesting the first round.
    Init,
    /// Content for `round` arrived.
    QuizLoaded {
        /// Round the request was issued for.
        round: u32,
        /// Validated content.
        quiz: Quiz,
    },
    /// Content retrieval for `round` failed.
    QuizFailed {
        /// Round the request was issued for.
        round: u32,
        /// Human readable cause.
        reason: String,
    },
    /// Start the loaded round.
    StartRound,
    /// A timer of the given role expired.
    TimerElapsed(TimerRole),
    /// A player buzzed in.
    Buzz(Player),
    /// The answering player picked a choice.
    SelectAnswer(AnswerSelection),
    /// Reveal the hint of the current round.
    RequestHint,
    /// Move on after a revealed result.
    Advance,
    /// Final scores were accepted.
    ScoresSubmitted {
        /// Result view to navigate to.
        redirect: String,
    },
    /// Final score submission failed.
    SubmitFailed {
        /// Human readable cause.
        reason: String,
    },
    /// Leave the match immediately.
    Quit,
}

/// Error returned when an event does not apply to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the event was received.
    pub from: RoundPhase,
    /// The event that was dropped.
    pub event: RoundEvent,
}

/// Result of an accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Phase before the event.
    pub from: RoundPhase,
    /// Phase after the event (may equal `from`).
    pub to: RoundPhase,
    /// Side effects to execute, in order.
    pub effects: Vec<Effect>,
    /// Version number after applying this transition.
    pub version: usize,
}

/// Every mutable field of a match. Only [`RoundStateMachine`] writes to it.
#[derive(Debug, Clone)]
pub struct MatchState {
    /// Identifier of this match.
    pub match_id: Uuid,
    /// 1-based round counter, incremented on each fetch (0 before `Init`).
    pub round_number: u32,
    /// Rounds in this match.
    pub max_rounds: u32,
    /// Cumulative scores.
    pub scores: ScoreTracker,
    /// Songs already played in this match; only ever grows.
    pub used_song_ids: BTreeSet<u32>,
    /// Answer of the loaded round.
    pub correct_answer: Option<AnswerRecord>,
    /// Choices of the loaded round.
    pub choices: Vec<Choice>,
    /// Player holding the answering turn.
    pub answering_player: Option<Player>,
    /// Seconds left on the countdown; kept across a wrong-answer retry.
    pub time_remaining_seconds: u32,
    /// Whether the hint was revealed this round.
    pub hint_used_this_round: bool,
    /// Current phase.
    pub phase: RoundPhase,
    /// Choice picked in the last answer of this round.
    pub last_selection: Option<u32>,
    /// Cause of the `Failed` phase.
    pub failure: Option<String>,
    /// Set once the match has been left; no event is accepted afterwards.
    pub exit: Option<MatchExit>,
}

impl MatchState {
    fn new(rules: &RoundRules) -> Self {
        Self {
            match_id: Uuid::new_v4(),
            round_number: 0,
            max_rounds: rules.max_rounds,
            scores: ScoreTracker::new(),
            used_song_ids: BTreeSet::new(),
            correct_answer: None,
            choices: Vec::new(),
            answering_player: None,
            time_remaining_seconds: rules.time_limit_secs,
            hint_used_this_round: false,
            phase: RoundPhase::Loading,
            last_selection: None,
            failure: None,
            exit: None,
        }
    }

    /// Whether the correct answer may be shown to players.
    pub fn answer_revealed(&self) -> bool {
        matches!(
            self.phase,
            RoundPhase::ShowingResult(RoundOutcome::Correct | RoundOutcome::Timeout)
        )
    }

    /// Whether a hint request would currently be granted.
    pub fn hint_available(&self) -> bool {
        let phase_allows = matches!(
            self.phase,
            RoundPhase::ReadyToPlay
                | RoundPhase::PlayingCue
                | RoundPhase::PlayingExcerpt
                | RoundPhase::Answering
                | RoundPhase::ShowingResult(RoundOutcome::Wrong)
        );
        phase_allows
            && !self.hint_used_this_round
            && self
                .correct_answer
                .as_ref()
                .is_some_and(|answer| answer.hint.is_some())
    }
}

/// State machine driving a whole match, round after round.
///
/// Transitions are pure with respect to the outside world: they mutate [`MatchState`] and
/// return the [`Effect`]s the caller must execute.
#[derive(Debug, Clone)]
pub struct RoundStateMachine {
    state: MatchState,
    rules: RoundRules,
    version: usize,
}

impl RoundStateMachine {
    /// Create a machine for a fresh match, in `Loading` with round counter 0.
    pub fn new(rules: RoundRules) -> Self {
        Self {
            state: MatchState::new(&rules),
            rules,
            version: 0,
        }
    }

    /// Inspect the match state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    /// Number of accepted transitions so far.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Apply `event`, returning the transition and its effects, or the rejected event when
    /// it does not apply to the current phase. Rejected events leave the state untouched.
    pub fn handle(&mut self, event: RoundEvent) -> Result<Transition, InvalidTransition> {
        let from = self.state.phase;
        if self.state.exit.is_some() {
            return Err(InvalidTransition { from, event });
        }

        let effects = match (from, event) {
            (_, RoundEvent::Quit) => self.quit(),
            (RoundPhase::Loading, RoundEvent::Init) if self.state.round_number == 0 => {
                self.request_next_round()
            }
            (RoundPhase::Loading, RoundEvent::QuizLoaded { round, quiz })
                if round == self.state.round_number =>
            {
                self.load(quiz)
            }
            (RoundPhase::Loading, RoundEvent::QuizFailed { round, reason })
                if round == self.state.round_number =>
            {
                self.fail(reason)
            }
            (RoundPhase::ReadyToPlay, RoundEvent::StartRound) => self.start_round(),
            (RoundPhase::PlayingCue, RoundEvent::TimerElapsed(TimerRole::CueLead)) => {
                self.enter_excerpt()
            }
            (RoundPhase::PlayingExcerpt, RoundEvent::TimerElapsed(TimerRole::ExcerptStop)) => {
                vec![Effect::StopExcerpt]
            }
            (RoundPhase::PlayingExcerpt, RoundEvent::TimerElapsed(TimerRole::Countdown)) => {
                self.tick()
            }
            (RoundPhase::PlayingExcerpt, RoundEvent::Buzz(player)) => self.buzz(player),
            (RoundPhase::Answering, RoundEvent::SelectAnswer(selection)) => {
                let resolved = self.resolve(selection).zip(self.state.answering_player);
                let Some((choice_id, player)) = resolved else {
                    return Err(InvalidTransition {
                        from,
                        event: RoundEvent::SelectAnswer(selection),
                    });
                };
                self.answer(player, choice_id)
            }
            (
                RoundPhase::ShowingResult(RoundOutcome::Wrong),
                RoundEvent::TimerElapsed(TimerRole::TransientMessage),
            ) => self.enter_excerpt(),
            (_, RoundEvent::RequestHint) if self.state.hint_available() => {
                self.state.hint_used_this_round = true;
                Vec::new()
            }
            (
                RoundPhase::ShowingResult(RoundOutcome::Correct | RoundOutcome::Timeout),
                RoundEvent::Advance,
            ) => self.advance(),
            (RoundPhase::Ended, RoundEvent::ScoresSubmitted { redirect }) => {
                let exit = MatchExit::Submitted { redirect };
                self.state.exit = Some(exit.clone());
                vec![Effect::Navigate(exit)]
            }
            (RoundPhase::Ended, RoundEvent::SubmitFailed { reason }) => self.fail(reason),
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        self.version += 1;
        Ok(Transition {
            from,
            to: self.state.phase,
            effects,
            version: self.version,
        })
    }

    fn request_next_round(&mut self) -> Vec<Effect> {
        self.state.round_number += 1;
        self.state.phase = RoundPhase::Loading;
        vec![Effect::FetchQuiz {
            round: self.state.round_number,
            exclude: self.state.used_song_ids.iter().copied().collect(),
        }]
    }

    fn load(&mut self, quiz: Quiz) -> Vec<Effect> {
        let Quiz { answer, choices } = quiz;
        self.state.correct_answer = Some(answer);
        self.state.choices = choices;
        self.state.answering_player = None;
        self.state.last_selection = None;
        self.state.hint_used_this_round = false;
        self.state.time_remaining_seconds = self.rules.time_limit_secs;
        self.state.phase = RoundPhase::ReadyToPlay;
        Vec::new()
    }

    fn fail(&mut self, reason: String) -> Vec<Effect> {
        self.state.failure = Some(reason);
        self.state.phase = RoundPhase::Failed;
        vec![Effect::CancelAll, Effect::StopExcerpt]
    }

    fn start_round(&mut self) -> Vec<Effect> {
        self.state.time_remaining_seconds = self.rules.time_limit_secs;
        self.state.phase = RoundPhase::PlayingCue;
        vec![
            Effect::PlayCue(CueKind::Question),
            Effect::Schedule {
                role: TimerRole::CueLead,
                delay: self.rules.cue_lead(),
                mode: TimerMode::Once,
            },
        ]
    }

    /// Entered after the cue, and again after a wrong answer: the countdown restarts from
    /// the stored remaining time, never from the limit.
    fn enter_excerpt(&mut self) -> Vec<Effect> {
        self.state.answering_player = None;
        self.state.phase = RoundPhase::PlayingExcerpt;

        let mut effects = Vec::with_capacity(3);
        if let Some(answer) = &self.state.correct_answer {
            effects.push(Effect::PlayExcerpt {
                excerpt_ref: answer.excerpt_ref.clone(),
            });
        }
        effects.push(Effect::Schedule {
            role: TimerRole::ExcerptStop,
            delay: self.rules.excerpt_duration(),
            mode: TimerMode::Once,
        });
        effects.push(Effect::Schedule {
            role: TimerRole::Countdown,
            delay: self.rules.countdown_interval(),
            mode: TimerMode::Periodic,
        });
        effects
    }

    fn tick(&mut self) -> Vec<Effect> {
        self.state.time_remaining_seconds = self.state.time_remaining_seconds.saturating_sub(1);
        if self.state.time_remaining_seconds > 0 {
            return Vec::new();
        }

        self.state.phase = RoundPhase::ShowingResult(RoundOutcome::Timeout);
        vec![
            Effect::CancelAll,
            Effect::StopExcerpt,
            Effect::PlayCue(CueKind::Incorrect),
        ]
    }

    fn buzz(&mut self, player: Player) -> Vec<Effect> {
        self.state.answering_player = Some(player);
        self.state.phase = RoundPhase::Answering;
        vec![
            Effect::Cancel(TimerRole::Countdown),
            Effect::Cancel(TimerRole::ExcerptStop),
            Effect::StopExcerpt,
            Effect::PlayCue(CueKind::Answer),
        ]
    }

    fn resolve(&self, selection: AnswerSelection) -> Option<u32> {
        match selection {
            AnswerSelection::Choice(id) => self
                .state
                .choices
                .iter()
                .any(|choice| choice.id == id)
                .then_some(id),
            AnswerSelection::Position(position) => position
                .checked_sub(1)
                .and_then(|index| self.state.choices.get(index))
                .map(|choice| choice.id),
        }
    }

    fn answer(&mut self, player: Player, choice_id: u32) -> Vec<Effect> {
        self.state.last_selection = Some(choice_id);
        let correct = self
            .state
            .correct_answer
            .as_ref()
            .is_some_and(|answer| answer.id == choice_id);

        if correct {
            self.state.scores.apply_delta(player, self.rules.correct_points);
            self.state.phase = RoundPhase::ShowingResult(RoundOutcome::Correct);
            vec![Effect::PlayCue(CueKind::Correct)]
        } else {
            self.state.scores.apply_delta(player, -self.rules.wrong_penalty);
            self.state.phase = RoundPhase::ShowingResult(RoundOutcome::Wrong);
            vec![
                Effect::PlayCue(CueKind::Incorrect),
                Effect::Schedule {
                    role: TimerRole::TransientMessage,
                    delay: self.rules.wrong_answer_pause(),
                    mode: TimerMode::Once,
                },
            ]
        }
    }

    fn advance(&mut self) -> Vec<Effect> {
        if let Some(answer) = self.state.correct_answer.take() {
            self.state.used_song_ids.insert(answer.id);
        }
        self.state.choices.clear();
        self.state.answering_player = None;
        self.state.last_selection = None;

        let mut effects = vec![Effect::CancelAll];
        if self.state.round_number < self.state.max_rounds {
            effects.extend(self.request_next_round());
        } else {
            self.state.phase = RoundPhase::Ended;
            effects.push(Effect::SubmitScores(self.state.scores.scores()));
        }
        effects
    }

    fn quit(&mut self) -> Vec<Effect> {
        self.state.exit = Some(MatchExit::Quit);
        vec![
            Effect::CancelAll,
            Effect::StopExcerpt,
            Effect::Navigate(MatchExit::Quit),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{round::AnswerRecord, score::Scores};

    fn rules() -> RoundRules {
        RoundRules {
            time_limit_secs: 5,
            max_rounds: 2,
            ..RoundRules::default()
        }
    }

    fn quiz(answer_id: u32, hint: Option<&str>) -> Quiz {
        Quiz {
            answer: AnswerRecord {
                id: answer_id,
                title: format!("song {answer_id}"),
                composer: "Satie".into(),
                excerpt_ref: format!("audio/{answer_id}.mp3"),
                hint: hint.map(Into::into),
            },
            choices: [answer_id, answer_id + 1, answer_id + 2, answer_id + 3]
                .into_iter()
                .map(|id| Choice {
                    id,
                    title: format!("song {id}"),
                })
                .collect(),
        }
    }

    fn handle(sm: &mut RoundStateMachine, event: RoundEvent) -> Transition {
        sm.handle(event).unwrap()
    }

    /// Machine in `PlayingExcerpt` for round 1 with answer id 7.
    fn playing(rules: RoundRules) -> RoundStateMachine {
        let mut sm = RoundStateMachine::new(rules);
        handle(&mut sm, RoundEvent::Init);
        handle(
            &mut sm,
            RoundEvent::QuizLoaded {
                round: 1,
                quiz: quiz(7, Some("French, 1928")),
            },
        );
        handle(&mut sm, RoundEvent::StartRound);
        handle(&mut sm, RoundEvent::TimerElapsed(TimerRole::CueLead));
        sm
    }

    #[test]
    fn init_requests_first_round() {
        let mut sm = RoundStateMachine::new(rules());
        assert_eq!(sm.phase(), RoundPhase::Loading);

        let transition = handle(&mut sm, RoundEvent::Init);
        assert_eq!(
            transition.effects,
            vec![Effect::FetchQuiz {
                round: 1,
                exclude: vec![]
            }]
        );
        assert_eq!(sm.state().round_number, 1);
        assert!(sm.handle(RoundEvent::Init).is_err(), "init happens once");
    }

    #[test]
    fn fetch_failure_is_terminal() {
        let mut sm = RoundStateMachine::new(rules());
        handle(&mut sm, RoundEvent::Init);
        handle(
            &mut sm,
            RoundEvent::QuizFailed {
                round: 1,
                reason: "connection refused".into(),
            },
        );
        assert_eq!(sm.phase(), RoundPhase::Failed);
        assert_eq!(sm.state().failure.as_deref(), Some("connection refused"));
        assert!(sm.handle(RoundEvent::StartRound).is_err());
        assert!(sm.handle(RoundEvent::Advance).is_err());
    }

    #[test]
    fn stale_fetch_results_are_dropped() {
        let mut sm = RoundStateMachine::new(rules());
        handle(&mut sm, RoundEvent::Init);
        let err = sm
            .handle(RoundEvent::QuizLoaded {
                round: 3,
                quiz: quiz(1, None),
            })
            .unwrap_err();
        assert_eq!(err.from, RoundPhase::Loading);
        assert!(sm.state().correct_answer.is_none());
    }

    #[test]
    fn start_round_plays_cue_and_arms_lead_timer() {
        let mut sm = RoundStateMachine::new(rules());
        handle(&mut sm, RoundEvent::Init);
        handle(
            &mut sm,
            RoundEvent::QuizLoaded {
                round: 1,
                quiz: quiz(7, None),
            },
        );
        assert_eq!(sm.phase(), RoundPhase::ReadyToPlay);

        let transition = handle(&mut sm, RoundEvent::StartRound);
        assert_eq!(transition.to, RoundPhase::PlayingCue);
        assert_eq!(transition.effects[0], Effect::PlayCue(CueKind::Question));
        assert!(matches!(
            transition.effects[1],
            Effect::Schedule {
                role: TimerRole::CueLead,
                mode: TimerMode::Once,
                ..
            }
        ));
        assert_eq!(sm.state().time_remaining_seconds, 5);
    }

    #[test]
    fn excerpt_starts_with_stop_and_countdown_timers() {
        let sm = playing(rules());
        assert_eq!(sm.phase(), RoundPhase::PlayingExcerpt);

        let mut replay = RoundStateMachine::new(rules());
        handle(&mut replay, RoundEvent::Init);
        handle(
            &mut replay,
            RoundEvent::QuizLoaded {
                round: 1,
                quiz: quiz(7, None),
            },
        );
        handle(&mut replay, RoundEvent::StartRound);
        let transition = handle(&mut replay, RoundEvent::TimerElapsed(TimerRole::CueLead));
        assert_eq!(
            transition.effects,
            vec![
                Effect::PlayExcerpt {
                    excerpt_ref: "audio/7.mp3".into()
                },
                Effect::Schedule {
                    role: TimerRole::ExcerptStop,
                    delay: rules().excerpt_duration(),
                    mode: TimerMode::Once,
                },
                Effect::Schedule {
                    role: TimerRole::Countdown,
                    delay: rules().countdown_interval(),
                    mode: TimerMode::Periodic,
                },
            ]
        );
    }

    #[test]
    fn buzz_during_cue_is_ignored() {
        let mut sm = RoundStateMachine::new(rules());
        handle(&mut sm, RoundEvent::Init);
        handle(
            &mut sm,
            RoundEvent::QuizLoaded {
                round: 1,
                quiz: quiz(7, None),
            },
        );
        handle(&mut sm, RoundEvent::StartRound);
        let version = sm.version();

        assert!(sm.handle(RoundEvent::Buzz(Player::One)).is_err());
        assert_eq!(sm.phase(), RoundPhase::PlayingCue);
        assert_eq!(sm.version(), version);
    }

    #[test]
    fn first_buzz_wins() {
        let mut sm = playing(rules());
        let transition = handle(&mut sm, RoundEvent::Buzz(Player::Two));
        assert_eq!(transition.to, RoundPhase::Answering);
        assert_eq!(
            transition.effects,
            vec![
                Effect::Cancel(TimerRole::Countdown),
                Effect::Cancel(TimerRole::ExcerptStop),
                Effect::StopExcerpt,
                Effect::PlayCue(CueKind::Answer),
            ]
        );

        assert!(sm.handle(RoundEvent::Buzz(Player::One)).is_err());
        assert_eq!(sm.state().answering_player, Some(Player::Two));
    }

    #[test]
    fn correct_answer_scores_and_reveals() {
        // Scenario A
        let mut sm = playing(rules());
        handle(&mut sm, RoundEvent::Buzz(Player::One));
        let transition = handle(&mut sm, RoundEvent::SelectAnswer(AnswerSelection::Choice(7)));

        assert_eq!(
            transition.to,
            RoundPhase::ShowingResult(RoundOutcome::Correct)
        );
        assert_eq!(transition.effects, vec![Effect::PlayCue(CueKind::Correct)]);
        assert_eq!(sm.state().scores.scores().player1, 20);
        assert!(sm.state().answer_revealed());
    }

    #[test]
    fn countdown_timeout_reveals_without_scoring() {
        // Scenario B
        let mut sm = playing(rules());
        for remaining in (1..5).rev() {
            let transition = handle(&mut sm, RoundEvent::TimerElapsed(TimerRole::Countdown));
            assert!(transition.effects.is_empty());
            assert_eq!(sm.state().time_remaining_seconds, remaining);
        }

        let transition = handle(&mut sm, RoundEvent::TimerElapsed(TimerRole::Countdown));
        assert_eq!(
            transition.to,
            RoundPhase::ShowingResult(RoundOutcome::Timeout)
        );
        assert_eq!(
            transition.effects,
            vec![
                Effect::CancelAll,
                Effect::StopExcerpt,
                Effect::PlayCue(CueKind::Incorrect)
            ]
        );
        assert_eq!(sm.state().scores.scores(), Scores::default());
        assert!(sm.state().answer_revealed());
        assert!(
            sm.handle(RoundEvent::TimerElapsed(TimerRole::TransientMessage))
                .is_err(),
            "no retry after a timeout"
        );
    }

    #[test]
    fn wrong_answer_penalises_and_resumes_countdown() {
        // Scenario C
        let mut sm = playing(RoundRules {
            correct_points: 5,
            ..rules()
        });
        handle(&mut sm, RoundEvent::Buzz(Player::One));
        handle(&mut sm, RoundEvent::SelectAnswer(AnswerSelection::Choice(7)));
        assert_eq!(sm.state().scores.scores().player1, 5);

        handle(&mut sm, RoundEvent::Advance);
        handle(
            &mut sm,
            RoundEvent::QuizLoaded {
                round: 2,
                quiz: quiz(7, None),
            },
        );
        handle(&mut sm, RoundEvent::StartRound);
        handle(&mut sm, RoundEvent::TimerElapsed(TimerRole::CueLead));
        handle(&mut sm, RoundEvent::TimerElapsed(TimerRole::Countdown));
        handle(&mut sm, RoundEvent::TimerElapsed(TimerRole::Countdown));
        handle(&mut sm, RoundEvent::Buzz(Player::One));
        let remaining_at_buzz = sm.state().time_remaining_seconds;
        assert_eq!(remaining_at_buzz, 3);

        let transition = handle(&mut sm, RoundEvent::SelectAnswer(AnswerSelection::Position(2)));
        assert_eq!(transition.to, RoundPhase::ShowingResult(RoundOutcome::Wrong));
        assert_eq!(sm.state().scores.scores().player1, 0, "5 - 10 floors at 0");
        assert!(transition.effects.contains(&Effect::Schedule {
            role: TimerRole::TransientMessage,
            delay: rules().wrong_answer_pause(),
            mode: TimerMode::Once,
        }));
        assert!(!sm.state().answer_revealed());
        assert_eq!(sm.state().last_selection, Some(8));
        assert!(sm.handle(RoundEvent::Advance).is_err());

        let transition = handle(
            &mut sm,
            RoundEvent::TimerElapsed(TimerRole::TransientMessage),
        );
        assert_eq!(transition.to, RoundPhase::PlayingExcerpt);
        assert_eq!(sm.state().answering_player, None);
        assert_eq!(sm.state().time_remaining_seconds, remaining_at_buzz);
    }

    #[test]
    fn penalty_is_floored_at_zero() {
        let mut sm = playing(rules());
        handle(&mut sm, RoundEvent::Buzz(Player::One));
        handle(&mut sm, RoundEvent::SelectAnswer(AnswerSelection::Choice(8)));
        assert_eq!(sm.state().scores.scores().player1, 0);
    }

    #[test]
    fn selections_outside_answering_or_choices_are_ignored() {
        let mut sm = playing(rules());
        assert!(
            sm.handle(RoundEvent::SelectAnswer(AnswerSelection::Choice(7)))
                .is_err()
        );

        handle(&mut sm, RoundEvent::Buzz(Player::One));
        assert!(
            sm.handle(RoundEvent::SelectAnswer(AnswerSelection::Choice(99)))
                .is_err()
        );
        assert!(
            sm.handle(RoundEvent::SelectAnswer(AnswerSelection::Position(0)))
                .is_err()
        );
        assert!(
            sm.handle(RoundEvent::SelectAnswer(AnswerSelection::Position(5)))
                .is_err()
        );
        assert_eq!(sm.phase(), RoundPhase::Answering);
    }

    #[test]
    fn hint_is_granted_once_per_round() {
        // Scenario D
        let mut sm = playing(rules());
        handle(&mut sm, RoundEvent::RequestHint);
        assert!(sm.state().hint_used_this_round);
        assert!(sm.handle(RoundEvent::RequestHint).is_err());

        handle(&mut sm, RoundEvent::Buzz(Player::One));
        handle(&mut sm, RoundEvent::SelectAnswer(AnswerSelection::Choice(7)));
        handle(&mut sm, RoundEvent::Advance);
        handle(
            &mut sm,
            RoundEvent::QuizLoaded {
                round: 2,
                quiz: quiz(20, Some("Baroque")),
            },
        );
        assert!(!sm.state().hint_used_this_round);
        handle(&mut sm, RoundEvent::RequestHint);
    }

    #[test]
    fn hint_requires_a_hint_text() {
        let mut sm = RoundStateMachine::new(rules());
        handle(&mut sm, RoundEvent::Init);
        handle(
            &mut sm,
            RoundEvent::QuizLoaded {
                round: 1,
                quiz: quiz(7, None),
            },
        );
        assert!(sm.handle(RoundEvent::RequestHint).is_err());
    }

    #[test]
    fn advance_excludes_played_songs() {
        let mut sm = playing(RoundRules {
            max_rounds: 3,
            ..rules()
        });
        handle(&mut sm, RoundEvent::Buzz(Player::One));
        handle(&mut sm, RoundEvent::SelectAnswer(AnswerSelection::Choice(7)));

        let transition = handle(&mut sm, RoundEvent::Advance);
        assert_eq!(transition.to, RoundPhase::Loading);
        assert_eq!(
            transition.effects,
            vec![
                Effect::CancelAll,
                Effect::FetchQuiz {
                    round: 2,
                    exclude: vec![7]
                }
            ]
        );
        assert!(sm.state().correct_answer.is_none());
        assert!(sm.state().choices.is_empty());
    }

    #[test]
    fn used_song_ids_grow_without_duplicates() {
        let mut sm = RoundStateMachine::new(RoundRules {
            max_rounds: 4,
            ..rules()
        });
        handle(&mut sm, RoundEvent::Init);
        let mut previous = 0;
        for (round, answer_id) in [(1, 11), (2, 11), (3, 30), (4, 40)] {
            handle(
                &mut sm,
                RoundEvent::QuizLoaded {
                    round,
                    quiz: quiz(answer_id, None),
                },
            );
            handle(&mut sm, RoundEvent::StartRound);
            handle(&mut sm, RoundEvent::TimerElapsed(TimerRole::CueLead));
            for _ in 0..5 {
                handle(&mut sm, RoundEvent::TimerElapsed(TimerRole::Countdown));
            }
            handle(&mut sm, RoundEvent::Advance);

            let used = &sm.state().used_song_ids;
            assert!(used.len() >= previous);
            previous = used.len();
        }
        assert_eq!(
            sm.state().used_song_ids.iter().copied().collect::<Vec<_>>(),
            vec![11, 30, 40]
        );
    }

    #[test]
    fn last_round_ends_and_submits() {
        // Scenario E
        let mut sm = playing(RoundRules {
            max_rounds: 1,
            ..rules()
        });
        handle(&mut sm, RoundEvent::Buzz(Player::Two));
        handle(&mut sm, RoundEvent::SelectAnswer(AnswerSelection::Choice(7)));

        let transition = handle(&mut sm, RoundEvent::Advance);
        assert_eq!(transition.to, RoundPhase::Ended);
        assert_eq!(
            transition.effects,
            vec![
                Effect::CancelAll,
                Effect::SubmitScores(Scores {
                    player1: 0,
                    player2: 20
                })
            ]
        );
        assert!(
            !transition
                .effects
                .iter()
                .any(|effect| matches!(effect, Effect::FetchQuiz { .. }))
        );

        let transition = handle(
            &mut sm,
            RoundEvent::ScoresSubmitted {
                redirect: "/result".into(),
            },
        );
        assert_eq!(
            transition.effects,
            vec![Effect::Navigate(MatchExit::Submitted {
                redirect: "/result".into()
            })]
        );
        assert!(sm.handle(RoundEvent::Advance).is_err());
    }

    #[test]
    fn submit_failure_fails_the_match() {
        let mut sm = playing(RoundRules {
            max_rounds: 1,
            ..rules()
        });
        for _ in 0..5 {
            handle(&mut sm, RoundEvent::TimerElapsed(TimerRole::Countdown));
        }
        handle(&mut sm, RoundEvent::Advance);
        handle(
            &mut sm,
            RoundEvent::SubmitFailed {
                reason: "502".into(),
            },
        );
        assert_eq!(sm.phase(), RoundPhase::Failed);
    }

    #[test]
    fn quit_is_accepted_anywhere_once() {
        let mut sm = playing(rules());
        let transition = handle(&mut sm, RoundEvent::Quit);
        assert_eq!(
            transition.effects,
            vec![
                Effect::CancelAll,
                Effect::StopExcerpt,
                Effect::Navigate(MatchExit::Quit)
            ]
        );
        assert_eq!(sm.state().exit, Some(MatchExit::Quit));
        assert!(sm.handle(RoundEvent::Quit).is_err());
        assert!(
            sm.handle(RoundEvent::TimerElapsed(TimerRole::Countdown))
                .is_err()
        );
    }

    #[test]
    fn stray_timer_events_are_noops() {
        let mut sm = playing(rules());
        handle(&mut sm, RoundEvent::Buzz(Player::One));
        let remaining = sm.state().time_remaining_seconds;

        for role in [
            TimerRole::CueLead,
            TimerRole::ExcerptStop,
            TimerRole::Countdown,
            TimerRole::TransientMessage,
        ] {
            assert!(sm.handle(RoundEvent::TimerElapsed(role)).is_err());
        }
        assert_eq!(sm.phase(), RoundPhase::Answering);
        assert_eq!(sm.state().time_remaining_seconds, remaining);
    }

    #[test]
    fn every_phase_tolerates_every_event() {
        let events = || {
            vec![
                RoundEvent::Init,
                RoundEvent::StartRound,
                RoundEvent::TimerElapsed(TimerRole::CueLead),
                RoundEvent::TimerElapsed(TimerRole::ExcerptStop),
                RoundEvent::TimerElapsed(TimerRole::Countdown),
                RoundEvent::TimerElapsed(TimerRole::TransientMessage),
                RoundEvent::Buzz(Player::One),
                RoundEvent::SelectAnswer(AnswerSelection::Position(1)),
                RoundEvent::RequestHint,
                RoundEvent::Advance,
                RoundEvent::SubmitFailed {
                    reason: "x".into(),
                },
            ]
        };

        for event in events() {
            let mut sm = playing(rules());
            let before = sm.state().clone();
            match sm.handle(event.clone()) {
                Ok(transition) => assert_eq!(transition.from, RoundPhase::PlayingExcerpt),
                Err(err) => {
                    assert_eq!(err.event, event);
                    assert_eq!(sm.phase(), before.phase);
                    assert_eq!(sm.state().scores.scores(), before.scores.scores());
                    assert_eq!(
                        sm.state().time_remaining_seconds,
                        before.time_remaining_seconds
                    );
                }
            }
        }
    }
}
