use std::rc::Rc;

use super::phase::Phase;
use super::round::{RoundRecord, StepCursor, StepProgress};
use crate::clock::Clock;
use crate::config::{DifficultyTable, GameConfig, SessionSettings};
use crate::constants::DEBUG_ENV_VAR;
use crate::data::GameContent;
use crate::difficulty::Difficulty;
use crate::evaluator::{Evaluation, evaluate};
use crate::generator::{ContentGenerator, RoundRequest};
use crate::puzzle::{Answer, GameKind, PuzzleSpec};
use crate::report::{GameResult, ReportInput, ResultReporter, assemble};
use crate::scoring::ScoreAggregator;
use crate::seed::{canonical_seed, encode_replay_code};
use crate::timers::{Timer, TimerGuard, TimerKind, TimerQueue};

#[cfg(debug_assertions)]
fn debug_log_enabled() -> bool {
    matches!(std::env::var(DEBUG_ENV_VAR), Ok(val) if val != "0")
}

#[cfg(not(debug_assertions))]
const fn debug_log_enabled() -> bool {
    false
}

/// What a call to [`SessionMachine::submit_answer`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Not accepting answers right now; nothing changed.
    Ignored,
    /// One tap of a multi-step answer was recorded.
    StepAccepted { taken: usize, remaining: usize },
    /// The round was evaluated and feedback started.
    Evaluated(Evaluation),
}

#[derive(Debug, Clone)]
struct ActiveSession {
    difficulty: Difficulty,
    generator: ContentGenerator,
    phase: Phase,
    round_index: u32,
    total_rounds: u32,
    spec: Option<PuzzleSpec>,
    presented_at_ms: u64,
    rounds: Vec<RoundRecord>,
    aggregator: ScoreAggregator,
    cursor: StepCursor,
    /// Current sequence/walk length for adaptive games.
    length: u8,
    response_timer: Option<u64>,
    result: Option<GameResult>,
}

impl ActiveSession {
    fn transition(&mut self, next: Phase) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.phase
        );
        log::debug!(
            "phase {} -> {next} (round {}/{})",
            self.phase,
            self.round_index + 1,
            self.total_rounds
        );
        self.phase = next;
    }

    const fn guard(&self, epoch: u64) -> TimerGuard {
        TimerGuard {
            epoch,
            phase: self.phase,
            round: self.round_index,
        }
    }

    fn adapt_length(&mut self, evaluation: Evaluation) {
        let adaptive = matches!(
            self.generator.kind(),
            GameKind::SequenceRecall | GameKind::DirectionPath
        );
        if adaptive && evaluation.correct {
            let max = self.generator.settings().max_length;
            self.length = self.length.saturating_add(1).min(max);
        }
    }
}

/// Drives one game or screening session at a time.
///
/// All time comes from the injected [`Clock`]; pending timers only fire from
/// [`SessionMachine::poll`] (which [`SessionMachine::submit_answer`] also
/// runs first), and each fires at its own deadline so chained phases stay
/// deterministic under a virtual clock.
pub struct SessionMachine<C: Clock, R: ResultReporter> {
    kind: GameKind,
    seed: u64,
    content: Rc<GameContent>,
    table: DifficultyTable,
    clock: C,
    reporter: R,
    timers: TimerQueue,
    epoch: u64,
    session: Option<ActiveSession>,
}

impl<C: Clock, R: ResultReporter> SessionMachine<C, R> {
    /// `seed` is normalized to the seed its replay code decodes to, so the
    /// code reported at completion replays this exact session.
    #[must_use]
    pub fn new(
        kind: GameKind,
        seed: u64,
        content: Rc<GameContent>,
        table: DifficultyTable,
        clock: C,
        reporter: R,
    ) -> Self {
        Self {
            kind,
            seed: canonical_seed(kind, seed),
            content,
            table,
            clock,
            reporter,
            timers: TimerQueue::new(),
            epoch: 0,
            session: None,
        }
    }

    /// Discard any previous session and present round 1.
    ///
    /// Invalid overrides in `config` are clamped and logged, never rejected.
    pub fn start(&mut self, difficulty: Difficulty, config: &GameConfig) {
        self.epoch = self.epoch.wrapping_add(1);
        self.timers.cancel_all();

        let settings = config.resolve(difficulty, &self.table);
        let length = settings.starting_length;
        let generator =
            ContentGenerator::new(self.kind, self.seed, Rc::clone(&self.content), settings);
        let total_rounds = generator.planned_rounds();
        log::debug!(
            "starting {} ({difficulty}, {total_rounds} rounds, replay {})",
            self.kind,
            self.replay_code()
        );
        self.session = Some(ActiveSession {
            difficulty,
            generator,
            phase: Phase::Ready,
            round_index: 0,
            total_rounds,
            spec: None,
            presented_at_ms: 0,
            rounds: Vec::new(),
            aggregator: ScoreAggregator::new(self.kind),
            cursor: StepCursor::default(),
            length,
            response_timer: None,
            result: None,
        });
        let now = self.clock.now_ms();
        self.enter_presenting(now);
    }

    /// Submit an answer, or one tap of a multi-step answer.
    ///
    /// Due timers run first. Anything outside `Responding` is ignored.
    pub fn submit_answer(&mut self, answer: Answer) -> SubmitOutcome {
        self.poll();
        let now = self.clock.now_ms();
        let Some(session) = self.session.as_mut() else {
            return SubmitOutcome::Ignored;
        };
        if session.phase != Phase::Responding {
            log::debug!("ignoring submission during {}", session.phase);
            return SubmitOutcome::Ignored;
        }
        let Some(spec) = session.spec.as_ref() else {
            return SubmitOutcome::Ignored;
        };

        let answer = if answer.is_step() && spec.step_count().is_some() {
            match session.cursor.push(spec, &answer) {
                StepProgress::Pending { taken, remaining } => {
                    return SubmitOutcome::StepAccepted { taken, remaining };
                }
                StepProgress::Finished(full) => full,
            }
        } else {
            answer
        };

        let evaluation = self.finish_round(answer, now, false);
        self.poll();
        SubmitOutcome::Evaluated(evaluation)
    }

    /// Discard the running session without reporting. Returns whether there
    /// was one to discard; completed sessions are left alone.
    pub fn cancel(&mut self) -> bool {
        let Some(phase) = self.session.as_ref().map(|session| session.phase) else {
            return false;
        };
        if phase.is_terminal() {
            return false;
        }
        self.epoch = self.epoch.wrapping_add(1);
        self.timers.cancel_all();
        self.session = None;
        log::debug!("{} session cancelled during {phase}", self.kind);
        true
    }

    /// Fire every timer that is due. Returns how many changed state.
    pub fn poll(&mut self) -> usize {
        let now = self.clock.now_ms();
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(now) {
            if !self.guard_matches(&timer) {
                log::trace!("dropping stale {:?} timer #{}", timer.kind, timer.id);
                continue;
            }
            fired += 1;
            match timer.kind {
                TimerKind::PresentationEnd => self.enter_responding(timer.deadline_ms),
                TimerKind::ResponseLimit => {
                    self.finish_round(Answer::Empty, timer.deadline_ms, true);
                }
                TimerKind::FeedbackEnd => self.end_feedback(timer.deadline_ms),
            }
        }
        fired
    }

    fn guard_matches(&self, timer: &Timer) -> bool {
        self.session.as_ref().is_some_and(|session| {
            timer.guard.epoch == self.epoch
                && timer.guard.phase == session.phase
                && timer.guard.round == session.round_index
        })
    }

    fn enter_presenting(&mut self, at: u64) {
        let epoch = self.epoch;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let spec = session.generator.generate(RoundRequest {
            index: session.round_index,
            length: session.length,
        });
        let duration = session.generator.settings().presentation_ms(&spec);
        session.transition(Phase::Presenting);
        session.presented_at_ms = at;
        session.cursor.reset();
        session.spec = Some(spec);

        if duration == 0 {
            self.enter_responding(at);
            return;
        }
        let guard = session.guard(epoch);
        self.timers
            .schedule(at.saturating_add(duration), TimerKind::PresentationEnd, guard);
    }

    fn enter_responding(&mut self, at: u64) {
        let epoch = self.epoch;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(spec) = session.spec.clone() else {
            return;
        };
        session.transition(Phase::Responding);
        session.rounds.push(RoundRecord::open(
            session.round_index,
            spec,
            session.presented_at_ms,
            at,
        ));
        let guard = session.guard(epoch);
        let limit = session.generator.settings().response_limit_ms;
        session.response_timer = limit.map(|limit| {
            self.timers
                .schedule(at.saturating_add(limit), TimerKind::ResponseLimit, guard)
        });
    }

    fn finish_round(&mut self, answer: Answer, at: u64, timed_out: bool) -> Evaluation {
        let epoch = self.epoch;
        let Some(session) = self.session.as_mut() else {
            return Evaluation::INCORRECT;
        };
        let Some(record) = session.rounds.last_mut() else {
            return Evaluation::INCORRECT;
        };
        let evaluation = evaluate(&record.spec, &answer);
        if !record.resolve(answer, evaluation, at, timed_out) {
            return evaluation;
        }
        let domain = record.domain();
        session.aggregator.record(evaluation, domain);
        session.adapt_length(evaluation);
        if let Some(id) = session.response_timer.take() {
            self.timers.cancel(id);
        }
        if debug_log_enabled() {
            log::debug!(
                "round {}/{}: correct={} score={}{}",
                session.round_index + 1,
                session.total_rounds,
                evaluation.correct,
                evaluation.score,
                if timed_out { " (timed out)" } else { "" }
            );
        }

        session.transition(Phase::RoundFeedback);
        let guard = session.guard(epoch);
        let feedback = session.generator.settings().feedback_ms;
        self.timers
            .schedule(at.saturating_add(feedback), TimerKind::FeedbackEnd, guard);
        evaluation
    }

    fn end_feedback(&mut self, at: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.round_index.saturating_add(1) >= session.total_rounds {
            self.complete(at);
        } else {
            session.round_index += 1;
            self.enter_presenting(at);
        }
    }

    fn complete(&mut self, at: u64) {
        self.timers.cancel_all();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.phase.is_terminal() {
            return;
        }
        session.transition(Phase::Complete);

        let duration_ms = session
            .rounds
            .first()
            .map_or(0, |first| at.saturating_sub(first.started_at_ms));
        let result = assemble(ReportInput {
            kind: self.kind,
            difficulty: session.difficulty,
            replay_code: encode_replay_code(self.kind, self.seed),
            aggregator: &session.aggregator,
            planned_rounds: session.total_rounds,
            duration_ms,
            rounds: &session.rounds,
            fallback_rounds: session.generator.fallback_count(),
            map_id: session.generator.map().map(|graph| graph.id().to_string()),
        });
        log::debug!(
            "{} complete: {}/{} ({}% accuracy, {}s)",
            self.kind,
            result.score,
            result.max_score,
            result.accuracy,
            result.duration
        );
        self.reporter.report(&result);
        session.result = Some(result);
    }

    #[must_use]
    pub const fn kind(&self) -> GameKind {
        self.kind
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Use `seed` from the next [`SessionMachine::start`] on.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = canonical_seed(self.kind, seed);
    }

    #[must_use]
    pub fn replay_code(&self) -> String {
        encode_replay_code(self.kind, self.seed)
    }

    /// `Ready` when no session is running.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.session
            .as_ref()
            .map_or(Phase::Ready, |session| session.phase)
    }

    /// Zero-based index of the current round.
    #[must_use]
    pub fn round_index(&self) -> u32 {
        self.session
            .as_ref()
            .map_or(0, |session| session.round_index)
    }

    #[must_use]
    pub fn total_rounds(&self) -> u32 {
        self.session
            .as_ref()
            .map_or(0, |session| session.total_rounds)
    }

    /// Puzzle of the round being presented, answered or reviewed.
    #[must_use]
    pub fn current_spec(&self) -> Option<&PuzzleSpec> {
        let session = self.session.as_ref()?;
        if matches!(session.phase, Phase::Ready | Phase::Complete) {
            return None;
        }
        session.spec.as_ref()
    }

    /// Round history, oldest first.
    #[must_use]
    pub fn rounds(&self) -> &[RoundRecord] {
        self.session
            .as_ref()
            .map_or(&[][..], |session| session.rounds.as_slice())
    }

    /// Taps collected for the current multi-step answer.
    #[must_use]
    pub fn steps_taken(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, |session| session.cursor.taken())
    }

    #[must_use]
    pub fn aggregator(&self) -> Option<&ScoreAggregator> {
        self.session.as_ref().map(|session| &session.aggregator)
    }

    #[must_use]
    pub fn settings(&self) -> Option<&SessionSettings> {
        self.session
            .as_ref()
            .map(|session| session.generator.settings())
    }

    /// The reported result, once `Complete`.
    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.session.as_ref()?.result.as_ref()
    }

    /// When the next pending timer is due, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    #[must_use]
    pub const fn reporter(&self) -> &R {
        &self.reporter
    }
}
