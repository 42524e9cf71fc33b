//! Event loop for an interactive attempt.
//!
//! Learner commands arrive on an mpsc channel; a 1 s interval drives the
//! countdown. Both paths end in the same idempotent [`Attempt::submit`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::attempt::{Attempt, AttemptPhase, TickOutcome};
use crate::error::StoreError;

/// Countdown resolution.
pub const TICK: Duration = Duration::from_secs(1);

/// A learner action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptCommand {
    Select { question_id: String, index: usize },
    Submit,
}

/// How [`run_attempt`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The attempt was submitted, by the learner or the countdown.
    Evaluated,
    /// The command channel closed first; nothing was recorded.
    Abandoned,
    /// The module was locked; no commands were read.
    Locked,
}

/// Drive `attempt` until it is evaluated or the learner goes away.
///
/// `on_tick` sees the remaining seconds after every countdown step that does
/// not end the attempt.
pub async fn run_attempt<F>(
    attempt: &mut Attempt,
    commands: &mut mpsc::Receiver<AttemptCommand>,
    mut on_tick: F,
) -> Result<DriveOutcome, StoreError>
where
    F: FnMut(u32),
{
    if attempt.phase() == AttemptPhase::Locked {
        return Ok(DriveOutcome::Locked);
    }

    let mut ticker = interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if attempt.phase() == AttemptPhase::Evaluated {
            return Ok(DriveOutcome::Evaluated);
        }

        tokio::select! {
            _ = ticker.tick(), if attempt.has_timer() => {
                if let TickOutcome::Running { remaining } = attempt.tick()? {
                    on_tick(remaining);
                }
            }
            command = commands.recv() => match command {
                Some(AttemptCommand::Select { question_id, index }) => {
                    if !attempt.select_answer(&question_id, index) {
                        tracing::debug!(%question_id, index, "selection ignored");
                    }
                }
                Some(AttemptCommand::Submit) => {
                    attempt.submit(false)?;
                }
                None => {
                    tracing::info!(module_id = attempt.module_id(), "attempt abandoned");
                    return Ok(DriveOutcome::Abandoned);
                }
            },
        }
    }
}
