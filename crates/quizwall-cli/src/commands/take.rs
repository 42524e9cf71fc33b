//! The `quizwall take` command.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;

use quizwall_core::attempt::{Attempt, AttemptPhase, Evaluation};
use quizwall_core::driver::{run_attempt, AttemptCommand, DriveOutcome};
use quizwall_core::model::{parse_choice, ShuffledQuestion};
use quizwall_core::statistics::format_duration;
use quizwall_sources::create_pool_source;

use super::Workspace;

pub async fn execute(
    config_path: Option<PathBuf>,
    module_id: String,
    seed: Option<u32>,
) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    ws.require_module(&module_id)?;

    let settings = ws.config.settings_for(&module_id);
    let source = create_pool_source(&ws.config.pool)?;
    let mut attempt = Attempt::start(
        &module_id,
        settings,
        source.as_ref(),
        ws.store.clone(),
        seed,
    )
    .await?;

    if attempt.phase() == AttemptPhase::Locked {
        let prior = attempt.prior_record();
        anyhow::bail!(
            "module {module_id} is locked: {} of {} attempts used without reaching {}%",
            prior.attempts,
            attempt.settings().attempt_limit,
            attempt.settings().mastery_pct
        );
    }

    print_attempt(&attempt);

    let ids: Vec<String> = attempt.questions().iter().map(|q| q.id.clone()).collect();
    let (tx, mut rx) = mpsc::channel(16);
    spawn_stdin_reader(ids, tx);

    let outcome = run_attempt(&mut attempt, &mut rx, |remaining| {
        if remaining % 60 == 0 || remaining <= 10 {
            eprintln!("  {} left", format_duration(u64::from(remaining)));
        }
    })
    .await?;

    match outcome {
        DriveOutcome::Evaluated => {
            if let Some(evaluation) = attempt.evaluation() {
                print_evaluation(&attempt, evaluation);
            }
        }
        DriveOutcome::Abandoned => {
            println!("\nAttempt abandoned; nothing was recorded.");
        }
        DriveOutcome::Locked => {
            anyhow::bail!("module {module_id} is locked");
        }
    }

    Ok(())
}

fn print_attempt(attempt: &Attempt) {
    let settings = attempt.settings();
    println!(
        "Module {}: attempt {} of {} (seed {})",
        attempt.module_id(),
        attempt.prior_record().attempts + 1,
        settings.attempt_limit,
        attempt.seed()
    );
    if settings.has_timer() {
        println!(
            "Time limit: {}",
            format_duration(u64::from(settings.time_limit_seconds))
        );
    }
    println!();

    for (n, q) in attempt.questions().iter().enumerate() {
        print_question(n + 1, q);
    }

    println!("Answer with `<question> <option>` (e.g. `2 b`), then `submit`.");
    println!("End input (Ctrl-D) to abandon without recording.");
}

fn print_question(number: usize, question: &ShuffledQuestion) {
    println!("{number}. {}", question.prompt);
    for i in 0..question.choices.len() {
        if let Some(line) = question.labeled_choice(i) {
            println!("   {line}");
        }
    }
    println!();
}

fn print_evaluation(attempt: &Attempt, evaluation: &Evaluation) {
    let record = &evaluation.record;
    println!();
    if record.auto_submit {
        println!("Time is up; the attempt was submitted automatically.");
    }
    println!(
        "Score: {}% ({}/{}) in {}",
        record.score_pct,
        record.correct,
        record.total,
        format_duration(record.elapsed_sec)
    );
    println!();

    for (n, f) in evaluation.feedback.iter().enumerate() {
        let mark = if f.ok { "correct" } else { "incorrect" };
        let chosen = f
            .chosen_label
            .map(String::from)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}. [{mark}] chosen {chosen}, answer {}: {}",
            n + 1,
            f.correct_label,
            f.explanation
        );
    }
    println!();

    let module = &evaluation.module;
    if evaluation.mastered {
        println!("Module {} completed.", attempt.module_id());
    } else if module.completed {
        println!(
            "Below {}% this time; the module stays completed.",
            attempt.settings().mastery_pct
        );
    } else {
        match module.attempts_remaining(attempt.settings()) {
            Some(0) => println!(
                "Below {}%. No attempts left; module {} is locked.",
                attempt.settings().mastery_pct,
                attempt.module_id()
            ),
            Some(left) => println!(
                "Below {}%. {left} attempt(s) left.",
                attempt.settings().mastery_pct
            ),
            None => {}
        }
    }
}

/// Read learner input on a dedicated thread so a pending read never holds up
/// runtime shutdown.
fn spawn_stdin_reader(ids: Vec<String>, tx: mpsc::Sender<AttemptCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line, &ids) {
                Ok(Some(command)) => {
                    let submit = command == AttemptCommand::Submit;
                    if tx.blocking_send(command).is_err() || submit {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("  {message}"),
            }
        }
    });
}

/// Parse one input line: `<question number> <option>` or `submit`.
fn parse_command(line: &str, ids: &[String]) -> Result<Option<AttemptCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.eq_ignore_ascii_case("submit") || line.eq_ignore_ascii_case("s") {
        return Ok(Some(AttemptCommand::Submit));
    }

    let mut parts = line.split_whitespace();
    let (Some(number), Some(option), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("expected `<question> <option>` or `submit`, got `{line}`"));
    };

    let question_id = number
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| ids.get(i))
        .ok_or_else(|| format!("no question {number} (1-{})", ids.len()))?;
    let index = parse_choice(option)
        .ok_or_else(|| format!("unknown option `{option}` (use A-D)"))?;

    Ok(Some(AttemptCommand::Select {
        question_id: question_id.clone(),
        index,
    }))
}
