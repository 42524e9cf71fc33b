//! The `quizwall init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create quizwall.toml
    if std::path::Path::new("quizwall.toml").exists() {
        println!("quizwall.toml already exists, skipping.");
    } else {
        std::fs::write("quizwall.toml", SAMPLE_CONFIG)?;
        println!("Created quizwall.toml");
    }

    // Create sample pool
    std::fs::create_dir_all("pools")?;
    let pool_path = std::path::Path::new("pools/module-01-pool.json");
    if pool_path.exists() {
        println!("pools/module-01-pool.json already exists, skipping.");
    } else {
        std::fs::write(pool_path, SAMPLE_POOL)?;
        println!("Created pools/module-01-pool.json");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizwall.toml with your course id and modules");
    println!("  2. Run: quizwall validate --pool pools");
    println!("  3. Run: quizwall take --module 01");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizwall configuration

course = "DEMO"
modules = ["01"]
data_dir = "./quizwall-data"

[pool]
type = "dir"
path = "./pools"

# Or serve pools over HTTP:
# [pool]
# type = "http"
# base_url = "${QUIZWALL_POOL_URL}"

[defaults]
attempt_limit = 3
mastery_pct = 80
time_limit_seconds = 0

# [modules_overrides.01]
# pick_count = 4
# time_limit_seconds = 300
"#;

const SAMPLE_POOL: &str = r#"{
  "title": "Module 01: Getting started",
  "questions": [
    {
      "id": "m01-q01",
      "prompt": "What does a seed make reproducible?",
      "choices": ["The question order", "The score", "The time limit", "The course id"],
      "answerIndex": 0,
      "tags": ["basics"],
      "explainCorrect": "The same seed always yields the same questions in the same order.",
      "explainIncorrect": {
        "1": "The score depends on your answers.",
        "2": "The time limit comes from configuration.",
        "3": "The course id comes from configuration."
      }
    },
    {
      "id": "m01-q02",
      "prompt": "What score completes a module by default?",
      "choices": ["50%", "70%", "80%", "100%"],
      "answerIndex": 2,
      "tags": ["basics"],
      "explainCorrect": "The default mastery threshold is 80%.",
      "explainIncorrect": {
        "0": "Too low; the default is 80%.",
        "1": "Close, but the default is 80%.",
        "3": "A perfect score is not required."
      }
    },
    {
      "id": "m01-q03",
      "prompt": "How many attempts are allowed by default before a module locks?",
      "choices": ["1", "2", "3", "Unlimited"],
      "answerIndex": 2,
      "tags": ["basics"],
      "explainCorrect": "Three attempts, unless the module is completed first.",
      "explainIncorrect": {
        "0": "More than one attempt is allowed.",
        "1": "One more than that.",
        "3": "Attempts are limited until the module is completed."
      }
    },
    {
      "id": "m01-q04",
      "prompt": "What happens when the countdown reaches zero?",
      "choices": ["Nothing", "The attempt is discarded", "The attempt is submitted", "The timer restarts"],
      "answerIndex": 2,
      "tags": ["timer"],
      "explainCorrect": "The attempt is submitted with whatever answers were chosen.",
      "explainIncorrect": {
        "0": "The attempt does not keep running.",
        "1": "Timed-out attempts still count.",
        "3": "The timer runs once per attempt."
      }
    }
  ]
}
"#;
