//! JSON pool parser.
//!
//! Loads question pools from JSON files and directories, and validates them.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::PoolLoadError;
use crate::model::{Pool, CHOICE_COUNT};

/// File name of a module's pool asset.
pub fn pool_file_name(module_id: &str) -> String {
    format!("module-{module_id}-pool.json")
}

/// Inverse of [`pool_file_name`].
pub fn module_id_from_file_name(name: &str) -> Option<&str> {
    name.strip_prefix("module-")?
        .strip_suffix("-pool.json")
        .filter(|id| !id.is_empty())
}

/// Parse a pool document, mapping failures to [`PoolLoadError`].
pub fn parse_pool_json(content: &str, module_id: &str) -> Result<Pool, PoolLoadError> {
    let pool: Pool = serde_json::from_str(content).map_err(|e| PoolLoadError::Malformed {
        module_id: module_id.to_string(),
        message: e.to_string(),
    })?;
    check_pool(&pool, module_id)?;
    Ok(pool)
}

/// Enforce the rules an attempt depends on: at least one question, unique
/// ids, and an answer index inside the choices.
pub fn check_pool(pool: &Pool, module_id: &str) -> Result<(), PoolLoadError> {
    let invalid = |message: String| PoolLoadError::Invalid {
        module_id: module_id.to_string(),
        message,
    };

    if pool.questions.is_empty() {
        return Err(invalid("pool has no questions".into()));
    }

    let mut seen_ids = HashSet::new();
    for q in &pool.questions {
        if !seen_ids.insert(q.id.as_str()) {
            return Err(invalid(format!("duplicate question id: {}", q.id)));
        }
        if q.answer_index >= CHOICE_COUNT {
            return Err(invalid(format!(
                "question {} has answerIndex {} outside 0..{CHOICE_COUNT}",
                q.id, q.answer_index
            )));
        }
    }
    Ok(())
}

/// Parse a single pool file.
pub fn parse_pool(path: &Path) -> Result<Pool> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pool file: {}", path.display()))?;
    let module_id = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(module_id_from_file_name)
        .unwrap_or("?");
    parse_pool_json(&content, module_id)
        .with_context(|| format!("failed to parse pool: {}", path.display()))
}

/// Load every `module-<id>-pool.json` file in `dir`, keyed by module id.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_pool_directory(dir: &Path) -> Result<BTreeMap<String, Pool>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut pools = BTreeMap::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        let Some(module_id) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(module_id_from_file_name)
            .map(str::to_string)
        else {
            continue;
        };
        match parse_pool(&path) {
            Ok(pool) => {
                pools.insert(module_id, pool);
            }
            Err(e) => {
                tracing::warn!("skipping {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(pools)
}

/// A warning from pool validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a pool for authoring issues that do not block an attempt.
pub fn validate_pool(pool: &Pool) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |id: &str, message: String| {
        warnings.push(ValidationWarning {
            question_id: Some(id.to_string()),
            message,
        });
    };

    for q in &pool.questions {
        if q.prompt.trim().is_empty() {
            warn(&q.id, "prompt is empty".into());
        }
        if q.choices.iter().any(|c| c.trim().is_empty()) {
            warn(&q.id, "a choice is empty".into());
        }
        let distinct: HashSet<&str> = q.choices.iter().map(String::as_str).collect();
        if distinct.len() < CHOICE_COUNT {
            warn(&q.id, "choices are not distinct".into());
        }
        if q.explain_correct.trim().is_empty() {
            warn(&q.id, "explainCorrect is missing".into());
        }
        if q.explain_incorrect.contains_key(&q.answer_index) {
            warn(
                &q.id,
                "explainIncorrect has an entry for the correct answer; it is never shown".into(),
            );
        }
        let missing: Vec<usize> = (0..CHOICE_COUNT)
            .filter(|i| *i != q.answer_index && !q.explain_incorrect.contains_key(i))
            .collect();
        if !missing.is_empty() {
            warn(
                &q.id,
                format!("explainIncorrect is missing options {missing:?}"),
            );
        }
        if let Some(key) = q.explain_incorrect.keys().find(|k| **k >= CHOICE_COUNT) {
            warn(&q.id, format!("explainIncorrect key {key} is out of range"));
        }
    }

    if pool.title.trim().is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "pool title is empty".into(),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_POOL: &str = r#"{
  "title": "Module 01: Networking",
  "questions": [
    {
      "id": "net-01",
      "prompt": "Which layer routes packets?",
      "choices": ["Physical", "Network", "Session", "Application"],
      "answerIndex": 1,
      "tags": ["osi"],
      "explainCorrect": "The network layer handles routing.",
      "explainIncorrect": {
        "0": "The physical layer moves bits.",
        "2": "The session layer manages dialogs.",
        "3": "The application layer serves users."
      }
    },
    {
      "id": "net-02",
      "prompt": "What does DNS resolve?",
      "choices": ["Names to addresses", "MACs to ports", "Ports to names", "Routes to hosts"],
      "answerIndex": 0,
      "tags": ["dns"],
      "explainCorrect": "DNS maps names to IP addresses.",
      "explainIncorrect": {"1": "That is not DNS.", "2": "Nope.", "3": "Routing is separate."}
    }
  ]
}"#;

    #[test]
    fn file_names() {
        assert_eq!(pool_file_name("03"), "module-03-pool.json");
        assert_eq!(module_id_from_file_name("module-03-pool.json"), Some("03"));
        assert_eq!(module_id_from_file_name("module--pool.json"), None);
        assert_eq!(module_id_from_file_name("notes.json"), None);
    }

    #[test]
    fn parse_valid_pool() {
        let pool = parse_pool_json(VALID_POOL, "01").unwrap();
        assert_eq!(pool.title, "Module 01: Networking");
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.questions[0].answer_index, 1);
        assert!(validate_pool(&pool).is_empty());
    }

    #[test]
    fn parse_malformed_pool() {
        let err = parse_pool_json("{ not json", "01").unwrap_err();
        assert!(matches!(err, PoolLoadError::Malformed { .. }));
    }

    #[test]
    fn reject_empty_and_out_of_range() {
        let err = parse_pool_json(r#"{"title":"t","questions":[]}"#, "01").unwrap_err();
        assert!(err.to_string().contains("no questions"));

        let bad = VALID_POOL.replace(r#""answerIndex": 0"#, r#""answerIndex": 4"#);
        let err = parse_pool_json(&bad, "01").unwrap_err();
        assert!(err.to_string().contains("answerIndex 4"));
    }

    #[test]
    fn reject_duplicate_ids() {
        let dupes = VALID_POOL.replace("net-02", "net-01");
        let err = parse_pool_json(&dupes, "01").unwrap_err();
        assert!(err.to_string().contains("duplicate question id: net-01"));
    }

    #[test]
    fn validate_flags_authoring_gaps() {
        let mut pool = parse_pool_json(VALID_POOL, "01").unwrap();
        pool.questions[0].explain_correct.clear();
        pool.questions[0]
            .explain_incorrect
            .insert(1, "explains the right answer".into());
        pool.questions[1].explain_incorrect.remove(&2);

        let warnings = validate_pool(&pool);
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("explainCorrect")));
        assert!(warnings.iter().any(|w| w.message.contains("never shown")));
        assert!(warnings
            .iter()
            .any(|w| w.question_id.as_deref() == Some("net-02") && w.message.contains("[2]")));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("module-01-pool.json"), VALID_POOL).unwrap();
        std::fs::write(dir.path().join("module-02-pool.json"), "{ broken").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let pools = load_pool_directory(dir.path()).unwrap();
        assert_eq!(pools.len(), 1);
        assert_eq!(pools["01"].len(), 2);
    }

    #[test]
    fn load_directory_requires_directory() {
        assert!(load_pool_directory(Path::new("definitely/not/here")).is_err());
    }
}
