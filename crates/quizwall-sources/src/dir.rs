//! Local directory pool source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use quizwall_core::error::PoolLoadError;
use quizwall_core::model::Pool;
use quizwall_core::parser::{parse_pool_json, pool_file_name};
use quizwall_core::traits::PoolSource;

/// Reads `<dir>/module-<id>-pool.json` fresh on every fetch.
#[derive(Debug, Clone)]
pub struct DirPoolSource {
    dir: PathBuf,
}

impl DirPoolSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn pool_path(&self, module_id: &str) -> PathBuf {
        self.dir.join(pool_file_name(module_id))
    }
}

#[async_trait]
impl PoolSource for DirPoolSource {
    fn name(&self) -> &str {
        "dir"
    }

    async fn fetch_pool(&self, module_id: &str) -> Result<Pool, PoolLoadError> {
        let path = self.pool_path(module_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PoolLoadError::NotFound(module_id.to_string()));
            }
            Err(e) => {
                return Err(PoolLoadError::Fetch {
                    module_id: module_id.to_string(),
                    message: format!("{}: {e}", path.display()),
                });
            }
        };

        let pool = parse_pool_json(&content, module_id)?;
        tracing::debug!(path = %path.display(), questions = pool.len(), "pool loaded");
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: &str = r#"{"title":"Local","questions":[
        {"id":"l1","prompt":"One?","choices":["a","b","c","d"],"answerIndex":0},
        {"id":"l2","prompt":"Two?","choices":["a","b","c","d"],"answerIndex":3}
    ]}"#;

    #[tokio::test]
    async fn reads_pool_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("module-05-pool.json"), POOL).unwrap();

        let source = DirPoolSource::new(dir.path());
        let pool = source.fetch_pool("05").await.unwrap();
        assert_eq!(pool.title, "Local");
        assert_eq!(pool.len(), 2);
        assert_eq!(source.name(), "dir");
    }

    #[tokio::test]
    async fn picks_up_revisions() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirPoolSource::new(dir.path());
        std::fs::write(source.pool_path("01"), POOL).unwrap();
        assert_eq!(source.fetch_pool("01").await.unwrap().len(), 2);

        std::fs::write(
            source.pool_path("01"),
            r#"{"title":"Revised","questions":[{"id":"r1","prompt":"?","choices":["a","b","c","d"],"answerIndex":1}]}"#,
        )
        .unwrap();
        let pool = source.fetch_pool("01").await.unwrap();
        assert_eq!(pool.title, "Revised");
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn missing_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirPoolSource::new(dir.path());
        assert!(matches!(
            source.fetch_pool("01").await.unwrap_err(),
            PoolLoadError::NotFound(_)
        ));

        std::fs::write(source.pool_path("02"), "{").unwrap();
        assert!(matches!(
            source.fetch_pool("02").await.unwrap_err(),
            PoolLoadError::Malformed { .. }
        ));
    }
}
