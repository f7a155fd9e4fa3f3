//! Trace sinks - where finished episodes are written
//!
//! The sink abstraction keeps storage out of the agent loop. `LocalFsSink`
//! writes to `<base>/<episode-id>/trace.json` and `program.txt`.

use crate::episode::EpisodeId;
use crate::trace::ProgramTrace;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

#[async_trait::async_trait]
pub trait TraceSink: Send + Sync {
    async fn write_trace(&self, id: &EpisodeId, trace: &ProgramTrace) -> Result<()>;

    async fn read_trace(&self, id: &EpisodeId) -> Result<ProgramTrace>;

    /// Physical path/URI of an episode's artifacts (for human inspection).
    fn location(&self, id: &EpisodeId) -> String;
}

pub struct LocalFsSink {
    base_dir: PathBuf,
}

impl LocalFsSink {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn episode_dir(&self, id: &EpisodeId) -> PathBuf {
        self.base_dir.join(id.as_str())
    }
}

#[async_trait::async_trait]
impl TraceSink for LocalFsSink {
    async fn write_trace(&self, id: &EpisodeId, trace: &ProgramTrace) -> Result<()> {
        let dir = self.episode_dir(id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;

        let json = trace.to_json()?;
        tokio::fs::write(dir.join("trace.json"), json.as_bytes()).await?;
        tokio::fs::write(dir.join("program.txt"), trace.to_program().as_bytes()).await?;
        tracing::debug!("wrote trace {} ({} steps)", dir.display(), trace.steps.len());
        Ok(())
    }

    async fn read_trace(&self, id: &EpisodeId) -> Result<ProgramTrace> {
        let path = self.episode_dir(id).join("trace.json");
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(ProgramTrace::from_json(&text)?)
    }

    fn location(&self, id: &EpisodeId) -> String {
        self.episode_dir(id).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::EpisodeStatus;

    fn trace() -> ProgramTrace {
        ProgramTrace {
            question: "q".into(),
            seeds: vec![],
            steps: vec![],
            final_answer: None,
            status: EpisodeStatus::Aborted,
            abort_reason: Some(crate::episode::AbortReason::Cancelled),
            failure: None,
        }
    }

    #[tokio::test]
    async fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalFsSink::new(dir.path());
        let id = EpisodeId::from("ep-1");
        sink.write_trace(&id, &trace()).await.unwrap();

        assert_eq!(sink.read_trace(&id).await.unwrap(), trace());
        let program = std::fs::read_to_string(dir.path().join("ep-1/program.txt")).unwrap();
        assert!(program.contains("# aborted: cancelled"));
        assert!(sink.location(&id).ends_with("ep-1"));
    }

    #[tokio::test]
    async fn missing_trace_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let sink = LocalFsSink::new(dir.path());
        assert!(sink.read_trace(&EpisodeId::from("nope")).await.is_err());
    }
}
