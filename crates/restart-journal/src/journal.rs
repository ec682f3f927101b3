use std::path::{Path, PathBuf};

use eval_types::{Pair, PairRecord};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::error::JournalError;
use crate::format::{self, read_header, read_record, write_header, write_record};

/// Append-only binary restart log. The journal is rewritten at the start
/// of each run (§4.2) — construct with [`RestartJournal::create`] for a
/// fresh log, or [`RestartJournal::create_with_prefix`] to seed it with a
/// previously replayed prefix before new evaluations are appended.
pub struct RestartJournal {
    file: Mutex<File>,
    path: PathBuf,
}

impl RestartJournal {
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, JournalError> {
        Self::create_with_prefix(path, &[]).await
    }

    pub async fn create_with_prefix(path: impl Into<PathBuf>, prefix: &[PairRecord]) -> Result<Self, JournalError> {
        let path = path.into();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?;

        let mut buf = Vec::new();
        write_header(&mut buf);
        for record in prefix {
            write_record(&mut buf, record)?;
        }
        file.write_all(&buf).await?;
        file.flush().await?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes and flushes `pair` — called after it has been inserted
    /// into the cache (§4.2's ordering contract).
    pub async fn append(&self, pair: &Pair) -> Result<(), JournalError> {
        let record = PairRecord::from_pair(pair);
        let mut buf = Vec::new();
        write_record(&mut buf, &record)?;
        let mut file = self.file.lock().await;
        file.write_all(&buf).await?;
        file.flush().await?;
        tracing::debug!(eval_id = pair.eval_id, "appended evaluation to restart journal");
        Ok(())
    }

    /// Reads up to `stop_after_k` records (or all, if `None`) from a prior
    /// journal file, for replay into the cache at startup.
    pub async fn replay(path: impl AsRef<Path>, stop_after_k: Option<usize>) -> Result<Vec<PairRecord>, JournalError> {
        let mut file = File::open(path.as_ref()).await?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).await?;

        let mut offset = read_header(&bytes)?;
        let mut records = Vec::new();
        while offset < bytes.len() {
            if let Some(k) = stop_after_k {
                if records.len() >= k {
                    break;
                }
            }
            let (record, consumed) = read_record(&bytes[offset..])?;
            records.push(record);
            offset += consumed;
        }
        Ok(records)
    }
}

pub use format::{MAGIC, VERSION};

#[cfg(test)]
mod tests {
    use super::*;
    use eval_types::{ActiveSet, Response, ResponseData, Variables};

    fn sample_pair(eval_id: eval_types::EvalId, value: f64) -> Pair {
        let set = ActiveSet::values_only(1);
        let response = Response::new_owning(set.clone(), ResponseData::new(vec![value], vec![], vec![]));
        Pair::new(eval_id, "rosenbrock", Variables::new(vec![value], vec![], vec![]), set, response)
    }

    #[tokio::test]
    async fn append_then_replay_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restart.dat");
        let journal = RestartJournal::create(&path).await.unwrap();
        for i in 1..=5 {
            journal.append(&sample_pair(i, i as f64)).await.unwrap();
        }
        let replayed = RestartJournal::replay(&path, None).await.unwrap();
        assert_eq!(replayed.len(), 5);
        assert_eq!(replayed[4].eval_id, 5);
        assert_eq!(replayed[4].response.values, vec![5.0]);
    }

    #[tokio::test]
    async fn replay_stops_after_k() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("restart.dat");
        let journal = RestartJournal::create(&path).await.unwrap();
        for i in 1..=10 {
            journal.append(&sample_pair(i, i as f64)).await.unwrap();
        }
        let replayed = RestartJournal::replay(&path, Some(3)).await.unwrap();
        assert_eq!(replayed.len(), 3);
        assert_eq!(replayed[2].eval_id, 3);
    }

    #[tokio::test]
    async fn create_with_prefix_seeds_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let first_path = dir.path().join("run_a.dat");
        let journal = RestartJournal::create(&first_path).await.unwrap();
        for i in 1..=3 {
            journal.append(&sample_pair(i, i as f64)).await.unwrap();
        }
        let prefix = RestartJournal::replay(&first_path, None).await.unwrap();

        let second_path = dir.path().join("run_b.dat");
        let journal_b = RestartJournal::create_with_prefix(&second_path, &prefix).await.unwrap();
        journal_b.append(&sample_pair(4, 4.0)).await.unwrap();

        let combined = RestartJournal::replay(&second_path, None).await.unwrap();
        assert_eq!(combined.len(), 4);
        assert_eq!(combined[3].eval_id, 4);
    }
}
