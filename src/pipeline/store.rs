//! Persistence for checkpoints and self-play examples.
//!
//! Checkpoints are addressed by iteration index. Example batches are
//! addressed by `(iteration, start_offset, worker)`, so every retry of an
//! iteration adds files next to the earlier ones instead of replacing them,
//! and `load_examples` returns everything gathered for an iteration.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::StoreError;
use crate::training::TrainingExample;

/// Storage for evaluator checkpoints and example batches.
pub trait CheckpointStore<E> {
    /// Store `evaluator` as the checkpoint for `iteration`, replacing any
    /// previous one.
    fn save_checkpoint(&mut self, iteration: u32, evaluator: &E) -> Result<(), StoreError>;

    /// Load the checkpoint for `iteration`.
    fn load_checkpoint(&self, iteration: u32) -> Result<E, StoreError>;

    /// Whether a checkpoint exists for `iteration`.
    fn has_checkpoint(&self, iteration: u32) -> bool;

    /// Store one worker's examples from the batch at `start_offset`.
    fn save_examples(
        &mut self,
        iteration: u32,
        start_offset: u64,
        worker: usize,
        examples: &[TrainingExample],
    ) -> Result<(), StoreError>;

    /// Every example stored for `iteration`, ordered by start offset and
    /// then worker.
    fn load_examples(&self, iteration: u32) -> Result<Vec<TrainingExample>, StoreError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Store that keeps everything in memory. Used in tests and for runs that
/// do not need to survive a restart.
#[derive(Clone, Debug)]
pub struct MemoryStore<E> {
    checkpoints: BTreeMap<u32, E>,
    examples: BTreeMap<(u32, u64, usize), Vec<TrainingExample>>,
}

impl<E> Default for MemoryStore<E> {
    fn default() -> Self {
        Self {
            checkpoints: BTreeMap::new(),
            examples: BTreeMap::new(),
        }
    }
}

impl<E> MemoryStore<E> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterations that have a checkpoint, ascending.
    pub fn checkpoint_iterations(&self) -> Vec<u32> {
        self.checkpoints.keys().copied().collect()
    }

    /// `(start_offset, worker)` keys of the batches stored for `iteration`.
    pub fn example_batches(&self, iteration: u32) -> Vec<(u64, usize)> {
        self.examples
            .range((iteration, 0, 0)..=(iteration, u64::MAX, usize::MAX))
            .map(|(&(_, offset, worker), _)| (offset, worker))
            .collect()
    }
}

impl<E: Clone> CheckpointStore<E> for MemoryStore<E> {
    fn save_checkpoint(&mut self, iteration: u32, evaluator: &E) -> Result<(), StoreError> {
        self.checkpoints.insert(iteration, evaluator.clone());
        Ok(())
    }

    fn load_checkpoint(&self, iteration: u32) -> Result<E, StoreError> {
        self.checkpoints
            .get(&iteration)
            .cloned()
            .ok_or(StoreError::MissingCheckpoint(iteration))
    }

    fn has_checkpoint(&self, iteration: u32) -> bool {
        self.checkpoints.contains_key(&iteration)
    }

    fn save_examples(
        &mut self,
        iteration: u32,
        start_offset: u64,
        worker: usize,
        examples: &[TrainingExample],
    ) -> Result<(), StoreError> {
        self.examples
            .insert((iteration, start_offset, worker), examples.to_vec());
        Ok(())
    }

    fn load_examples(&self, iteration: u32) -> Result<Vec<TrainingExample>, StoreError> {
        Ok(self
            .examples
            .range((iteration, 0, 0)..=(iteration, u64::MAX, usize::MAX))
            .flat_map(|(_, batch)| batch.iter().cloned())
            .collect())
    }
}

// =============================================================================
// File store
// =============================================================================

/// Store backed by bincode files in one directory.
///
/// Layout:
/// - `checkpoint_iter{N}.bin`
/// - `examples_iter{I}_start{O}_worker{W}.bin`
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            operation: "create",
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the checkpoint file for `iteration`.
    #[must_use]
    pub fn checkpoint_path(&self, iteration: u32) -> PathBuf {
        self.dir.join(format!("checkpoint_iter{iteration}.bin"))
    }

    /// Path of one worker's example file.
    #[must_use]
    pub fn examples_path(&self, iteration: u32, start_offset: u64, worker: usize) -> PathBuf {
        self.dir
            .join(format!("examples_iter{iteration}_start{start_offset}_worker{worker}.bin"))
    }

    /// Write to a temporary file and rename it into place so readers never
    /// see a partial file.
    fn write<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let tmp = path.with_extension("bin.tmp");
        let io_err = |operation, source| StoreError::Io {
            operation,
            path: tmp.clone(),
            source,
        };

        let file = File::create(&tmp).map_err(|e| io_err("create", e))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, value).map_err(|source| StoreError::Codec {
            path: tmp.clone(),
            source,
        })?;
        writer.flush().map_err(|e| io_err("write", e))?;
        drop(writer);

        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            operation: "rename",
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Wrote store file");
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StoreError> {
        let file = File::open(path).map_err(|source| StoreError::Io {
            operation: "open",
            path: path.to_path_buf(),
            source,
        })?;
        bincode::deserialize_from(BufReader::new(file)).map_err(|source| StoreError::Codec {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `(start_offset, worker, path)` for every example file of `iteration`,
    /// sorted by offset then worker.
    fn example_files(&self, iteration: u32) -> Result<Vec<(u64, usize, PathBuf)>, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
            operation: "list",
            path: self.dir.clone(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                operation: "list",
                path: self.dir.clone(),
                source,
            })?;
            let name = entry.file_name();
            if let Some((iter, offset, worker)) = name.to_str().and_then(parse_examples_name) {
                if iter == iteration {
                    files.push((offset, worker, entry.path()));
                }
            }
        }
        files.sort_by_key(|(offset, worker, _)| (*offset, *worker));
        Ok(files)
    }
}

/// Parse `examples_iter{I}_start{O}_worker{W}.bin`.
fn parse_examples_name(name: &str) -> Option<(u32, u64, usize)> {
    let rest = name.strip_prefix("examples_iter")?.strip_suffix(".bin")?;
    let (iter, rest) = rest.split_once("_start")?;
    let (offset, worker) = rest.split_once("_worker")?;
    Some((iter.parse().ok()?, offset.parse().ok()?, worker.parse().ok()?))
}

impl<E: Serialize + DeserializeOwned> CheckpointStore<E> for FileStore {
    fn save_checkpoint(&mut self, iteration: u32, evaluator: &E) -> Result<(), StoreError> {
        self.write(&self.checkpoint_path(iteration), evaluator)
    }

    fn load_checkpoint(&self, iteration: u32) -> Result<E, StoreError> {
        let path = self.checkpoint_path(iteration);
        if !path.exists() {
            return Err(StoreError::MissingCheckpoint(iteration));
        }
        self.read(&path)
    }

    fn has_checkpoint(&self, iteration: u32) -> bool {
        self.checkpoint_path(iteration).exists()
    }

    fn save_examples(
        &mut self,
        iteration: u32,
        start_offset: u64,
        worker: usize,
        examples: &[TrainingExample],
    ) -> Result<(), StoreError> {
        self.write(&self.examples_path(iteration, start_offset, worker), examples)
    }

    fn load_examples(&self, iteration: u32) -> Result<Vec<TrainingExample>, StoreError> {
        let mut examples = Vec::new();
        for (_, _, path) in self.example_files(iteration)? {
            let mut batch: Vec<TrainingExample> = self.read(&path)?;
            examples.append(&mut batch);
        }
        Ok(examples)
    }
}
