use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::schema::Table;
use crate::services::db_models::Record;
use crate::types::StoreError;

/// Repository over the data directory. Every call reads or rewrites one whole
/// table document; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct TableStore {
    data_dir: PathBuf,
}

impl TableStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        TableStore { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_of(&self, table: Table) -> PathBuf {
        self.data_dir.join(table.file_name())
    }

    pub fn load<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let table = R::TABLE;
        let raw = fs::read_to_string(self.path_of(table))
            .map_err(|source| StoreError::Io { table, source })?;
        debug!("Loaded {table} ({} bytes)", raw.len());

        if raw.trim().is_empty() {
            return Ok(vec![]);
        }

        serde_json::from_str(&raw).map_err(|source| StoreError::Parse { table, source })
    }

    /// Like [`TableStore::load`], but a table that was never written loads empty.
    /// Used by appends, which are allowed to create their table.
    pub fn load_or_empty<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        match self.load::<R>() {
            Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                warn!("{} does not exist yet, starting it empty", R::TABLE);
                Ok(vec![])
            }
            other => other,
        }
    }

    pub fn save<R: Record>(&self, records: &[R]) -> Result<(), StoreError> {
        let mut changeset = Changeset::default();
        changeset.stage(records)?;
        self.commit(changeset)
    }

    /// Persists every staged table, or none of them.
    ///
    /// All documents are first written next to their targets. A failure while
    /// staging removes the temp files and leaves every table untouched. The
    /// temp files are then renamed in staging order; if a rename fails, the
    /// tables already replaced are put back from their previous contents.
    pub fn commit(&self, changeset: Changeset) -> Result<(), StoreError> {
        let mut staged: Vec<(Table, PathBuf)> = Vec::with_capacity(changeset.entries.len());

        for (table, body) in &changeset.entries {
            let tmp = self.tmp_path_of(*table);
            if let Err(source) = fs::write(&tmp, body) {
                discard(&staged);
                let _ = fs::remove_file(&tmp);
                return Err(StoreError::Io { table: *table, source });
            }
            staged.push((*table, tmp));
        }

        let mut committed: Vec<(Table, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());

        for (position, (table, tmp)) in staged.iter().enumerate() {
            let target = self.path_of(*table);
            let previous = fs::read(&target).ok();

            if let Err(source) = fs::rename(tmp, &target) {
                self.roll_back(&committed);
                discard(&staged[position..]);
                return Err(StoreError::Commit { table: *table, source });
            }
            committed.push((*table, previous));
        }

        for (table, _) in &committed {
            info!("Persisted {table}");
        }

        Ok(())
    }

    fn roll_back(&self, committed: &[(Table, Option<Vec<u8>>)]) {
        for (table, previous) in committed.iter().rev() {
            let target = self.path_of(*table);
            let restored = match previous {
                Some(bytes) => fs::write(&target, bytes),
                None => fs::remove_file(&target),
            };
            if let Err(err) = restored {
                warn!("Unable to roll back {table}: {err}");
            }
        }
    }

    fn tmp_path_of(&self, table: Table) -> PathBuf {
        self.data_dir.join(format!(".{}.tmp", table.file_name()))
    }
}

fn discard(staged: &[(Table, PathBuf)]) {
    for (_, tmp) in staged {
        let _ = fs::remove_file(tmp);
    }
}

/// Serialized table documents waiting to be written together.
#[derive(Debug, Default)]
pub struct Changeset {
    entries: Vec<(Table, Vec<u8>)>,
}

impl Changeset {
    pub fn stage<R: Record>(&mut self, records: &[R]) -> Result<&mut Self, StoreError> {
        let table = R::TABLE;
        let body = serde_json::to_vec_pretty(records)
            .map_err(|source| StoreError::Serialize { table, source })?;

        match self.entries.iter_mut().find(|(staged, _)| *staged == table) {
            Some(entry) => entry.1 = body,
            None => self.entries.push((table, body)),
        }

        Ok(self)
    }
}
