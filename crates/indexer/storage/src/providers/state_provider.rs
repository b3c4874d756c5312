//! Provider for analysis pointers and the key-value cache.

use super::column;
use crate::{
    StorageError, Table,
    models::{decode, encode},
};
use burnwatch_types::AnalysisState;
use rocksdb::{DB, IteratorMode, WriteBatch};
use serde_json::Value;
use tracing::debug;

pub(crate) struct StateProvider<'db> {
    db: &'db DB,
}

impl<'db> StateProvider<'db> {
    pub(crate) const fn new(db: &'db DB) -> Self {
        Self { db }
    }

    pub(crate) fn analysis_state(&self, key: &str) -> Result<Option<AnalysisState>, StorageError> {
        let cf = column(self.db, Table::AnalysisState)?;
        self.db.get_cf(cf, key.as_bytes())?.map(|bytes| decode(&bytes)).transpose()
    }

    pub(crate) fn stage_analysis_state(
        &self,
        batch: &mut WriteBatch,
        state: &AnalysisState,
    ) -> Result<(), StorageError> {
        batch.put_cf(column(self.db, Table::AnalysisState)?, state.key.as_bytes(), encode(state)?);
        Ok(())
    }

    pub(crate) fn stage_delete_analysis_state(
        &self,
        batch: &mut WriteBatch,
        key: &str,
    ) -> Result<(), StorageError> {
        batch.delete_cf(column(self.db, Table::AnalysisState)?, key.as_bytes());
        Ok(())
    }

    /// Stages moving every pointer past `last` back to `last`.
    pub(crate) fn stage_clamp_pointers(
        &self,
        batch: &mut WriteBatch,
        last: u64,
    ) -> Result<(), StorageError> {
        let cf = column(self.db, Table::AnalysisState)?;
        for entry in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = entry?;
            let mut state: AnalysisState = decode(&value)?;
            if state.last > last {
                debug!(
                    target: "storage",
                    key = %state.key,
                    from = state.last,
                    to = last,
                    "Moving analysis pointer back"
                );
                state.last = last;
                self.stage_analysis_state(batch, &state)?;
            }
        }
        Ok(())
    }

    pub(crate) fn get_value(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let cf = column(self.db, Table::KeyValueStore)?;
        self.db.get_cf(cf, key.as_bytes())?.map(|bytes| decode(&bytes)).transpose()
    }

    pub(crate) fn stage_value(
        &self,
        batch: &mut WriteBatch,
        key: &str,
        value: &Value,
    ) -> Result<(), StorageError> {
        batch.put_cf(column(self.db, Table::KeyValueStore)?, key.as_bytes(), encode(value)?);
        Ok(())
    }
}
