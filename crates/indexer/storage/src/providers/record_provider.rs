//! Provider for the burn record leaderboards.

use super::column;
use crate::{
    StorageError, Table,
    models::{burn_record_key, burn_record_upper_bound, decode, encode},
};
use burnwatch_types::{BurnRecord, TimeFrame};
use rocksdb::{DB, Direction, IteratorMode, WriteBatch};

pub(crate) struct BurnRecordProvider<'db> {
    db: &'db DB,
}

impl<'db> BurnRecordProvider<'db> {
    pub(crate) const fn new(db: &'db DB) -> Self {
        Self { db }
    }

    pub(crate) fn burn_records(
        &self,
        time_frame: TimeFrame,
    ) -> Result<Vec<BurnRecord>, StorageError> {
        let cf = column(self.db, Table::BurnRecords)?;
        let start = burn_record_key(time_frame, 0);
        let mut records = Vec::new();
        for entry in self.db.iterator_cf(cf, IteratorMode::From(&start, Direction::Forward)) {
            let (key, value) = entry?;
            if key.first() != Some(&time_frame.tag()) {
                break;
            }
            records.push(decode::<BurnRecord>(&value)?);
        }
        records.sort_by(BurnRecord::rank_cmp);
        Ok(records)
    }

    pub(crate) fn stage_replace(
        &self,
        batch: &mut WriteBatch,
        records: &[BurnRecord],
    ) -> Result<(), StorageError> {
        self.stage_delete_from(batch, 0)?;
        let cf = column(self.db, Table::BurnRecords)?;
        for record in records {
            let key = burn_record_key(record.time_frame, record.block_number);
            batch.put_cf(cf, key, encode(record)?);
        }
        Ok(())
    }

    pub(crate) fn stage_delete_from(
        &self,
        batch: &mut WriteBatch,
        from: u64,
    ) -> Result<(), StorageError> {
        let cf = column(self.db, Table::BurnRecords)?;
        for time_frame in TimeFrame::ALL {
            batch.delete_range_cf(
                cf,
                burn_record_key(time_frame, from).as_slice(),
                burn_record_upper_bound(time_frame).as_slice(),
            );
        }
        Ok(())
    }
}
