#![forbid(unsafe_code)]

use crate::StoreError;
use crate::workbook::read_workbook;
use it_core::{DocumentFlag, InternshipRecord, RECORD_COLUMNS, YesNo};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

/// Spreadsheet-style record file (CSV, one header row).
///
/// Every read-modify-write cycle runs under the store's lock and the file is
/// replaced atomically (temp file + rename), so writers sharing one
/// `RecordStore` never lose each other's updates. Writers in other processes
/// are not coordinated.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Outcome of a workbook import.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkbookImport {
    pub imported: usize,
    /// Rows that failed record validation.
    pub skipped: usize,
}

/// Result of writing a verification flag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagUpdate {
    pub record_id: String,
    /// Number of records matching (register number, company). More than one
    /// means the pair is ambiguous; only the first was updated.
    pub matches: usize,
}

impl RecordStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            path,
            lock: Mutex::new(()),
        };
        store.assign_missing_ids()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<InternshipRecord>, StoreError> {
        let _guard = self.guard();
        read_records(&self.path)
    }

    /// Records of one student, in file order. Position in this list is the
    /// ordinal used by [`RecordStore::update_at`].
    pub fn list_for(&self, register_no: &str) -> Result<Vec<InternshipRecord>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|record| record.belongs_to(register_no))
            .collect())
    }

    pub fn get(&self, record_id: &str) -> Result<InternshipRecord, StoreError> {
        self.list()?
            .into_iter()
            .find(|record| record.record_id == record_id)
            .ok_or(StoreError::UnknownRecord)
    }

    /// Appends a row, creating the file when absent. The stored record always
    /// gets a fresh `Record ID`.
    pub fn append(&self, mut record: InternshipRecord) -> Result<InternshipRecord, StoreError> {
        record.validate()?;
        let _guard = self.guard();
        let mut rows = match read_records(&self.path) {
            Ok(rows) => rows,
            Err(StoreError::NotFound) => Vec::new(),
            Err(err) => return Err(err),
        };
        record.record_id = new_record_id();
        rows.push(record.clone());
        write_records(&self.path, &rows)?;
        Ok(record)
    }

    /// Replaces the `ordinal`-th (0-based) record of `register_no`.
    pub fn update_at(
        &self,
        register_no: &str,
        ordinal: usize,
        mut record: InternshipRecord,
    ) -> Result<InternshipRecord, StoreError> {
        record.validate()?;
        if !record.belongs_to(register_no) {
            return Err(StoreError::InvalidInput(
                "register number of the record does not match the addressed student",
            ));
        }
        let _guard = self.guard();
        let mut rows = read_records(&self.path)?;
        let positions = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.belongs_to(register_no))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        let Some(&idx) = positions.get(ordinal) else {
            return Err(StoreError::OrdinalOutOfRange {
                ordinal,
                count: positions.len(),
            });
        };
        record.record_id = rows[idx].record_id.clone();
        rows[idx] = record.clone();
        write_records(&self.path, &rows)?;
        Ok(record)
    }

    pub fn update_by_id(
        &self,
        record_id: &str,
        mut record: InternshipRecord,
    ) -> Result<InternshipRecord, StoreError> {
        record.validate()?;
        let _guard = self.guard();
        let mut rows = read_records(&self.path)?;
        let Some(idx) = rows.iter().position(|row| row.record_id == record_id) else {
            return Err(StoreError::UnknownRecord);
        };
        record.record_id = rows[idx].record_id.clone();
        rows[idx] = record.clone();
        write_records(&self.path, &rows)?;
        Ok(record)
    }

    /// Writes one document flag on the record identified by (register number,
    /// company name).
    pub fn set_flag(
        &self,
        register_no: &str,
        company: &str,
        flag: DocumentFlag,
        value: YesNo,
    ) -> Result<FlagUpdate, StoreError> {
        let _guard = self.guard();
        let mut rows = read_records(&self.path)?;
        let matching = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.belongs_to(register_no) && row.matches_company(company))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        let Some(&idx) = matching.first() else {
            return Err(StoreError::UnknownRecord);
        };
        if matching.len() > 1 {
            warn!(
                register_no,
                company,
                matches = matching.len(),
                "ambiguous record for verification; updating the first match"
            );
        }
        rows[idx].set_flag(flag, value);
        let record_id = rows[idx].record_id.clone();
        write_records(&self.path, &rows)?;
        Ok(FlagUpdate {
            record_id,
            matches: matching.len(),
        })
    }

    /// Seeds an empty record file from a legacy workbook. Refuses to run when
    /// the file already holds rows, so a repeated import cannot duplicate data.
    pub fn import_workbook(&self, workbook: impl AsRef<Path>) -> Result<WorkbookImport, StoreError> {
        let incoming = read_workbook(workbook.as_ref())?;
        let _guard = self.guard();
        match read_records(&self.path) {
            Ok(rows) if !rows.is_empty() => {
                return Err(StoreError::InvalidInput(
                    "record file already has rows; workbook import skipped",
                ));
            }
            Ok(_) | Err(StoreError::NotFound) => {}
            Err(err) => return Err(err),
        }

        let mut outcome = WorkbookImport::default();
        let mut rows = Vec::with_capacity(incoming.len());
        for mut record in incoming {
            if let Err(err) = record.validate() {
                warn!(register_no = %record.register_no, error = %err, "skipping workbook row");
                outcome.skipped += 1;
                continue;
            }
            if record.record_id.trim().is_empty() {
                record.record_id = new_record_id();
            }
            rows.push(record);
        }
        outcome.imported = rows.len();
        write_records(&self.path, &rows)?;
        info!(
            path = %self.path.display(),
            imported = outcome.imported,
            skipped = outcome.skipped,
            "imported workbook"
        );
        Ok(outcome)
    }

    fn assign_missing_ids(&self) -> Result<(), StoreError> {
        let _guard = self.guard();
        let mut rows = match read_records(&self.path) {
            Ok(rows) => rows,
            Err(StoreError::NotFound) => return Ok(()),
            Err(err) => return Err(err),
        };
        let mut assigned = 0usize;
        for row in rows.iter_mut().filter(|row| row.record_id.trim().is_empty()) {
            row.record_id = new_record_id();
            assigned += 1;
        }
        if assigned > 0 {
            write_records(&self.path, &rows)?;
            info!(
                path = %self.path.display(),
                assigned,
                "assigned record ids to legacy rows"
            );
        }
        Ok(())
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

fn read_records(path: &Path) -> Result<Vec<InternshipRecord>, StoreError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound);
        }
        Err(err) => return Err(err.into()),
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let mut rows = Vec::new();
    for (line, row) in reader.deserialize::<InternshipRecord>().enumerate() {
        let row = row.map_err(|err| StoreError::Corrupt(format!("row {}: {err}", line + 2)))?;
        rows.push(row);
    }
    Ok(rows)
}

fn write_records(path: &Path, rows: &[InternshipRecord]) -> Result<(), StoreError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or(StoreError::InvalidInput("record file path has no file name"))?;
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&tmp_path)?;
    writer.write_record(RECORD_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    let file = writer
        .into_inner()
        .map_err(|err| StoreError::Io(err.into_error()))?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
