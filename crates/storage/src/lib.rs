#![forbid(unsafe_code)]

mod accounts;
mod error;
pub mod password;
mod records;
mod workbook;

pub use accounts::{Account, AccountStore, NewAccount, Session};
pub use error::StoreError;
pub use records::{FlagUpdate, RecordStore, WorkbookImport};
