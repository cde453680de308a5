//! Service modules for the batch enhancement workflow

pub mod batch;
pub mod ledger;
pub mod transfer;
pub mod worker;

pub use batch::run_batch;
pub use ledger::{JobLedger, LedgerError};
pub use transfer::{ApiTransferClient, PollOutcome, Transfer, TransferError};
pub use worker::{EnhanceError, WorkerPolicy, COMPRESSED_EXTENSIONS, SUPPORTED_EXTENSIONS};
