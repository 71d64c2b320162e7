//! Services wrapping the analysis engine: persistence, CSV, email and the upload workflow

pub mod analysis;
pub mod csv_io;
pub mod dispatch;
pub mod email;
pub mod fingerprint_store;
pub mod history_store;
pub mod receiver;
pub mod run_store;
pub mod storage;

pub use analysis::AnalysisService;
pub use dispatch::DispatchQueue;
pub use email::{EmailFailure, Mailer, SmtpMailer};
