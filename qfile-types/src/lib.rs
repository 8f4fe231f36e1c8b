//! Общие типы формата Q-file.
//!
//! Крейт содержит только данные: записи, каналы, значения конфигурации
//! и таксономию ошибок. Вся логика кодирования/декодирования живёт в
//! `qfile-core`.

pub mod channel;
pub mod config;
pub mod data;
pub mod error;
pub mod header;
pub mod record;
pub mod version;

pub use channel::*;
pub use config::*;
pub use data::*;
pub use error::*;
pub use header::*;
pub use record::*;
pub use version::*;
