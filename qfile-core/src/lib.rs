//! Библиотека формата Q-file
//!
//! Эталонная реализация бинарного формата журналов океанографического
//! логгера: декодирование, кодирование, слияние и сокращение потоков
//! record'ов. Формат версионирован (v1.2 / v1.3); все байтовые
//! различия версий собраны в [`Layout`].
//!
//! # Быстрый старт
//!
//! ```
//! use std::io::Cursor;
//! use qfile_core::{hexcodes, QReader, QWriter};
//! use qfile_types::{
//!     ChannelRef, DataRecord, FileVersion, HeaderRecord, Payload, Record,
//! };
//!
//! // Пишем минимальный файл в память
//! let header = HeaderRecord::new(FileVersion::V13, 1_700_000_000_000, 512.0);
//! let mut writer = QWriter::new(Cursor::new(Vec::new()), header)?;
//!
//! let pressure = hexcodes::lookup(0x160)?;
//! writer.write_record(&Record::Data(DataRecord::new(
//!     ChannelRef::Known(pressure),
//!     0.5,
//!     Payload::Scalar(12.5),
//! )))?;
//! let raw = writer.finish()?.into_inner();
//!
//! // И читаем его обратно
//! let mut reader = QReader::new(Cursor::new(raw));
//! let records: Vec<_> = reader.by_ref().collect::<Result<_, _>>()?;
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].as_data().unwrap().channel.id(), 0x160);
//! # Ok::<(), qfile_types::QfError>(())
//! ```

pub mod binary;
pub mod config;
pub mod decode;
pub mod encode;
pub mod hexcodes;
pub mod layout;
pub mod merge;
pub mod reduce;

pub use decode::{read_all, QReader, ReadStats};
pub use encode::{QWriter, RecordEncodeExt};
pub use layout::Layout;
pub use merge::{merge_files, Merger};
pub use reduce::{reduce, Decimator, Reducer, ReduceSpec};

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
