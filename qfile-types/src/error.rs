use thiserror::Error;

use crate::version::FileVersion;

/// Результат для операций qfile
pub type QfResult<T> = std::result::Result<T, QfError>;

/// Синтаксическая ошибка в текстовом блоке конфигурации.
///
/// Номер строки считается с 1; `excerpt` — обрезанный исходный текст
/// строки для диагностики.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config syntax error at line {line}: {excerpt:?}")]
pub struct ConfigSyntaxError {
    pub line: usize,
    pub excerpt: String,
}

/// Типы ошибок формата Q-file.
#[derive(Debug, Error)]
pub enum QfError {
    /// Повреждённый или усечённый заголовочный record (фатально)
    #[error("malformed header at byte {offset}: {reason}")]
    MalformedHeader { offset: u64, reason: String },

    /// EOF внутри record'а — хвост файла обрезан (фатально)
    #[error("truncated record #{index} at byte {offset}: needed {needed} bytes, got {got}")]
    TruncatedRecord {
        index: u64,
        offset: u64,
        needed: usize,
        got: usize,
    },

    /// Структурное нарушение внутри record'а, например скалярный канал
    /// с не-единичным payload (фатально)
    #[error("malformed record #{index} at byte {offset}: {reason}")]
    MalformedRecord {
        index: u64,
        offset: u64,
        reason: String,
    },

    /// Грамматическая ошибка конфигурации (восстановимо: затрагивает
    /// только этот record, поток продолжается)
    #[error("malformed config in record #{index}: {source}")]
    MalformedConfig {
        index: u64,
        #[source]
        source: ConfigSyntaxError,
    },

    /// Неизвестный тег record'а; содержимое пропущено по объявленной
    /// длине (восстановимо)
    #[error("unexpected record tag {tag:#06x} in record #{index} at byte {offset}")]
    UnexpectedTag { index: u64, offset: u64, tag: u16 },

    /// Идентификатор канала отсутствует в таблице hex-кодов
    #[error("unknown channel identifier {0:#06x}")]
    UnknownChannel(u16),

    /// Версии входных потоков не совпадают (фатально, до вывода)
    #[error("version conflict: stream {stream} is v{found}, expected v{expected}")]
    VersionConflict {
        stream: usize,
        expected: FileVersion,
        found: FileVersion,
    },

    /// Слияние вызвано без входных потоков
    #[error("no input streams to merge")]
    NoInputStreams,

    /// Record структурно не выразим в целевом layout'е
    #[error("incompatible layout: {0}")]
    IncompatibleLayout(String),

    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QfError {
    /// Удобные конструкторы
    pub fn malformed_header<S: Into<String>>(offset: u64, reason: S) -> Self {
        Self::MalformedHeader {
            offset,
            reason: reason.into(),
        }
    }

    pub fn malformed_record<S: Into<String>>(index: u64, offset: u64, reason: S) -> Self {
        Self::MalformedRecord {
            index,
            offset,
            reason: reason.into(),
        }
    }

    pub fn incompatible_layout<S: Into<String>>(reason: S) -> Self {
        Self::IncompatibleLayout(reason.into())
    }

    /// Восстановимые ошибки затрагивают один record; декодер после них
    /// продолжает со следующей границы.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            QfError::MalformedConfig { .. } | QfError::UnexpectedTag { .. }
        )
    }
}
