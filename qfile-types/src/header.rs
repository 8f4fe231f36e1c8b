use crate::version::FileVersion;

/// Заголовок Q-file (фиксированная ширина, всегда первый record).
///
/// v1.2 — 22 байта, v1.3 — 18: ревизия 1.3 выбросила избыточный
/// счётчик записей.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    /// Версия формата; фиксируется на весь поток
    pub version: FileVersion,
    /// Время старта сессии: миллисекунды от 0000-01-01T00:00:00
    pub time_ms: u64,
    /// Частота дискретизации в Гц
    pub sample_rate: f32,
    /// Ожидаемое число data-record'ов (только v1.2).
    /// Подсказка, не доверяется при чтении: прошивка записывает его
    /// до завершения сессии и при сбое питания поле врёт.
    pub record_count: Option<u32>,
}

impl HeaderRecord {
    /// Заголовок v1.3 с пустой подсказкой счётчика.
    pub fn new(version: FileVersion, time_ms: u64, sample_rate: f32) -> Self {
        let record_count = match version {
            FileVersion::V12 => Some(0),
            FileVersion::V13 => None,
        };
        HeaderRecord {
            version,
            time_ms,
            sample_rate,
            record_count,
        }
    }

    /// Поля заголовка структурно согласованы с его версией?
    pub fn is_well_formed(&self) -> bool {
        match self.version {
            FileVersion::V12 => self.record_count.is_some(),
            FileVersion::V13 => self.record_count.is_none(),
        }
    }
}
