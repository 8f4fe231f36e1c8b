use crate::{config::ConfigRecord, data::DataRecord, header::HeaderRecord};

/// Тип record'а Q-file.
///
/// Каждый record начинается с 16-битного тега. Значения тегов
/// зафиксированы прошивкой логгера и одинаковы для обеих версий.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RecordType {
    /// Заголовок файла (версия, время старта, частота дискретизации)
    Header = 0x1729,
    /// Текстовый блок конфигурации
    Config = 0x0827,
    /// Измерение: скалярный канал или спектр
    Data = 0x1657,
}

impl RecordType {
    /// `None` для тегов, не описанных форматом — такие record'ы
    /// пропускаются по объявленной длине.
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0x1729 => Some(RecordType::Header),
            0x0827 => Some(RecordType::Config),
            0x1657 => Some(RecordType::Data),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Один декодированный record.
///
/// Полностью владеет своими данными: не держит ссылок в исходный
/// буфер и переживает курсор, который его произвёл.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Header(HeaderRecord),
    Config(ConfigRecord),
    Data(DataRecord),
}

impl Record {
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Header(_) => RecordType::Header,
            Record::Config(_) => RecordType::Config,
            Record::Data(_) => RecordType::Data,
        }
    }

    pub fn as_header(&self) -> Option<&HeaderRecord> {
        match self {
            Record::Header(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_config(&self) -> Option<&ConfigRecord> {
        match self {
            Record::Config(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&DataRecord> {
        match self {
            Record::Data(d) => Some(d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values() {
        assert_eq!(RecordType::Header.as_u16(), 0x1729);
        assert_eq!(RecordType::Config.as_u16(), 0x0827);
        assert_eq!(RecordType::Data.as_u16(), 0x1657);
    }

    #[test]
    fn test_from_u16() {
        assert_eq!(RecordType::from_u16(0x1729), Some(RecordType::Header));
        assert_eq!(RecordType::from_u16(0x0827), Some(RecordType::Config));
        assert_eq!(RecordType::from_u16(0x1657), Some(RecordType::Data));
        assert_eq!(RecordType::from_u16(0xDEAD), None);
        assert_eq!(RecordType::from_u16(0), None);
    }
}
