//! Байтовые layout'ы версий формата.
//!
//! Все различия между v1.2 и v1.3 собраны в одном неизменяемом
//! значении [`Layout`], которое выбирается один раз на поток по
//! версии из заголовка. Ни декодер, ни кодер больше нигде не
//! ветвятся по версии напрямую.

use qfile_types::FileVersion;

use crate::binary;

/// Байтовые правила одной версии формата.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Версия, которую описывает layout
    pub version: FileVersion,
    /// Полный размер заголовочного record'а
    pub header_size: usize,
    /// Байт служебных полей data-record'а до выборок
    pub data_prelude: usize,
    /// Ширина одной выборки: v1.2 — half (2), v1.3 — f32 (4).
    /// Той же шириной кодируются t0/t1.
    pub sample_width: usize,
    /// Заголовок несёт счётчик записей (только v1.2)
    pub has_record_count: bool,
    /// Data-record несёт номер, код ошибки и конец окна (только v1.2)
    pub has_sequence_fields: bool,
    /// Текст конфигурации дополняется NUL до чётной длины (только v1.2)
    pub config_pad_even: bool,
}

const LAYOUT_V12: Layout = Layout {
    version: FileVersion::V12,
    header_size: 22, // тег + версия + время + частота + счётчик
    data_prelude: 16, // канал + номер + код ошибки + t0 + t1
    sample_width: 2,
    has_record_count: true,
    has_sequence_fields: true,
    config_pad_even: true,
};

const LAYOUT_V13: Layout = Layout {
    version: FileVersion::V13,
    header_size: 18,
    data_prelude: 6, // канал + t0
    sample_width: 4,
    has_record_count: false,
    has_sequence_fields: false,
    config_pad_even: false,
};

impl Layout {
    /// Layout указанной версии. Чистая функция, без I/O.
    pub fn for_version(version: FileVersion) -> &'static Layout {
        match version {
            FileVersion::V12 => &LAYOUT_V12,
            FileVersion::V13 => &LAYOUT_V13,
        }
    }

    /// Читает одну выборку по ширине layout'а.
    /// `buf.len()` должен быть ровно `sample_width`.
    pub fn read_sample(&self, buf: &[u8]) -> f32 {
        debug_assert_eq!(buf.len(), self.sample_width);
        match self.sample_width {
            2 => binary::f16_to_f32(u16::from_le_bytes([buf[0], buf[1]])),
            _ => f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
        }
    }

    /// Пишет одну выборку по ширине layout'а.
    pub fn write_sample(&self, value: f32, out: &mut Vec<u8>) {
        match self.sample_width {
            2 => out.extend_from_slice(&binary::f32_to_f16(value).to_le_bytes()),
            _ => out.extend_from_slice(&value.to_le_bytes()),
        }
    }
}
