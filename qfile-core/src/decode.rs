//! Потоковый декодер Q-file.
//!
//! [`QReader`] — ленивый однопроходный итератор record'ов поверх
//! байтового курсора. Курсор потребляется; повторный проход требует
//! нового читателя. Произвольный доступ — забота вызывающего
//! (буферизуйте record'ы сами).
//!
//! Машина состояний: `ExpectHeader -> ExpectBody -> Done`, с
//! поглощающим ошибки `Failed`. Структурные ошибки байтового уровня
//! (усечение, порча заголовка, несогласованный payload) фатальны и
//! останавливают декодирование в точке возникновения; ошибки
//! содержимого (грамматика конфигурации, неизвестный тег) изолируются
//! в пределах одного record'а — его длина объявлена и ей доверяем.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::warn;
use qfile_types::{
    ChannelRef, ConfigSyntaxError, DataRecord, FileVersion, HeaderRecord, Payload, QfError,
    QfResult, Record, RecordType,
};

use crate::{binary, config, hexcodes, layout::Layout};

/// Фиксированная часть заголовка: тег + версия + время + частота
const HEADER_FIXED: usize = 18;
/// Тег + длина перед каждым body-record'ом
const RECORD_PRELUDE: usize = 4;

/// Статистика, накопленная [`QReader`] в процессе чтения.
#[derive(Debug, Default, Clone)]
pub struct ReadStats {
    /// Успешно выданных record'ов (включая заголовок)
    pub records_ok: u64,
    /// Config-record'ов с грамматическими ошибками (пропущены)
    pub config_errors: u64,
    /// Data-record'ов с идентификатором вне таблицы (выданы как Unknown)
    pub unknown_channels: u64,
    /// Record'ов с нераспознанным тегом (пропущены по длине)
    pub skipped_tags: u64,
    /// Всего обработано байт
    pub bytes_processed: u64,
}

#[derive(Debug, Clone, Copy)]
enum ReaderState {
    ExpectHeader,
    ExpectBody(&'static Layout),
    Done,
    Failed,
}

/// Потоковый читатель Q-file.
///
/// Не реентерабелен: один курсор — один читатель. Отмена — просто
/// прекращение итерации; ресурсов кроме источника байт нет.
#[derive(Debug)]
pub struct QReader<R: Read> {
    reader: BufReader<R>,
    state: ReaderState,
    /// Индекс следующего record'а (заголовок — #0)
    index: u64,
    /// Байтовое смещение следующего record'а
    offset: u64,
    stats: ReadStats,
}

impl QReader<File> {
    /// Открывает файл на чтение.
    pub fn open<P: AsRef<Path>>(path: P) -> QfResult<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> QReader<R> {
    pub fn new(inner: R) -> Self {
        QReader {
            reader: BufReader::new(inner),
            state: ReaderState::ExpectHeader,
            index: 0,
            offset: 0,
            stats: ReadStats::default(),
        }
    }

    /// Версия потока; `None` до успешного чтения заголовка.
    pub fn version(&self) -> Option<FileVersion> {
        match self.state {
            ReaderState::ExpectBody(layout) => Some(layout.version),
            _ => None,
        }
    }

    /// Накопленная статистика чтения.
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    fn read_header(&mut self) -> QfResult<HeaderRecord> {
        let mut fixed = [0u8; HEADER_FIXED];
        let n = binary::read_full(&mut self.reader, &mut fixed)?;
        if n != HEADER_FIXED {
            return Err(QfError::malformed_header(
                self.offset,
                format!("EOF in fixed header, {n} != {HEADER_FIXED}"),
            ));
        }

        let mut off = 0;
        let tag = binary::get_u16(&fixed, &mut off);
        if tag != RecordType::Header.as_u16() {
            return Err(QfError::malformed_header(
                self.offset,
                format!(
                    "invalid header identifier, {tag:#06x} != {:#06x}",
                    RecordType::Header.as_u16()
                ),
            ));
        }

        let version = {
            let v = binary::get_f32(&fixed, &mut off);
            FileVersion::from_f32(v).ok_or_else(|| {
                QfError::malformed_header(self.offset, format!("unsupported version {v}"))
            })?
        };
        let time_ms = binary::get_u64(&fixed, &mut off);
        let sample_rate = binary::get_f32(&fixed, &mut off);

        let layout = Layout::for_version(version);
        let record_count = if layout.has_record_count {
            let mut buf = [0u8; 4];
            let n = binary::read_full(&mut self.reader, &mut buf)?;
            if n != 4 {
                return Err(QfError::malformed_header(
                    self.offset,
                    format!("EOF in record count, {n} != 4"),
                ));
            }
            Some(u32::from_le_bytes(buf))
        } else {
            None
        };

        self.offset += layout.header_size as u64;
        self.index = 1;
        self.stats.bytes_processed += layout.header_size as u64;
        self.state = ReaderState::ExpectBody(layout);

        Ok(HeaderRecord {
            version,
            time_ms,
            sample_rate,
            record_count,
        })
    }

    /// Один body-record; `Ok(None)` — чистый EOF на границе.
    fn read_body_record(&mut self, layout: &'static Layout) -> QfResult<Option<Record>> {
        let record_offset = self.offset;

        let mut prelude = [0u8; RECORD_PRELUDE];
        let n = binary::read_full(&mut self.reader, &mut prelude)?;
        if n == 0 {
            return Ok(None);
        }
        if n != RECORD_PRELUDE {
            return Err(QfError::TruncatedRecord {
                index: self.index,
                offset: record_offset,
                needed: RECORD_PRELUDE,
                got: n,
            });
        }

        let mut off = 0;
        let tag = binary::get_u16(&prelude, &mut off);
        let length = binary::get_u16(&prelude, &mut off) as usize;

        let mut content = vec![0u8; length];
        let n = binary::read_full(&mut self.reader, &mut content)?;
        if n != length {
            return Err(QfError::TruncatedRecord {
                index: self.index,
                offset: record_offset,
                needed: length,
                got: n,
            });
        }

        let index = self.index;
        self.index += 1;
        self.offset += (RECORD_PRELUDE + length) as u64;
        self.stats.bytes_processed += (RECORD_PRELUDE + length) as u64;

        match RecordType::from_u16(tag) {
            Some(RecordType::Config) => {
                let record = self.decode_config(content, layout, index)?;
                Ok(Some(Record::Config(record)))
            }
            Some(RecordType::Data) => {
                let record = self.decode_data(&content, layout, index, record_offset)?;
                Ok(Some(Record::Data(record)))
            }
            // Заблудший заголовок или расширение прошивки: содержимое
            // уже пропущено по объявленной длине, поток жив
            _ => {
                self.stats.skipped_tags += 1;
                warn!("skipping record #{index} with unexpected tag {tag:#06x}");
                Err(QfError::UnexpectedTag {
                    index,
                    offset: record_offset,
                    tag,
                })
            }
        }
    }

    fn decode_config(
        &mut self,
        mut content: Vec<u8>,
        layout: &'static Layout,
        index: u64,
    ) -> QfResult<qfile_types::ConfigRecord> {
        if layout.config_pad_even {
            while content.last() == Some(&0) {
                content.pop();
            }
        }

        let text = String::from_utf8(content).map_err(|_| {
            self.stats.config_errors += 1;
            QfError::MalformedConfig {
                index,
                source: ConfigSyntaxError {
                    line: 0,
                    excerpt: "invalid UTF-8 in config block".into(),
                },
            }
        })?;

        config::parse_record(&text).map_err(|source| {
            self.stats.config_errors += 1;
            QfError::MalformedConfig { index, source }
        })
    }

    fn decode_data(
        &mut self,
        content: &[u8],
        layout: &'static Layout,
        index: u64,
        record_offset: u64,
    ) -> QfResult<DataRecord> {
        if content.len() < layout.data_prelude {
            return Err(QfError::malformed_record(
                index,
                record_offset,
                format!(
                    "data record shorter than its prelude: {} < {}",
                    content.len(),
                    layout.data_prelude
                ),
            ));
        }

        let mut off = 0;
        let channel_id = binary::get_u16(content, &mut off);

        let (number, error_code, t0, t1) = if layout.has_sequence_fields {
            let number = binary::get_u16(content, &mut off);
            let error_code = binary::get_i64(content, &mut off);
            let t0 = layout.read_sample(&content[off..off + layout.sample_width]);
            off += layout.sample_width;
            let t1 = layout.read_sample(&content[off..off + layout.sample_width]);
            off += layout.sample_width;
            (Some(number), Some(error_code), t0, Some(t1))
        } else {
            let t0 = binary::get_f32(content, &mut off);
            (None, None, t0, None)
        };

        let payload_bytes = &content[off..];

        let (channel, payload) = match hexcodes::lookup(channel_id) {
            Ok(descriptor) => {
                let payload =
                    decode_payload(descriptor, payload_bytes, layout, index, record_offset)?;
                (ChannelRef::Known(descriptor), payload)
            }
            Err(QfError::UnknownChannel(id)) => {
                // Вперёд-совместимость: канал вне таблицы несёт сырые
                // байты, его род не проверить
                self.stats.unknown_channels += 1;
                (ChannelRef::Unknown(id), Payload::Raw(payload_bytes.to_vec()))
            }
            Err(e) => return Err(e),
        };

        Ok(DataRecord {
            channel,
            number,
            error_code,
            t0,
            t1,
            payload,
        })
    }

}

/// Раскладывает payload по роду канала; несогласованная длина —
/// структурная ошибка, а не молчаливое усечение.
fn decode_payload(
    descriptor: &qfile_types::ChannelDescriptor,
    bytes: &[u8],
    layout: &'static Layout,
    index: u64,
    record_offset: u64,
) -> QfResult<Payload> {
    let width = layout.sample_width;

    if descriptor.is_scalar() {
        if bytes.len() != width {
            return Err(QfError::malformed_record(
                index,
                record_offset,
                format!(
                    "scalar channel {} carries {} payload bytes, expected {width}",
                    descriptor.name,
                    bytes.len()
                ),
            ));
        }
        return Ok(Payload::Scalar(layout.read_sample(bytes)));
    }

    if bytes.len() % width != 0 {
        return Err(QfError::malformed_record(
            index,
            record_offset,
            format!(
                "spectral channel {} payload of {} bytes is not a multiple of {width}",
                descriptor.name,
                bytes.len()
            ),
        ));
    }

    let samples = bytes
        .chunks_exact(width)
        .map(|chunk| layout.read_sample(chunk))
        .collect();
    Ok(Payload::Spectrum(samples))
}

impl<R: Read> Iterator for QReader<R> {
    type Item = QfResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            ReaderState::Done | ReaderState::Failed => None,
            ReaderState::ExpectHeader => match self.read_header() {
                Ok(header) => {
                    self.stats.records_ok += 1;
                    Some(Ok(Record::Header(header)))
                }
                Err(e) => {
                    self.state = ReaderState::Failed;
                    Some(Err(e))
                }
            },
            ReaderState::ExpectBody(layout) => match self.read_body_record(layout) {
                Ok(Some(record)) => {
                    self.stats.records_ok += 1;
                    Some(Ok(record))
                }
                Ok(None) => {
                    self.state = ReaderState::Done;
                    None
                }
                Err(e) => {
                    if !e.is_recoverable() {
                        self.state = ReaderState::Failed;
                    }
                    Some(Err(e))
                }
            },
        }
    }
}

/// Convenience: вычитывает весь поток в вектор.
///
/// Восстановимые ошибки (битая конфигурация, чужой тег) пропускаются;
/// фатальные прерывают чтение.
pub fn read_all<R: Read>(reader: &mut QReader<R>) -> QfResult<Vec<Record>> {
    let mut records = Vec::new();
    for item in reader {
        match item {
            Ok(record) => records.push(record),
            Err(e) if e.is_recoverable() => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}
