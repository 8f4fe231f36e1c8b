//! Кодирование record'ов и потоковая запись Q-file.
//!
//! Обратная операция к декодеру: типизированный record + [`Layout`]
//! целевой версии -> точная байтовая последовательность. Record,
//! структурно не выразимый в выбранном layout'е, отклоняется с
//! `IncompatibleLayout` — кодер никогда не пишет битые байты.

use std::io::{BufWriter, Seek, SeekFrom, Write};

use qfile_types::{
    ConfigRecord, DataRecord, HeaderRecord, Payload, QfError, QfResult, Record, RecordType,
};

use crate::{binary, layout::Layout};

/// Максимальная длина содержимого body-record'а (length — u16)
const MAX_CONTENT: usize = u16::MAX as usize;

/// Сериализация record'а под layout целевой версии.
pub trait RecordEncodeExt {
    fn encode(&self, layout: &Layout) -> QfResult<Vec<u8>>;
}

impl RecordEncodeExt for HeaderRecord {
    fn encode(&self, layout: &Layout) -> QfResult<Vec<u8>> {
        if self.version != layout.version {
            return Err(QfError::incompatible_layout(format!(
                "header of v{} cannot be written under the v{} layout",
                self.version, layout.version
            )));
        }

        let mut out = Vec::with_capacity(layout.header_size);
        binary::put_u16(&mut out, RecordType::Header.as_u16());
        binary::put_f32(&mut out, self.version.as_f32());
        binary::put_u64(&mut out, self.time_ms);
        binary::put_f32(&mut out, self.sample_rate);

        match (layout.has_record_count, self.record_count) {
            (true, Some(count)) => binary::put_u32(&mut out, count),
            (false, None) => {}
            (true, None) => {
                return Err(QfError::incompatible_layout(
                    "v1.2 layout requires a record count hint",
                ));
            }
            (false, Some(_)) => {
                return Err(QfError::incompatible_layout(
                    "record count is a v1.2-only header field",
                ));
            }
        }

        Ok(out)
    }
}

impl RecordEncodeExt for ConfigRecord {
    fn encode(&self, layout: &Layout) -> QfResult<Vec<u8>> {
        let text = self.raw().as_bytes();
        let padded_len = if layout.config_pad_even && text.len() % 2 != 0 {
            text.len() + 1
        } else {
            text.len()
        };
        if padded_len > MAX_CONTENT {
            return Err(QfError::incompatible_layout(format!(
                "config block of {} bytes exceeds the record length field",
                text.len()
            )));
        }

        let mut out = Vec::with_capacity(4 + padded_len);
        binary::put_u16(&mut out, RecordType::Config.as_u16());
        binary::put_u16(&mut out, padded_len as u16);
        out.extend_from_slice(text);
        if padded_len != text.len() {
            out.push(0);
        }
        Ok(out)
    }
}

impl RecordEncodeExt for DataRecord {
    fn encode(&self, layout: &Layout) -> QfResult<Vec<u8>> {
        check_sequence_fields(self, layout)?;

        let payload_len = match &self.payload {
            Payload::Scalar(_) => layout.sample_width,
            Payload::Spectrum(samples) => samples.len() * layout.sample_width,
            Payload::Raw(bytes) => bytes.len(),
        };
        let content_len = layout.data_prelude + payload_len;
        if content_len > MAX_CONTENT {
            return Err(QfError::incompatible_layout(format!(
                "data record content of {content_len} bytes exceeds the record length field"
            )));
        }

        if let Some(descriptor) = self.channel.descriptor() {
            match (&self.payload, descriptor.is_scalar()) {
                (Payload::Scalar(_), true) | (Payload::Spectrum(_), false) => {}
                (Payload::Raw(_), _) => {
                    return Err(QfError::incompatible_layout(format!(
                        "known channel {} cannot carry a raw payload",
                        descriptor.name
                    )));
                }
                (Payload::Scalar(_), false) => {
                    return Err(QfError::incompatible_layout(format!(
                        "spectral channel {} cannot carry a scalar payload",
                        descriptor.name
                    )));
                }
                (Payload::Spectrum(_), true) => {
                    return Err(QfError::incompatible_layout(format!(
                        "scalar channel {} cannot carry a spectrum payload",
                        descriptor.name
                    )));
                }
            }
        }

        let mut out = Vec::with_capacity(4 + content_len);
        binary::put_u16(&mut out, RecordType::Data.as_u16());
        binary::put_u16(&mut out, content_len as u16);
        binary::put_u16(&mut out, self.channel.id());

        if layout.has_sequence_fields {
            // Проверено в check_sequence_fields
            let (Some(number), Some(error_code), Some(t1)) =
                (self.number, self.error_code, self.t1)
            else {
                return Err(QfError::incompatible_layout(
                    "v1.2 layout requires sequence fields",
                ));
            };
            binary::put_u16(&mut out, number);
            binary::put_i64(&mut out, error_code);
            layout.write_sample(self.t0, &mut out);
            layout.write_sample(t1, &mut out);
        } else {
            binary::put_f32(&mut out, self.t0);
        }

        match &self.payload {
            Payload::Scalar(v) => layout.write_sample(*v, &mut out),
            Payload::Spectrum(samples) => {
                for v in samples {
                    layout.write_sample(*v, &mut out);
                }
            }
            Payload::Raw(bytes) => out.extend_from_slice(bytes),
        }

        Ok(out)
    }
}

impl RecordEncodeExt for Record {
    fn encode(&self, layout: &Layout) -> QfResult<Vec<u8>> {
        match self {
            Record::Header(h) => h.encode(layout),
            Record::Config(c) => c.encode(layout),
            Record::Data(d) => d.encode(layout),
        }
    }
}

fn check_sequence_fields(record: &DataRecord, layout: &Layout) -> QfResult<()> {
    if layout.has_sequence_fields {
        if record.number.is_none() || record.error_code.is_none() || record.t1.is_none() {
            return Err(QfError::incompatible_layout(
                "v1.2 layout requires number, error code and end time",
            ));
        }
    } else if record.number.is_some() || record.error_code.is_some() || record.t1.is_some() {
        return Err(QfError::incompatible_layout(
            "number, error code and end time are v1.2-only fields",
        ));
    }
    Ok(())
}

/// Потоковый писатель Q-file.
///
/// Заголовок уходит в поток сразу при создании; дальше — только
/// config/data record'ы. [`finish`](Self::finish) для v1.2
/// перезаписывает заголовок фактическим числом data-record'ов.
pub struct QWriter<W: Write + Seek> {
    writer: BufWriter<W>,
    layout: &'static Layout,
    header: HeaderRecord,
    data_records: u64,
    bytes_written: u64,
}

impl<W: Write + Seek> QWriter<W> {
    /// Создаёт писатель, немедленно записывая заголовок в поток.
    pub fn new(inner: W, header: HeaderRecord) -> QfResult<Self> {
        let layout = Layout::for_version(header.version);
        let encoded = header.encode(layout)?;

        let mut writer = BufWriter::new(inner);
        writer.write_all(&encoded)?;

        Ok(Self {
            writer,
            layout,
            header,
            data_records: 0,
            bytes_written: encoded.len() as u64,
        })
    }

    /// Записывает один body-record.
    ///
    /// Повторный заголовок отклоняется: в потоке он ровно один.
    pub fn write_record(&mut self, record: &Record) -> QfResult<()> {
        if matches!(record, Record::Header(_)) {
            return Err(QfError::incompatible_layout(
                "a stream carries exactly one header record",
            ));
        }

        let encoded = record.encode(self.layout)?;
        self.writer.write_all(&encoded)?;
        self.bytes_written += encoded.len() as u64;
        if matches!(record, Record::Data(_)) {
            self.data_records += 1;
        }
        Ok(())
    }

    /// Завершает запись: сбрасывает буфер и для v1.2 перезаписывает
    /// заголовок фактическим счётчиком. Возвращает источник,
    /// позиционированный в конец потока.
    pub fn finish(mut self) -> QfResult<W> {
        self.writer.flush()?;
        let mut inner = self
            .writer
            .into_inner()
            .map_err(|e| QfError::Io(e.into_error()))?;

        if self.layout.has_record_count {
            self.header.record_count = Some(self.data_records.min(u32::MAX as u64) as u32);
            let encoded = self.header.encode(self.layout)?;
            inner.seek(SeekFrom::Start(0))?;
            inner.write_all(&encoded)?;
        }

        inner.seek(SeekFrom::End(0))?;
        inner.flush()?;
        Ok(inner)
    }

    /// Число записанных data-record'ов.
    pub fn data_records(&self) -> u64 {
        self.data_records
    }

    /// Байт ушло в поток (без учёта финальной перезаписи заголовка).
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Текущий заголовок (до финализации).
    pub fn header(&self) -> &HeaderRecord {
        &self.header
    }
}
