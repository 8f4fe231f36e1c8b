//! Слияние нескольких потоков record'ов в один.
//!
//! Политика:
//! 1. Все входы обязаны быть одной версии; расхождение — `VersionConflict`
//!    до выдачи первого record'а.
//! 2. В выходе ровно один заголовок — от первого потока; заголовки
//!    остальных поглощаются после сверки.
//! 3. Config-record'ы поздних потоков идут как есть, в порядке потоков:
//!    семантика "дописать/перекрыть" остаётся за потребителем.
//! 4. Data-record'ы строго в порядке входов, без пересортировки по
//!    времени — это забота внешнего слоя.
//! 5. Пустой список входов — `NoInputStreams`; один вход — вырожденное
//!    слияние, воспроизводящее его без изменений.

use std::io::{Seek, Write};
use std::path::Path;

use log::{info, warn};
use qfile_types::{FileVersion, HeaderRecord, QfError, QfResult, Record};

use crate::{
    decode::QReader,
    encode::QWriter,
};

/// Итератор слияния поверх N потоков record'ов.
#[derive(Debug)]
pub struct Merger<I>
where
    I: Iterator<Item = QfResult<Record>>,
{
    /// Заголовок выхода; `take()` при первой выдаче
    pending_header: Option<HeaderRecord>,
    version: FileVersion,
    streams: std::vec::IntoIter<I>,
    current: Option<I>,
    current_index: usize,
    failed: bool,
}

impl<I> Merger<I>
where
    I: Iterator<Item = QfResult<Record>>,
{
    /// Сверяет заголовки всех входов и строит итератор слияния.
    ///
    /// Валидация жадная: любой конфликт версий или вход без заголовка
    /// обнаруживаются здесь, до выдачи единственного record'а.
    pub fn new(sources: Vec<I>) -> QfResult<Self> {
        if sources.is_empty() {
            return Err(QfError::NoInputStreams);
        }

        let mut headers = Vec::with_capacity(sources.len());
        let mut bodies = Vec::with_capacity(sources.len());

        for (i, mut source) in sources.into_iter().enumerate() {
            match source.next() {
                Some(Ok(Record::Header(h))) => {
                    headers.push(h);
                    bodies.push(source);
                }
                Some(Ok(other)) => {
                    return Err(QfError::malformed_header(
                        0,
                        format!(
                            "stream {i} begins with a {:?} record instead of a header",
                            other.record_type()
                        ),
                    ));
                }
                Some(Err(e)) => return Err(e),
                None => {
                    return Err(QfError::malformed_header(0, format!("stream {i} is empty")));
                }
            }
        }

        let first = headers[0].clone();
        for (i, h) in headers.iter().enumerate().skip(1) {
            // Материальны поля, влияющие на декодирование: версия
            // (она же фиксирует ширину выборки). Время и частота
            // первого потока побеждают.
            if h.version != first.version {
                return Err(QfError::VersionConflict {
                    stream: i,
                    expected: first.version,
                    found: h.version,
                });
            }
        }

        Ok(Merger {
            version: first.version,
            pending_header: Some(first),
            streams: bodies.into_iter(),
            current: None,
            current_index: 0,
            failed: false,
        })
    }

    /// Версия сливаемых потоков.
    pub fn version(&self) -> FileVersion {
        self.version
    }
}

impl<I> Iterator for Merger<I>
where
    I: Iterator<Item = QfResult<Record>>,
{
    type Item = QfResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some(h) = self.pending_header.take() {
            return Some(Ok(Record::Header(h)));
        }

        loop {
            let Some(current) = self.current.as_mut() else {
                match self.streams.next() {
                    Some(next) => {
                        self.current = Some(next);
                        self.current_index += 1;
                        continue;
                    }
                    None => return None,
                }
            };

            match current.next() {
                None => {
                    self.current = None;
                }
                // Заблудший заголовок посреди тела: поглощаем, если он
                // материально согласован, иначе конфликт
                Some(Ok(Record::Header(h))) => {
                    if h.version != self.version {
                        self.failed = true;
                        return Some(Err(QfError::VersionConflict {
                            stream: self.current_index - 1,
                            expected: self.version,
                            found: h.version,
                        }));
                    }
                }
                Some(item) => return Some(item),
            }
        }
    }
}

/// Сливает Q-файлы с диска в один выходной поток.
///
/// Восстановимые ошибки входов пропускаются с предупреждением,
/// фатальные прерывают слияние. Возвращает число записанных байт.
pub fn merge_files<P, W>(inputs: &[P], out: W) -> QfResult<u64>
where
    P: AsRef<Path>,
    W: Write + Seek,
{
    let mut sources = Vec::with_capacity(inputs.len());
    for path in inputs {
        sources.push(QReader::open(path)?);
    }

    let mut merger = Merger::new(sources)?;
    let header = match merger.next() {
        Some(Ok(Record::Header(h))) => h,
        Some(Err(e)) => return Err(e),
        _ => {
            return Err(QfError::malformed_header(
                0,
                "merged stream did not begin with a header",
            ));
        }
    };

    let mut writer = QWriter::new(out, header)?;
    for item in merger {
        match item {
            Ok(record) => writer.write_record(&record)?,
            Err(e) if e.is_recoverable() => {
                warn!("merge: skipping unreadable record: {e}");
            }
            Err(e) => return Err(e),
        }
    }

    let bytes = writer.bytes_written();
    info!(
        "merged {} file(s), {} data record(s), {} byte(s)",
        inputs.len(),
        writer.data_records(),
        bytes
    );
    writer.finish()?;
    Ok(bytes)
}
