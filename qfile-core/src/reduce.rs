//! Сокращение потока record'ов: фильтр каналов, прореживание,
//! урезание конфигурации.
//!
//! Reducer — чистый фильтр: заголовок и конфигурация проходят
//! насквозь, data-record либо выдаётся байт-в-байт тем же значением,
//! либо выбрасывается целиком. Никаких перенумераций и переименований
//! каналов.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::Path;

use log::{debug, warn};
use qfile_types::{ChannelDescriptor, ChannelRef, ConfigRecord, QfResult, Record};
use serde::{Deserialize, Serialize};

use crate::hexcodes;

/// Фильтр data-record'ов по дескриптору канала.
pub struct Reducer<I, F> {
    inner: I,
    keep: F,
    retain_unknown: bool,
    config_keys: Option<Vec<String>>,
}

impl<I, F> Reducer<I, F>
where
    I: Iterator<Item = QfResult<Record>>,
    F: FnMut(&ChannelDescriptor) -> bool,
{
    pub fn new(inner: I, keep: F) -> Self {
        Reducer {
            inner,
            keep,
            retain_unknown: false,
            config_keys: None,
        }
    }

    /// Оставлять record'ы неизвестных каналов.
    ///
    /// По умолчанию они выбрасываются: предикат по именованным каналам
    /// не может их оценить.
    pub fn retain_unknown(mut self, retain: bool) -> Self {
        self.retain_unknown = retain;
        self
    }

    /// Урезать config-record'ы до перечисленных ключей
    /// (порядок и повторы вхождений сохраняются).
    pub fn prune_config<S, K>(mut self, keys: K) -> Self
    where
        S: Into<String>,
        K: IntoIterator<Item = S>,
    {
        self.config_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    fn prune(&self, config: ConfigRecord) -> ConfigRecord {
        let Some(keys) = &self.config_keys else {
            return config;
        };
        let kept = config
            .entries()
            .iter()
            .filter(|e| keys.iter().any(|k| *k == e.key))
            .cloned()
            .collect();
        ConfigRecord::from_entries(kept)
    }
}

impl<I, F> Iterator for Reducer<I, F>
where
    I: Iterator<Item = QfResult<Record>>,
    F: FnMut(&ChannelDescriptor) -> bool,
{
    type Item = QfResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.inner.next()? {
                Ok(Record::Data(d)) => match d.channel {
                    ChannelRef::Known(descriptor) => {
                        if (self.keep)(descriptor) {
                            Some(Ok(Record::Data(d)))
                        } else {
                            continue;
                        }
                    }
                    ChannelRef::Unknown(id) => {
                        if self.retain_unknown {
                            Some(Ok(Record::Data(d)))
                        } else {
                            debug!("reduce: dropping unknown channel {id:#06x}");
                            continue;
                        }
                    }
                },
                Ok(Record::Config(c)) => Some(Ok(Record::Config(self.prune(c)))),
                other => Some(other),
            };
        }
    }
}

/// Прореживатель: оставляет каждый `stride`-й data-record, начиная с
/// первого. Заголовок и конфигурация проходят насквозь.
pub struct Decimator<I> {
    inner: I,
    stride: NonZeroUsize,
    seen: u64,
}

impl<I> Decimator<I>
where
    I: Iterator<Item = QfResult<Record>>,
{
    pub fn new(inner: I, stride: NonZeroUsize) -> Self {
        Decimator {
            inner,
            stride,
            seen: 0,
        }
    }
}

impl<I> Iterator for Decimator<I>
where
    I: Iterator<Item = QfResult<Record>>,
{
    type Item = QfResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            return match self.inner.next()? {
                Ok(Record::Data(d)) => {
                    let kept = self.seen % self.stride.get() as u64 == 0;
                    self.seen += 1;
                    if kept {
                        Some(Ok(Record::Data(d)))
                    } else {
                        continue;
                    }
                }
                other => Some(other),
            };
        }
    }
}

/// Декларация сокращения: какие каналы, спектры и ключи конфигурации
/// пережить должны. Формат JSON-файла совместим с полевым
/// `mergeqfiles.cfg`:
///
/// ```json
/// {"channels": ["pressure"], "spectra": ["shear_raw"], "config": ["fft_length"]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReduceSpec {
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub spectra: Vec<String>,
    #[serde(default)]
    pub config: Vec<String>,
}

impl ReduceSpec {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Читает декларацию из JSON-файла.
    pub fn load<P: AsRef<Path>>(path: P) -> QfResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
    }

    /// Набор идентификаторов всех перечисленных имён.
    ///
    /// Имена вне таблицы hex-кодов пропускаются с предупреждением.
    pub fn ident_set(&self) -> HashSet<u16> {
        let mut set = HashSet::new();
        for name in self.channels.iter().chain(self.spectra.iter()) {
            match hexcodes::name_to_ident(name) {
                Some(id) => {
                    set.insert(id);
                }
                None => warn!("reduce: unknown channel name {name:?} ignored"),
            }
        }
        set
    }

    /// Собирает настроенный [`Reducer`] поверх потока.
    ///
    /// Пустые списки каналов и спектров означают "не оставлять ни
    /// одного именованного канала".
    pub fn reducer<I>(&self, stream: I) -> Reducer<I, impl FnMut(&ChannelDescriptor) -> bool>
    where
        I: Iterator<Item = QfResult<Record>>,
    {
        let idents = self.ident_set();
        let reducer = Reducer::new(stream, move |d: &ChannelDescriptor| idents.contains(&d.id));
        if self.config.is_empty() {
            reducer
        } else {
            reducer.prune_config(self.config.clone())
        }
    }
}

/// Convenience: фильтрует поток предикатом по дескриптору.
pub fn reduce<I, F>(stream: I, keep: F) -> Reducer<I, F>
where
    I: Iterator<Item = QfResult<Record>>,
    F: FnMut(&ChannelDescriptor) -> bool,
{
    Reducer::new(stream, keep)
}
