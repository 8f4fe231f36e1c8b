use crate::channel::ChannelDescriptor;

/// Ссылка на канал data-record'а.
///
/// Неизвестные идентификаторы не валят поток: record с таким каналом
/// несёт сырой payload и ждёт, пока таблицу пополнят.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelRef {
    /// Канал найден в таблице hex-кодов
    Known(&'static ChannelDescriptor),
    /// Идентификатор вне таблицы; payload сохранён как есть
    Unknown(u16),
}

impl ChannelRef {
    /// Числовой идентификатор канала независимо от того, известен ли он.
    pub fn id(&self) -> u16 {
        match self {
            ChannelRef::Known(d) => d.id,
            ChannelRef::Unknown(id) => *id,
        }
    }

    pub fn descriptor(&self) -> Option<&'static ChannelDescriptor> {
        match self {
            ChannelRef::Known(d) => Some(d),
            ChannelRef::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, ChannelRef::Known(_))
    }
}

/// Содержимое data-record'а.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Ровно одна выборка (скалярный канал)
    Scalar(f32),
    /// Амплитуды по частотным бинам (спектральный канал)
    Spectrum(Vec<f32>),
    /// Сырые байты неизвестного канала — род не определить, поэтому
    /// и не интерпретируем
    Raw(Vec<u8>),
}

impl Payload {
    /// Число выборок; для `Raw` — байт.
    pub fn len(&self) -> usize {
        match self {
            Payload::Scalar(_) => 1,
            Payload::Spectrum(v) => v.len(),
            Payload::Raw(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Одно измерение: скалярное значение или спектр одного канала.
///
/// Поля `number`, `error_code`, `t1` существуют только в v1.2;
/// ревизия 1.3 признала их избыточными.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    /// Канал измерения
    pub channel: ChannelRef,
    /// Порядковый номер record'а (только v1.2)
    pub number: Option<u16>,
    /// Код ошибки прошивки (только v1.2)
    pub error_code: Option<i64>,
    /// Начало окна измерения: секунды от времени в заголовке
    pub t0: f32,
    /// Конец окна измерения (только v1.2)
    pub t1: Option<f32>,
    /// Выборки
    pub payload: Payload,
}

impl DataRecord {
    /// Record в стиле v1.3: без номера, кода ошибки и конца окна.
    pub fn new(channel: ChannelRef, t0: f32, payload: Payload) -> Self {
        DataRecord {
            channel,
            number: None,
            error_code: None,
            t0,
            t1: None,
            payload,
        }
    }

    /// Поля v1.2 заполнены?
    pub fn has_sequence_fields(&self) -> bool {
        self.number.is_some() && self.error_code.is_some() && self.t1.is_some()
    }
}
