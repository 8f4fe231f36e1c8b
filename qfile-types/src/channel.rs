/// Род канала: одно значение на record или спектр по частотным бинам.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Одна выборка на record
    Scalar,
    /// Последовательность амплитуд по частотным бинам; число бинов
    /// неявное, выводится из длины record'а
    Spectral,
}

/// Описание канала из таблицы hex-кодов.
///
/// Идентификатор: старшие 12 бит — тип датчика, младшие 4 — номер
/// экземпляра (0–15). Например 0x610 -> "sh_0", 0x611 -> "sh_1".
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDescriptor {
    /// Полный 16-битный идентификатор (с номером экземпляра)
    pub id: u16,
    /// Короткое имя, например "sh_1"
    pub name: String,
    /// Развёрнутое имя, например "shear_1"
    pub long_name: String,
    /// Физические единицы, если у группы они определены
    pub units: Option<&'static str>,
    /// Скалярный или спектральный канал
    pub kind: ChannelKind,
}

impl ChannelDescriptor {
    pub fn is_scalar(&self) -> bool {
        self.kind == ChannelKind::Scalar
    }

    pub fn is_spectral(&self) -> bool {
        self.kind == ChannelKind::Spectral
    }
}

impl std::fmt::Display for ChannelDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{:#06x}]", self.name, self.id)
    }
}
