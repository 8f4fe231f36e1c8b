/// Версия формата Q-file.
///
/// Логгер пишет версию в заголовок как f32. v1.2 описана в TN-054;
/// v1.3 — ревизия с урезанной избыточностью: без счётчика записей в
/// заголовке, без номера/кода ошибки/времени конца в data-record'ах,
/// выборки расширены до f32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileVersion {
    V12,
    V13,
}

/// Допуск при сравнении f32-версии из заголовка
const VERSION_EPS: f32 = 1e-4;

impl FileVersion {
    /// Распознаёт версию из f32-поля заголовка. `None` для
    /// неподдерживаемых значений.
    pub fn from_f32(v: f32) -> Option<Self> {
        if (v - 1.2).abs() < VERSION_EPS {
            Some(FileVersion::V12)
        } else if (v - 1.3).abs() < VERSION_EPS {
            Some(FileVersion::V13)
        } else {
            None
        }
    }

    pub fn as_f32(&self) -> f32 {
        match self {
            FileVersion::V12 => 1.2,
            FileVersion::V13 => 1.3,
        }
    }

    pub fn is_v12(&self) -> bool {
        *self == FileVersion::V12
    }

    pub fn is_v13(&self) -> bool {
        *self == FileVersion::V13
    }
}

impl std::fmt::Display for FileVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileVersion::V12 => write!(f, "1.2"),
            FileVersion::V13 => write!(f, "1.3"),
        }
    }
}
