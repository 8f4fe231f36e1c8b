use std::collections::HashSet;

/// Значение конфигурационной записи.
///
/// Пустой массив `[]` — легальное значение нулевой длины, а не
/// отсутствие значения.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Array(Vec<ConfigValue>),
}

impl ConfigValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(v) => Some(*v),
            ConfigValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfigValue {
    /// Каноническая текстовая форма; её же принимает парсер обратно.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Integer(v) => write!(f, "{v}"),
            // {:?} сохраняет ".0" — иначе 1.0 перечитается как Integer
            ConfigValue::Float(v) => write!(f, "{v:?}"),
            ConfigValue::Text(s) => write!(f, "\"{s}\""),
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Одна запись `key => value`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: ConfigValue,
}

impl ConfigEntry {
    pub fn new<K: Into<String>>(key: K, value: ConfigValue) -> Self {
        ConfigEntry {
            key: key.into(),
            value,
        }
    }
}

/// Конфигурационный record: сырой текст плюс разобранные записи.
///
/// Порядок записей — порядок строк в файле. Повторяющиеся ключи НЕ
/// схлопываются: исторически прошивка писала один ключ дважды, и
/// "последний побеждает" терял данные. Все вхождения доступны через
/// [`entries_for`](Self::entries_for), повторы — через
/// [`duplicate_keys`](Self::duplicate_keys).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRecord {
    raw: String,
    entries: Vec<ConfigEntry>,
}

impl ConfigRecord {
    /// Собирает record из готовых записей, порождая канонический текст.
    pub fn from_entries(entries: Vec<ConfigEntry>) -> Self {
        let raw = entries
            .iter()
            .map(|e| format!("{} => {}", e.key, e.value))
            .collect::<Vec<_>>()
            .join("\n");
        ConfigRecord { raw, entries }
    }

    /// Собирает record из сырого текста и уже разобранных записей.
    /// Используется декодером; сам разбор живёт в `qfile-core`.
    pub fn from_raw_parts(raw: String, entries: Vec<ConfigEntry>) -> Self {
        ConfigRecord { raw, entries }
    }

    /// Сырой текст блока, байт в байт как на диске (без NUL-паддинга).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Все записи в порядке появления.
    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Первое вхождение ключа.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    /// Все вхождения ключа в порядке появления.
    pub fn entries_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a ConfigValue> {
        self.entries
            .iter()
            .filter(move |e| e.key == key)
            .map(|e| &e.value)
    }

    /// Ключи, встречающиеся более одного раза (в порядке появления).
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for e in &self.entries {
            if !seen.insert(e.key.as_str()) && !dups.contains(&e.key.as_str()) {
                dups.push(e.key.as_str());
            }
        }
        dups
    }
}
