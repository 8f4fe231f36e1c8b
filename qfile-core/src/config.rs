//! Парсер текстового блока конфигурации.
//!
//! Грамматика едина для обеих версий: строки `key => value`,
//! пробелы вокруг `=>` допустимы (v1.2 исторически их не писала,
//! v1.3 пишет — принимаем оба написания). Ключ может быть в кавычках.
//! Значение: пустой массив `[]`, список скаляров в скобках или без,
//! либо одиночный скаляр.

use qfile_types::{ConfigEntry, ConfigRecord, ConfigSyntaxError, ConfigValue};

/// Максимум символов исходной строки в тексте ошибки
const EXCERPT_LIMIT: usize = 60;

/// Разбирает блок конфигурации в упорядоченный список записей.
///
/// Повторы ключей сохраняются. Пустые строки пропускаются.
/// Первая неразбираемая строка — ошибка; решение, фатальна ли она
/// для всего потока, принимает вызывающий.
pub fn parse(text: &str) -> Result<Vec<ConfigEntry>, ConfigSyntaxError> {
    let mut entries = Vec::new();

    for (lineno, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let Some(arrow) = find_arrow(line) else {
            return Err(syntax_error(lineno + 1, raw_line));
        };

        let key = unquote(line[..arrow].trim());
        if key.is_empty() {
            return Err(syntax_error(lineno + 1, raw_line));
        }

        let value = parse_value(line[arrow + 2..].trim())
            .ok_or_else(|| syntax_error(lineno + 1, raw_line))?;

        entries.push(ConfigEntry::new(key, value));
    }

    Ok(entries)
}

/// То же, но сразу собирает [`ConfigRecord`] с сырым текстом.
pub fn parse_record(text: &str) -> Result<ConfigRecord, ConfigSyntaxError> {
    let entries = parse(text)?;
    Ok(ConfigRecord::from_raw_parts(text.to_string(), entries))
}

fn syntax_error(line: usize, raw_line: &str) -> ConfigSyntaxError {
    let mut excerpt: String = raw_line.trim().chars().take(EXCERPT_LIMIT).collect();
    if raw_line.trim().chars().count() > EXCERPT_LIMIT {
        excerpt.push_str("...");
    }
    ConfigSyntaxError { line, excerpt }
}

/// Позиция первого `=>` вне кавычек.
fn find_arrow(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_quotes = false;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match bytes[i] {
            b'"' => in_quotes = !in_quotes,
            b'=' if !in_quotes && bytes[i + 1] == b'>' => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn unquote(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// `None` означает структурно неразбираемое значение
/// (незакрытая скобка).
fn parse_value(s: &str) -> Option<ConfigValue> {
    if let Some(inner) = s.strip_prefix('[') {
        // Скобка обязана закрыться — иначе строка неразбираема
        let inner = inner.strip_suffix(']')?;
        let inner = inner.trim();
        if inner.is_empty() {
            // `[]` — легальный массив нулевой длины
            return Some(ConfigValue::Array(Vec::new()));
        }
        let items = split_top_level(inner)
            .into_iter()
            .map(|f| parse_value(f.trim()))
            .collect::<Option<Vec<_>>>()?;
        return Some(ConfigValue::Array(items));
    }

    // Список без скобок: `key => 1, 2, 3`
    let fields = split_top_level(s);
    if fields.len() > 1 {
        let items = fields
            .into_iter()
            .map(|f| parse_scalar(f.trim()))
            .collect();
        return Some(ConfigValue::Array(items));
    }

    Some(parse_scalar(s))
}

fn parse_scalar(s: &str) -> ConfigValue {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        return ConfigValue::Text(s[1..s.len() - 1].to_string());
    }
    match s {
        "true" => return ConfigValue::Bool(true),
        "false" => return ConfigValue::Bool(false),
        _ => {}
    }
    if let Ok(v) = s.parse::<i64>() {
        return ConfigValue::Integer(v);
    }
    // Числовой префикс отсекает "inf"/"nan" от парсера f64
    if s.starts_with(|c: char| c.is_ascii_digit() || c == '+' || c == '-' || c == '.') {
        if let Ok(v) = s.parse::<f64>() {
            return ConfigValue::Float(v);
        }
    }
    ConfigValue::Text(s.to_string())
}

/// Делит по запятым нулевой глубины (вне `[...]` и кавычек).
fn split_top_level(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'[' if !in_quotes => depth += 1,
            b']' if !in_quotes => depth = depth.saturating_sub(1),
            b',' if !in_quotes && depth == 0 => {
                fields.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    fields.push(&s[start..]);
    fields
}
