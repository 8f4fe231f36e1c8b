use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};

/// Читает `buf.len()` байт, продолжая после коротких чтений.
///
/// Возвращает число реально прочитанных байт: `0` — чистый EOF до
/// первого байта, меньше `buf.len()` — усечение посреди данных.
pub fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Курсорные читатели по срезу: смещение двигается на ширину поля.

pub fn get_u16(buf: &[u8], off: &mut usize) -> u16 {
    let v = LittleEndian::read_u16(&buf[*off..*off + 2]);
    *off += 2;
    v
}

pub fn get_u32(buf: &[u8], off: &mut usize) -> u32 {
    let v = LittleEndian::read_u32(&buf[*off..*off + 4]);
    *off += 4;
    v
}

pub fn get_u64(buf: &[u8], off: &mut usize) -> u64 {
    let v = LittleEndian::read_u64(&buf[*off..*off + 8]);
    *off += 8;
    v
}

pub fn get_i64(buf: &[u8], off: &mut usize) -> i64 {
    let v = LittleEndian::read_i64(&buf[*off..*off + 8]);
    *off += 8;
    v
}

pub fn get_f32(buf: &[u8], off: &mut usize) -> f32 {
    let v = LittleEndian::read_f32(&buf[*off..*off + 4]);
    *off += 4;
    v
}
