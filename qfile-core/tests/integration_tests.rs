use std::io::{Cursor, Seek, SeekFrom, Write};
use std::num::NonZeroUsize;

use qfile_core::{
    config, hexcodes, merge_files, read_all, reduce, Decimator, Layout, Merger, QReader, QWriter,
    RecordEncodeExt, ReduceSpec,
};
use qfile_types::{
    ChannelRef, ConfigValue, DataRecord, FileVersion, HeaderRecord, Payload, QfError, QfResult,
    Record,
};
use tempfile::NamedTempFile;

// ===========================================================================
// Helpers — детерминированные тест-данные
// ===========================================================================

/// Пишем предупреждения декодера в вывод теста (`RUST_LOG=debug`).
fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Детерминированный заголовок: начало 2024 года от эпохи 0000-01-01.
fn deterministic_header(version: FileVersion) -> HeaderRecord {
    let mut h = HeaderRecord::new(version, 63_839_664_000_000, 512.0);
    if version.is_v12() {
        h.record_count = Some(0);
    }
    h
}

fn known(id: u16) -> ChannelRef {
    ChannelRef::Known(hexcodes::lookup(id).expect("known channel"))
}

/// Скалярный record о давлении; значения точны в half.
fn pressure(version: FileVersion, n: u16, value: f32) -> DataRecord {
    let mut record = DataRecord::new(known(0x160), n as f32 * 0.5, Payload::Scalar(value));
    if version.is_v12() {
        record.number = Some(n);
        record.error_code = Some(0);
        record.t1 = Some(n as f32 * 0.5 + 0.25);
    }
    record
}

/// Спектральный record сдвигового зонда (пилообразный паттерн).
fn shear_spectrum(version: FileVersion, n: u16, bins: usize) -> DataRecord {
    let samples = (0..bins).map(|i| (i % 8) as f32 * 0.25).collect();
    let mut record = DataRecord::new(known(0x920), n as f32 * 0.5, Payload::Spectrum(samples));
    if version.is_v12() {
        record.number = Some(n);
        record.error_code = Some(0);
        record.t1 = Some(n as f32 * 0.5 + 0.25);
    }
    record
}

fn sample_config() -> Record {
    Record::Config(
        config::parse_record(
            "fft_length => 4\n\
             diss_length => 32\n\
             despiking => [8.0, 0.25, 0.04]\n\
             empty => []\n\
             algorithm => \"glide\"",
        )
        .expect("valid config"),
    )
}

/// Собирает полный поток в память: заголовок + записи.
fn build_stream(version: FileVersion, records: &[Record]) -> Vec<u8> {
    let layout = Layout::for_version(version);
    let mut raw = deterministic_header(version).encode(layout).expect("header");
    for record in records {
        raw.extend_from_slice(&record.encode(layout).expect("record"));
    }
    raw
}

fn decode_all(raw: Vec<u8>) -> QfResult<Vec<Record>> {
    read_all(&mut QReader::new(Cursor::new(raw)))
}

// ===========================================================================
// Test Vector #1 — полный файл v1.3: конфигурация, скаляры, спектры
// ===========================================================================

#[test]
fn test_vector_1_v13_full_round_trip() {
    init_logs();
    let records = vec![
        sample_config(),
        Record::Data(pressure(FileVersion::V13, 0, 12.5)),
        Record::Data(shear_spectrum(FileVersion::V13, 1, 16)),
        Record::Data(pressure(FileVersion::V13, 2, 13.0)),
    ];
    let raw = build_stream(FileVersion::V13, &records);

    let decoded = decode_all(raw).unwrap();
    assert_eq!(decoded.len(), 5);
    assert_eq!(
        decoded[0].as_header().unwrap(),
        &deterministic_header(FileVersion::V13)
    );
    assert_eq!(&decoded[1..], &records[..]);
}

#[test]
fn test_vector_1_config_values() {
    let raw = build_stream(FileVersion::V13, &[sample_config()]);
    let decoded = decode_all(raw).unwrap();

    let cfg = decoded[1].as_config().unwrap();
    assert_eq!(cfg.get("fft_length"), Some(&ConfigValue::Integer(4)));
    // Пустой массив — массив нулевой длины, не ошибка и не null
    assert_eq!(cfg.get("empty"), Some(&ConfigValue::Array(vec![])));
    assert_eq!(
        cfg.get("algorithm"),
        Some(&ConfigValue::Text("glide".into()))
    );
    assert!(cfg.duplicate_keys().is_empty());
}

// ===========================================================================
// Test Vector #2 — файл v1.2: поля последовательности, half-выборки
// ===========================================================================

#[test]
fn test_vector_2_v12_full_round_trip() {
    let records = vec![
        sample_config(),
        Record::Data(pressure(FileVersion::V12, 0, 12.5)),
        Record::Data(shear_spectrum(FileVersion::V12, 1, 16)),
    ];
    let raw = build_stream(FileVersion::V12, &records);

    let decoded = decode_all(raw).unwrap();
    assert_eq!(&decoded[1..], &records[..]);

    let data = decoded[2].as_data().unwrap();
    assert_eq!(data.number, Some(0));
    assert_eq!(data.t1, Some(0.25));
}

#[test]
fn test_vector_2_v12_record_is_smaller_prelude_but_wider() {
    // v1.2: прелюдия 16 байт + half-выборки; v1.3: 6 байт + f32
    let l12 = Layout::for_version(FileVersion::V12);
    let l13 = Layout::for_version(FileVersion::V13);

    let r12 = Record::Data(shear_spectrum(FileVersion::V12, 0, 16));
    let r13 = Record::Data(shear_spectrum(FileVersion::V13, 0, 16));

    assert_eq!(r12.encode(l12).unwrap().len(), 4 + 16 + 16 * 2);
    assert_eq!(r13.encode(l13).unwrap().len(), 4 + 6 + 16 * 4);
}

// ===========================================================================
// Test Vector #3 — усечённый хвост
// ===========================================================================

#[test]
fn test_vector_3_truncated_tail_reports_not_fabricates() {
    let records = vec![
        Record::Data(pressure(FileVersion::V13, 0, 1.0)),
        Record::Data(pressure(FileVersion::V13, 1, 2.0)),
        Record::Data(shear_spectrum(FileVersion::V13, 2, 32)),
    ];
    let mut raw = build_stream(FileVersion::V13, &records);
    raw.truncate(raw.len() - 7); // рвём последний record

    let mut reader = QReader::new(Cursor::new(raw));
    let mut ok = 0usize;
    let mut err = None;
    for item in reader.by_ref() {
        match item {
            Ok(_) => ok += 1,
            Err(e) => {
                err = Some(e);
                break;
            }
        }
    }

    // Все предыдущие record'ы выданы, затем TruncatedRecord
    assert_eq!(ok, 3); // заголовок + два полных data
    assert!(matches!(err, Some(QfError::TruncatedRecord { index: 3, .. })));
    assert!(reader.next().is_none(), "после фатальной ошибки поток мёртв");
}

// ===========================================================================
// Слияние
// ===========================================================================

#[test]
fn test_merge_identity_through_codec() {
    let records = vec![
        sample_config(),
        Record::Data(pressure(FileVersion::V13, 0, 1.0)),
    ];
    let raw = build_stream(FileVersion::V13, &records);

    let source = QReader::new(Cursor::new(raw.clone()));
    let merger = Merger::new(vec![source]).unwrap();
    let merged: Vec<Record> = merger.map(|r| r.unwrap()).collect();

    let direct = decode_all(raw).unwrap();
    assert_eq!(merged, direct);
}

#[test]
fn test_merge_ordering_two_decoded_files() {
    let raw1 = build_stream(
        FileVersion::V13,
        &[
            Record::Data(pressure(FileVersion::V13, 0, 1.0)),
            Record::Data(pressure(FileVersion::V13, 1, 2.0)),
        ],
    );
    let raw2 = build_stream(
        FileVersion::V13,
        &[Record::Data(shear_spectrum(FileVersion::V13, 0, 8))],
    );

    let merger = Merger::new(vec![
        QReader::new(Cursor::new(raw1)),
        QReader::new(Cursor::new(raw2)),
    ])
    .unwrap();
    let merged: Vec<Record> = merger.map(|r| r.unwrap()).collect();

    assert_eq!(merged.len(), 4);
    let ids: Vec<u16> = merged[1..]
        .iter()
        .map(|r| r.as_data().unwrap().channel.id())
        .collect();
    assert_eq!(ids, vec![0x160, 0x160, 0x920]);
}

#[test]
fn test_merge_version_conflict_zero_records() {
    let raw1 = build_stream(FileVersion::V13, &[]);
    let raw2 = build_stream(FileVersion::V12, &[]);

    let err = Merger::new(vec![
        QReader::new(Cursor::new(raw1)),
        QReader::new(Cursor::new(raw2)),
    ])
    .unwrap_err();

    assert!(matches!(err, QfError::VersionConflict { stream: 1, .. }));
}

#[test]
fn test_merge_files_on_disk() {
    init_logs();
    let raw1 = build_stream(
        FileVersion::V13,
        &[
            sample_config(),
            Record::Data(pressure(FileVersion::V13, 0, 1.0)),
        ],
    );
    let raw2 = build_stream(
        FileVersion::V13,
        &[Record::Data(pressure(FileVersion::V13, 1, 2.0))],
    );

    let mut f1 = NamedTempFile::new().unwrap();
    f1.write_all(&raw1).unwrap();
    let mut f2 = NamedTempFile::new().unwrap();
    f2.write_all(&raw2).unwrap();

    let mut out = Cursor::new(Vec::new());
    let bytes = merge_files(&[f1.path(), f2.path()], &mut out).unwrap();
    assert!(bytes > 0);

    out.seek(SeekFrom::Start(0)).unwrap();
    let merged = read_all(&mut QReader::new(out)).unwrap();
    assert_eq!(merged.len(), 4); // заголовок + config + два data

    let values: Vec<f32> = merged
        .iter()
        .filter_map(|r| r.as_data())
        .map(|d| match d.payload {
            Payload::Scalar(v) => v,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(values, vec![1.0, 2.0]);
}

// ===========================================================================
// Сокращение
// ===========================================================================

#[test]
fn test_reduce_through_codec() {
    let raw = build_stream(
        FileVersion::V13,
        &[
            sample_config(),
            Record::Data(pressure(FileVersion::V13, 0, 1.0)),
            Record::Data(shear_spectrum(FileVersion::V13, 1, 8)),
            Record::Data(pressure(FileVersion::V13, 2, 3.0)),
        ],
    );

    let reducer = reduce(QReader::new(Cursor::new(raw)), |d| d.is_spectral());
    let reduced: Vec<Record> = reducer.map(|r| r.unwrap()).collect();

    assert_eq!(reduced.len(), 3); // заголовок + config + спектр
    assert_eq!(reduced[2].as_data().unwrap().channel.id(), 0x920);
}

#[test]
fn test_reduced_stream_reencodes_and_redecodes() {
    let raw = build_stream(
        FileVersion::V13,
        &[
            sample_config(),
            Record::Data(pressure(FileVersion::V13, 0, 1.0)),
            Record::Data(shear_spectrum(FileVersion::V13, 1, 8)),
        ],
    );

    // reduce -> encode -> decode: спектр пережил полный цикл нетронутым
    let reducer = reduce(QReader::new(Cursor::new(raw)), |d| d.is_spectral());
    let mut records = Vec::new();
    let mut header = None;
    for item in reducer {
        match item.unwrap() {
            Record::Header(h) => header = Some(h),
            other => records.push(other),
        }
    }

    let mut writer = QWriter::new(Cursor::new(Vec::new()), header.unwrap()).unwrap();
    for record in &records {
        writer.write_record(record).unwrap();
    }
    let raw2 = writer.finish().unwrap().into_inner();

    let decoded = decode_all(raw2).unwrap();
    assert_eq!(&decoded[1..], &records[..]);
}

#[test]
fn test_reduce_spec_end_to_end() {
    let spec = ReduceSpec::from_json(
        r#"{"channels": ["pressure"], "spectra": [], "config": ["fft_length"]}"#,
    )
    .unwrap();

    let raw = build_stream(
        FileVersion::V13,
        &[
            sample_config(),
            Record::Data(pressure(FileVersion::V13, 0, 1.0)),
            Record::Data(shear_spectrum(FileVersion::V13, 1, 8)),
        ],
    );

    let reduced: Vec<Record> = spec
        .reducer(QReader::new(Cursor::new(raw)))
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(reduced.len(), 3);
    let cfg = reduced[1].as_config().unwrap();
    assert_eq!(cfg.len(), 1);
    assert_eq!(cfg.get("fft_length"), Some(&ConfigValue::Integer(4)));
    assert_eq!(reduced[2].as_data().unwrap().channel.id(), 0x160);
}

#[test]
fn test_decimate_through_codec() {
    let mut records = Vec::new();
    for i in 0..10 {
        records.push(Record::Data(pressure(FileVersion::V13, i, i as f32)));
    }
    let raw = build_stream(FileVersion::V13, &records);

    let stride = NonZeroUsize::new(4).unwrap();
    let decimated: Vec<Record> = Decimator::new(QReader::new(Cursor::new(raw)), stride)
        .map(|r| r.unwrap())
        .collect();

    // Остаются record'ы 0, 4, 8
    assert_eq!(decimated.len(), 4);
    let numbers: Vec<f32> = decimated[1..]
        .iter()
        .map(|r| match r.as_data().unwrap().payload {
            Payload::Scalar(v) => v,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(numbers, vec![0.0, 4.0, 8.0]);
}

// ===========================================================================
// Файловый ввод-вывод
// ===========================================================================

#[test]
fn test_open_and_stats_on_disk() {
    let raw = build_stream(
        FileVersion::V12,
        &[
            sample_config(),
            Record::Data(pressure(FileVersion::V12, 0, 1.0)),
        ],
    );
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&raw).unwrap();

    let mut reader = QReader::open(file.path()).unwrap();
    let records = read_all(&mut reader).unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(reader.version(), Some(FileVersion::V12));
    assert_eq!(reader.stats().records_ok, 3);
    assert_eq!(reader.stats().bytes_processed, raw.len() as u64);
}

#[test]
fn test_writer_backfills_v12_count_on_disk() {
    let file = NamedTempFile::new().unwrap();
    let mut writer = QWriter::new(file.reopen().unwrap(), deterministic_header(FileVersion::V12))
        .unwrap();
    for i in 0..5 {
        writer
            .write_record(&Record::Data(pressure(FileVersion::V12, i, i as f32)))
            .unwrap();
    }
    writer.finish().unwrap();

    let mut reader = QReader::open(file.path()).unwrap();
    let header = reader.next().unwrap().unwrap();
    assert_eq!(header.as_header().unwrap().record_count, Some(5));
}
