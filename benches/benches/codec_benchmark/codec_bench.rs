//! Пропускная способность кодека: декодирование, кодирование, слияние.

use std::hint::black_box;
use std::io::Cursor;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use qfile_core::{Layout, Merger, QReader, RecordEncodeExt};
use qfile_types::{ChannelRef, DataRecord, FileVersion, HeaderRecord, Payload, Record};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Правдоподобный спектр сдвига: затухающий наклон с шумом.
fn shear_bins(rng: &mut StdRng, n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| {
            let slope = 1.0 / (1.0 + i as f32 * 0.1);
            slope + rng.gen_range(-0.05..0.05)
        })
        .collect()
}

fn build_records(version: FileVersion, count: usize, bins: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(42);
    let channel = ChannelRef::Known(qfile_core::hexcodes::lookup(0x920).expect("shear_raw"));

    (0..count)
        .map(|n| {
            let mut record = DataRecord::new(
                channel,
                n as f32 * 0.5,
                Payload::Spectrum(shear_bins(&mut rng, bins)),
            );
            if version.is_v12() {
                record.number = Some(n as u16);
                record.error_code = Some(0);
                record.t1 = Some(n as f32 * 0.5 + 0.25);
            }
            Record::Data(record)
        })
        .collect()
}

fn build_stream(version: FileVersion, count: usize, bins: usize) -> Vec<u8> {
    let layout = Layout::for_version(version);
    let header = HeaderRecord::new(version, 1_000, 512.0);
    let mut raw = Record::Header(header).encode(layout).expect("header");
    for record in build_records(version, count, bins) {
        raw.extend_from_slice(&record.encode(layout).expect("record"));
    }
    raw
}

fn bench_decode(c: &mut Criterion) {
    let v12 = build_stream(FileVersion::V12, 256, 64);
    let v13 = build_stream(FileVersion::V13, 256, 64);

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Elements(256));

    group.bench_function("v12/256rec/64bins", |b| {
        b.iter(|| {
            let reader = QReader::new(Cursor::new(black_box(&v12)));
            reader.filter_map(|r| r.ok()).count()
        })
    });
    group.bench_function("v13/256rec/64bins", |b| {
        b.iter(|| {
            let reader = QReader::new(Cursor::new(black_box(&v13)));
            reader.filter_map(|r| r.ok()).count()
        })
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let records_v12 = build_records(FileVersion::V12, 256, 64);
    let records_v13 = build_records(FileVersion::V13, 256, 64);
    let l12 = Layout::for_version(FileVersion::V12);
    let l13 = Layout::for_version(FileVersion::V13);

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(256));

    group.bench_function("v12/256rec/64bins", |b| {
        b.iter(|| {
            records_v12
                .iter()
                .map(|r| black_box(r).encode(l12).expect("encode").len())
                .sum::<usize>()
        })
    });
    group.bench_function("v13/256rec/64bins", |b| {
        b.iter(|| {
            records_v13
                .iter()
                .map(|r| black_box(r).encode(l13).expect("encode").len())
                .sum::<usize>()
        })
    });

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let raw1 = build_stream(FileVersion::V13, 128, 64);
    let raw2 = build_stream(FileVersion::V13, 128, 64);

    let mut group = c.benchmark_group("merge");
    group.throughput(Throughput::Elements(256));

    group.bench_function("two_streams/256rec", |b| {
        b.iter(|| {
            let merger = Merger::new(vec![
                QReader::new(Cursor::new(black_box(&raw1))),
                QReader::new(Cursor::new(black_box(&raw2))),
            ])
            .expect("merge");
            merger.filter_map(|r| r.ok()).count()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode, bench_merge);
criterion_main!(benches);
