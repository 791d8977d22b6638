use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use coordwatch::{extract_chat_message, extract_coordinates, CoordinateEntry};

const CHAT_WITH_COORDS: &str = "[09:01:30] [Server thread/INFO]: <Steve> 12,5,-8 spawn\n";
const CHAT_WITHOUT_COORDS: &str =
    "[09:02:11] [Server thread/INFO]: <Alex> anyone up for the end tonight?\n";
const SERVER_LINE: &str =
    "[09:02:40] [Server thread/INFO]: Saving the game (this may take a moment!)\n";

fn bench_chat_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_chat_message");
    for (name, line) in [
        ("chat", CHAT_WITH_COORDS),
        ("server", SERVER_LINE),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| black_box(extract_chat_message(black_box(line))));
        });
    }
    group.finish();
}

fn bench_coordinates(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_coordinates");
    for (name, text) in [
        ("comma_triplet", "100, 64, -200 base"),
        ("pair_after_label", "home -50 120"),
        ("decimals", "-1234.5;70.25;987.75 nether hub"),
        ("no_match", "anyone up for the end tonight?"),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, text| {
            b.iter(|| black_box(extract_coordinates(black_box(text))));
        });
    }
    group.finish();
}

fn bench_mixed_log(c: &mut Criterion) {
    let lines: Vec<&str> = [CHAT_WITH_COORDS, CHAT_WITHOUT_COORDS, SERVER_LINE, SERVER_LINE]
        .iter()
        .cycle()
        .take(10_000)
        .copied()
        .collect();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("mixed_10k_lines", |b| {
        b.iter(|| {
            let found = lines
                .iter()
                .filter_map(|line| extract_chat_message(line))
                .filter_map(|message| CoordinateEntry::from_message(&message, date))
                .count();
            black_box(found)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_chat_message, bench_coordinates, bench_mixed_log);
criterion_main!(benches);
