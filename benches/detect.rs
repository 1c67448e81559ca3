use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use utf8_convert::{convert, detect};

const SAMPLE: &str = "Съешь же ещё этих мягких французских булок, да выпей чаю. \
                      The quick brown fox jumps over the lazy dog.\n";

fn corpus(repeat: usize) -> String {
    SAMPLE.repeat(repeat)
}

fn windows_1251(text: &str) -> Vec<u8> {
    // ASCII and the Russian alphabet only
    text.chars()
        .map(|c| match c {
            'ё' => 0xB8,
            'Ё' => 0xA8,
            'А'..='я' => (c as u32 - 0x0410 + 0xC0) as u8,
            _ => c as u8,
        })
        .collect()
}

fn bench_detect(c: &mut Criterion) {
    let text = corpus(256);
    let utf8 = text.as_bytes().to_vec();
    let utf16: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    let cp1251 = windows_1251(&text);

    let mut group = c.benchmark_group("detect");
    for (name, data) in [("utf8", &utf8), ("utf16le", &utf16), ("windows-1251", &cp1251)] {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(name, |b| b.iter(|| detect(black_box(data))));
    }
    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let cp1251 = windows_1251(&corpus(256));

    let mut group = c.benchmark_group("convert");
    group.throughput(Throughput::Bytes(cp1251.len() as u64));
    group.bench_function("windows-1251", |b| b.iter(|| convert(black_box(&cp1251))));
    group.finish();
}

criterion_group!(benches, bench_detect, bench_convert);
criterion_main!(benches);
