use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jsondoc::{parse, JsonArray};

fn bench_append(c: &mut Criterion) {
    c.bench_function("append_1k_integers", |b| {
        b.iter(|| {
            let mut array = JsonArray::new();
            for i in 0..1000i64 {
                array.append(black_box(i));
            }
            array
        });
    });
}

fn bench_parse_and_walk(c: &mut Criterion) {
    let array: JsonArray = (0..1000i64).collect();
    let bytes = array.to_bytes().to_vec();

    c.bench_function("parse_1k_integers", |b| {
        b.iter(|| parse(black_box(&bytes)).unwrap());
    });

    let parsed = parse(&bytes).unwrap().into_array().unwrap();
    c.bench_function("get_last_of_1k", |b| {
        b.iter(|| parsed.get(black_box(999)).unwrap());
    });
}

fn bench_set(c: &mut Criterion) {
    c.bench_function("set_middle_of_1k", |b| {
        let mut array: JsonArray = (0..1000i64).collect();
        b.iter(|| {
            array.set(black_box(500), black_box(-1i64));
        });
    });
}

criterion_group!(benches, bench_append, bench_parse_and_walk, bench_set);
criterion_main!(benches);
