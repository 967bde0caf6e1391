use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tandem_parser::{parse, serialize};

const DASHBOARD: &str = include_str!("../tests/fixtures/dashboard.tsx");

fn parse_simple_component(c: &mut Criterion) {
    let source = r#"
        export default function Button({ label }: { label: string }) {
            return (
                <button data-oid="b1" className="px-4 py-2 rounded">
                    {label}
                </button>
            );
        }
    "#;

    c.bench_function("parse_simple_component", |b| {
        b.iter(|| parse(black_box(source)))
    });
}

fn parse_dashboard(c: &mut Criterion) {
    c.bench_function("parse_dashboard", |b| b.iter(|| parse(black_box(DASHBOARD))));
}

fn round_trip_dashboard(c: &mut Criterion) {
    c.bench_function("round_trip_dashboard", |b| {
        b.iter(|| {
            let doc = parse(black_box(DASHBOARD)).unwrap();
            serialize(&doc)
        })
    });
}

criterion_group!(
    benches,
    parse_simple_component,
    parse_dashboard,
    round_trip_dashboard
);
criterion_main!(benches);
