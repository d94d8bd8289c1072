//! Benchmarks for template parsing and rendering.

#![allow(clippy::format_push_string, clippy::cast_precision_loss)] // Benchmark setup code

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use bf_engine::{BindingValue, Bindings, HtmlBackend, Template};

/// Generate a template with `sections` selectors, each holding values and a score.
fn generate_template(sections: usize) -> String {
    let mut md = String::with_capacity(sections * 300);
    md.push_str("# Befund\n\n");

    for i in 0..sections {
        md.push_str(&format!("## Abschnitt {i}\n\n"));
        md.push_str(&format!(
            "Wert :value{{primary=\"v{i}\" type=\"number\" unit=\"mg\"}} und \
             Summe :score{{formula=\"v{i}*2+x\" unit=\"Punkte\"}}\n\n"
        ));
        md.push_str(&format!(":::selector{{primary=\"s{i}\"}}\n"));
        md.push_str(":::case{primary=\"ja\"}\n**Auffällig** bei :value{primary=\"x\"}\n:::\n");
        md.push_str(":::case{primary=\"nein\"}\nUnauffällig.\n:::\n:::\n\n");
    }
    md
}

fn generate_bindings(sections: usize) -> Bindings {
    let mut bindings = Bindings::new();
    bindings.insert("x".to_owned(), BindingValue::Number(1.0));
    for i in 0..sections {
        bindings.insert(format!("v{i}"), BindingValue::Number(i as f64));
        bindings.insert(format!("s{i}"), BindingValue::from("ja"));
    }
    bindings
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_and_extract");

    for sections in [5, 20, 100] {
        let source = generate_template(sections);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(sections), &source, |b, source| {
            b.iter(|| Template::parse(source).map(|t| t.inputs().len()));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for sections in [5, 20, 100] {
        let template = Template::parse(&generate_template(sections)).unwrap();
        let bindings = generate_bindings(sections);

        group.bench_with_input(BenchmarkId::new("fresh", sections), &bindings, |b, bindings| {
            b.iter(|| template.renderer::<HtmlBackend>().render(bindings));
        });

        let mut renderer = template.renderer::<HtmlBackend>();
        renderer.render(&bindings);
        let mut changed = bindings.clone();
        group.bench_with_input(BenchmarkId::new("one_key_changed", sections), &sections, |b, _| {
            let mut n = 0.0;
            b.iter(|| {
                n += 1.0;
                changed.insert("v0".to_owned(), BindingValue::Number(n));
                renderer.render(&changed)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_render);
criterion_main!(benches);
