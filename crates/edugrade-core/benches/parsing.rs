use criterion::{black_box, criterion_group, criterion_main, Criterion};

use edugrade_core::parser::parse_assignment_set_str;
use edugrade_core::structure::HtmlStructure;

fn bench_toml_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("toml_parsing");

    let small_toml = generate_assignment_set_toml(5);
    let medium_toml = generate_assignment_set_toml(50);
    let large_toml = generate_assignment_set_toml(200);

    for (name, toml) in [
        ("5_assignments", &small_toml),
        ("50_assignments", &medium_toml),
        ("200_assignments", &large_toml),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| parse_assignment_set_str(black_box(toml), black_box("bench.toml".as_ref())))
        });
    }

    group.finish();
}

fn bench_structure(c: &mut Criterion) {
    let page = r#"<!DOCTYPE html>
<html>
<head><title>Страница</title></head>
<body>
  <header><h1>Привет мир</h1></header>
  <main>
    <p>Первый <strong>абзац</strong></p>
    <ul><li>Один</li><li>Два</li></ul>
  </main>
</body>
</html>"#;

    c.bench_function("html_structure", |b| {
        b.iter(|| HtmlStructure::parse(black_box(page)))
    });
}

fn generate_assignment_set_toml(n: usize) -> String {
    let mut s = String::new();
    s.push_str(
        r#"[assignment_set]
id = "bench"
name = "Benchmark"
default_language = "ru"
"#,
    );
    for i in 0..n {
        s.push_str(&format!(
            r#"
[[assignments]]
id = "assignment_{i}"
title = "Assignment {i}"
module_id = "module-{m}"
kind = "html"
expected = "<h1>Заголовок {i}</h1><p>Текст</p>"
tags = ["bench"]
"#,
            m = i % 5
        ));
    }
    s
}

criterion_group!(benches, bench_toml_parsing, bench_structure);
criterion_main!(benches);
