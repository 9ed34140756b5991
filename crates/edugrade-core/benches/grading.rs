use criterion::{black_box, criterion_group, criterion_main, Criterion};

use edugrade_core::model::LanguageTag;
use edugrade_core::normalize::normalize_html;
use edugrade_core::Grader;

fn bench_grade_html(c: &mut Criterion) {
    let mut group = c.benchmark_group("grade_html");
    let grader = Grader::new();

    let expected = "<h1>Привет мир</h1><p>Первый абзац</p>";
    let identical = "<h1>Привет мир</h1>\n<p>Первый абзац</p>";
    let wrapped = "<div class=\"page\"><h1>Привет мир</h1><p>Первый абзац</p></div>";
    let translated = "<h1>Сәлем әлем</h1><p>Первый абзац</p>";
    let wrong_tag = "<h2>Привет мир</h2><p>Первый абзац</p>";

    let large = {
        let mut s = String::from("<ul>");
        for i in 0..200 {
            s.push_str(&format!("<li data-index=\"{i}\">Пункт {i}</li>"));
        }
        s.push_str("</ul>");
        s
    };

    group.bench_function("normalized_match", |b| {
        b.iter(|| grader.grade_html(black_box(identical), black_box(expected), None))
    });

    group.bench_function("containment", |b| {
        b.iter(|| grader.grade_html(black_box(wrapped), black_box(expected), None))
    });

    group.bench_function("lenient_kz", |b| {
        b.iter(|| {
            grader.grade_html(
                black_box(translated),
                black_box(expected),
                Some(LanguageTag::Kz),
            )
        })
    });

    group.bench_function("missing_tag", |b| {
        b.iter(|| grader.grade_html(black_box(wrong_tag), black_box(expected), None))
    });

    group.bench_function("200_items", |b| {
        b.iter(|| grader.grade_html(black_box(&large), black_box(&large), None))
    });

    group.finish();
}

fn bench_grade_console(c: &mut Criterion) {
    let mut group = c.benchmark_group("grade_console");
    let grader = Grader::new();

    group.bench_function("exact", |b| {
        b.iter(|| grader.grade_console(black_box("  42\n"), black_box("42"), None))
    });

    group.bench_function("lenient_kz", |b| {
        b.iter(|| {
            grader.grade_console(
                black_box("Сәлем әлем"),
                black_box("Привет мир"),
                Some(LanguageTag::Kz),
            )
        })
    });

    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let markup = "<div id=\"root\" data-test='x'>\n  <p >Hello   World</p>\n</div>";
    c.bench_function("normalize_html", |b| {
        b.iter(|| normalize_html(black_box(markup)))
    });
}

criterion_group!(benches, bench_grade_html, bench_grade_console, bench_normalize);
criterion_main!(benches);
