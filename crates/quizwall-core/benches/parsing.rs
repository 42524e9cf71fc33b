use criterion::{black_box, criterion_group, criterion_main, Criterion};

use quizwall_core::parser::{parse_pool_json, validate_pool};
use quizwall_core::store::parse_snapshot;

fn bench_pool_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_parsing");

    let small = generate_pool_json(10);
    let medium = generate_pool_json(100);
    let large = generate_pool_json(1_000);

    group.bench_function("10_questions", |b| {
        b.iter(|| parse_pool_json(black_box(&small), "bench"))
    });

    group.bench_function("100_questions", |b| {
        b.iter(|| parse_pool_json(black_box(&medium), "bench"))
    });

    group.bench_function("1000_questions", |b| {
        b.iter(|| parse_pool_json(black_box(&large), "bench"))
    });

    if let Ok(pool) = parse_pool_json(&large, "bench") {
        group.bench_function("validate_1000_questions", |b| {
            b.iter(|| validate_pool(black_box(&pool)))
        });
    }

    group.finish();
}

fn bench_snapshot_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_parsing");

    let small = generate_snapshot_json(1, 3);
    let large = generate_snapshot_json(10, 30);

    group.bench_function("1_module_3_attempts", |b| {
        b.iter(|| parse_snapshot(black_box(&small)))
    });

    group.bench_function("10_modules_30_attempts", |b| {
        b.iter(|| parse_snapshot(black_box(&large)))
    });

    group.finish();
}

fn generate_pool_json(n: usize) -> String {
    let questions: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#"{{"id":"q{i}","prompt":"Question {i}?","choices":["a{i}","b{i}","c{i}","d{i}"],"answerIndex":{},"tags":["bench"],"explainCorrect":"Because.","explainIncorrect":{{"0":"No.","1":"No.","2":"No.","3":"No."}}}}"#,
                i % 4
            )
        })
        .collect();
    format!(r#"{{"title":"Bench","questions":[{}]}}"#, questions.join(","))
}

fn generate_snapshot_json(modules: usize, attempts: usize) -> String {
    let module_entries: Vec<String> = (0..modules)
        .map(|m| {
            let history: Vec<String> = (0..attempts)
                .map(|a| {
                    format!(
                        r#"{{"at":"2024-01-01T00:00:00Z","seed":{a},"autoSubmit":false,"scorePct":70,"correct":7,"total":10,"elapsedSec":60,"perQuestion":[{{"id":"q{a}","chosenIndex":1,"correctIndex":1,"ok":true}}]}}"#
                    )
                })
                .collect();
            format!(
                r#""{m:02}":{{"attempts":{attempts},"completed":false,"bestScorePct":70,"totalTimeSec":{},"lastAttemptAt":"2024-01-01T00:00:00Z","history":[{}],"itemStats":{{}}}}"#,
                attempts * 60,
                history.join(",")
            )
        })
        .collect();
    format!(
        r#"{{"version":"1.0.0","course":"BENCH","createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z","modules":{{{}}}}}"#,
        module_entries.join(",")
    )
}

criterion_group!(benches, bench_pool_parsing, bench_snapshot_parsing);
criterion_main!(benches);
