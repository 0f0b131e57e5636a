#![allow(unused_must_use)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::{fs, fs::File, io::Write, path::Path};
use tempfile::tempdir;
use treescout::{LocalFs, MatchMode, RuleChain, SearchJob, SearchSettings};

/// `dirs` folders of `files_per_dir` files, each `lines_per_file` lines long
fn create_test_tree(
    root: &Path,
    dirs: usize,
    files_per_dir: usize,
    lines_per_file: usize,
) -> std::io::Result<()> {
    for d in 0..dirs {
        let dir = root.join(format!("dir_{}", d));
        fs::create_dir_all(&dir)?;
        for i in 0..files_per_dir {
            let ext = if i % 2 == 0 { "txt" } else { "log" };
            let mut file = File::create(dir.join(format!("file_{}.{}", i, ext)))?;
            for j in 0..lines_per_file {
                writeln!(
                    file,
                    "Line {} TODO: fix bug {} FIXME: optimize line {} NOTE: important task {}",
                    j, j, j, j
                )?;
            }
        }
    }
    Ok(())
}

fn run_search(root: &Path, settings: &SearchSettings) -> usize {
    let job = SearchJob::new(RuleChain::standard(settings), &[root], settings).unwrap();
    job.run().matches
}

fn bench_patterns(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    create_test_tree(dir.path(), 5, 20, 50)?;

    let cases = vec![
        ("name_glob", Some("*.txt"), MatchMode::Glob, None, MatchMode::Glob),
        ("name_regex", Some(r"file_\d+\.txt$"), MatchMode::Regex, None, MatchMode::Glob),
        ("content_glob", None, MatchMode::Glob, Some("*FIXME*line 49*"), MatchMode::Glob),
        ("content_regex", None, MatchMode::Glob, Some(r"NOTE:.*task 4\d"), MatchMode::Regex),
    ];

    let mut group = c.benchmark_group("Patterns");
    for (label, name, name_mode, content, content_mode) in cases {
        let settings = SearchSettings {
            name_pattern: name.map(str::to_string),
            name_mode,
            content_pattern: content.map(str::to_string),
            content_mode,
            ..SearchSettings::default()
        };

        group.bench_function(label, |b| {
            b.iter(|| black_box(run_search(dir.path(), &settings)));
        });
    }
    group.finish();
    Ok(())
}

fn bench_tree_scaling(c: &mut Criterion) -> std::io::Result<()> {
    let settings = SearchSettings {
        name_pattern: Some("*.txt".to_string()),
        ..SearchSettings::default()
    };

    let mut group = c.benchmark_group("Tree Scaling");
    for &dirs in &[1, 10, 100] {
        let dir = tempdir()?;
        create_test_tree(dir.path(), dirs, 10, 1)?;

        group.bench_function(format!("dirs_{}", dirs), |b| {
            b.iter(|| black_box(run_search(dir.path(), &settings)));
        });
    }
    group.finish();
    Ok(())
}

fn bench_scan_strategies(c: &mut Criterion) -> std::io::Result<()> {
    let dir = tempdir()?;
    create_test_tree(dir.path(), 2, 10, 2000)?;

    let settings = SearchSettings {
        content_pattern: Some(r"(?m)task 1999$".to_string()),
        content_mode: MatchMode::Regex,
        ..SearchSettings::default()
    };

    let mut group = c.benchmark_group("Scan Strategies");
    group.bench_function("mapped", |b| {
        b.iter(|| {
            let job = SearchJob::new(RuleChain::standard(&settings), &[dir.path()], &settings)
                .unwrap();
            black_box(job.run());
        });
    });
    group.bench_function("streamed", |b| {
        b.iter(|| {
            let job = SearchJob::new(RuleChain::standard(&settings), &[dir.path()], &settings)
                .unwrap()
                .with_file_system(LocalFs::streamed());
            black_box(job.run());
        });
    });
    group.finish();
    Ok(())
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_patterns, bench_tree_scaling, bench_scan_strategies
}

#[test]
fn ensure_benchmarks_valid() {
    benches();
}

criterion_main!(benches);
