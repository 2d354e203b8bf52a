use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use ratatui::layout::Rect;
use ratatui::prelude::Buffer;
use ratatui::widgets::StatefulWidget;
use serde_json::{Value, json};
use std::hint::black_box;

use tui_treemarkup::{AutoOpen, Tree, TreeConfig, TreeView, TreeViewState, TreeViewStyle};

/// `width` items per level, `depth` levels deep.
fn make_items(width: usize, depth: usize) -> Value {
    let items: Vec<Value> = (0..width)
        .map(|i| {
            if depth > 1 {
                json!({ "name": format!("node-{depth}-{i}"), "children": make_items(width, depth - 1) })
            } else {
                json!(format!("leaf-{i}"))
            }
        })
        .collect();
    Value::Array(items)
}

fn config() -> TreeConfig {
    TreeConfig::new().with_auto_open(AutoOpen::Disabled)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree/build");
    for (width, depth) in [(10, 2), (8, 3), (6, 4)] {
        let items = make_items(width, depth);
        group.bench_with_input(
            BenchmarkId::new("from_data", format!("{width}x{depth}")),
            &items,
            |b, items| {
                b.iter_batched(
                    || items.clone(),
                    |items| black_box(Tree::from_data(items, config())),
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

fn bench_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree/paths");
    let Ok(tree) = Tree::from_data(make_items(8, 4), config()) else {
        return;
    };
    group.bench_function("get_deep", |b| {
        b.iter(|| black_box(tree.get(black_box(&[8, 7, 6, 5]))));
    });
    group.bench_function("position_deep", |b| {
        let node = tree.get(&[8, 7, 6, 5]);
        b.iter(|| black_box(node.map(|node| node.position())));
    });
    group.finish();
}

fn bench_toggle(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree/toggle");
    let Ok(mut tree) = Tree::from_data(make_items(8, 4), config()) else {
        return;
    };
    group.bench_function("open_iterate_close_iterate", |b| {
        b.iter(|| {
            black_box(tree.open(&[4, 4, 4], true));
            black_box(tree.close(&[4], true));
        });
    });
    group.bench_function("select_cycle", |b| {
        b.iter(|| {
            black_box(tree.select(&[1, 1, 1, 1]));
            black_box(tree.select(&[8, 8, 8, 8]));
        });
    });
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("view/render");
    let Ok(tree) = Tree::from_data(
        make_items(6, 4),
        TreeConfig::new().with_auto_open(AutoOpen::AllBranches),
    ) else {
        return;
    };
    let area = Rect::new(0, 0, 80, 40);
    group.bench_function("all_open", |b| {
        let mut state = TreeViewState::new();
        b.iter(|| {
            let mut buffer = Buffer::empty(area);
            TreeView::new(&tree, TreeViewStyle::default()).render(area, &mut buffer, &mut state);
            black_box(buffer);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_paths, bench_toggle, bench_render);
criterion_main!(benches);
