use criterion::{black_box, criterion_group, criterion_main, Criterion};

use scanclip::{
    generators::{checkerboard, slanted_checkerboard, slanties, star},
    ClipType, Clipper, FillRule, Paths, PolyTree, PolyType,
};

fn clipper_for(subject: &Paths, clip: &Paths) -> Clipper {
    let mut clipper = Clipper::new();
    clipper.add_paths(subject, PolyType::Subject, true).unwrap();
    clipper.add_paths(clip, PolyType::Clip, true).unwrap();
    clipper
}

fn add_paths(c: &mut Criterion) {
    let (even, odd) = checkerboard(10);

    c.bench_function("add paths", |b| {
        b.iter(|| black_box(clipper_for(&even, &odd)))
    });
}

fn xor(c: &mut Criterion) {
    let (even, odd) = checkerboard(10);
    let mut clipper = clipper_for(&even, &odd);

    c.bench_function("xor", |b| {
        b.iter(|| {
            black_box(
                clipper
                    .execute(ClipType::Xor, FillRule::EvenOdd, FillRule::EvenOdd)
                    .unwrap(),
            )
        });
    });

    let (even, odd) = slanted_checkerboard(10);
    let mut clipper = clipper_for(&even, &odd);
    c.bench_function("xor slanted", |b| {
        b.iter(|| {
            black_box(
                clipper
                    .execute(ClipType::Xor, FillRule::EvenOdd, FillRule::EvenOdd)
                    .unwrap(),
            )
        });
    });
}

fn many_crossings(c: &mut Criterion) {
    let (even, odd) = slanties(30);
    let mut clipper = clipper_for(&even, &odd);
    let mut tree = PolyTree::new();

    c.bench_function("slanties intersection tree", |b| {
        b.iter(|| {
            clipper
                .execute_into(
                    ClipType::Intersection,
                    FillRule::NonZero,
                    FillRule::NonZero,
                    &mut tree,
                )
                .unwrap();
            black_box(tree.len())
        });
    });

    let star = star(101, 100_000);
    let mut clipper = clipper_for(&star, &Paths::new());
    c.bench_function("star union", |b| {
        b.iter(|| {
            black_box(
                clipper
                    .execute(ClipType::Union, FillRule::NonZero, FillRule::NonZero)
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, add_paths, xor, many_crossings);
criterion_main!(benches);
