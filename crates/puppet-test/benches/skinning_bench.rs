//! Benchmarks for binding, skeleton update and the wire codec

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use puppet_core::Vec2;
use puppet_skeleton::SkeletonConfig;
use puppet_skin::{BindConfig, Illustration};
use puppet_test::{character_asset, face_from, pose_from, rest_positions};
use puppet_wire::{decode_frame, encode_frame, DiffEncoder, Payload, PeerMessage};

fn bench_bind(c: &mut Criterion) {
    let asset = character_asset();

    c.bench_function("illustration_bind", |b| {
        b.iter(|| {
            Illustration::bind(black_box(&asset), SkeletonConfig::default(), &BindConfig::default()).unwrap()
        })
    });
}

fn bench_update_pose_only(c: &mut Criterion) {
    let rest = rest_positions();
    let mut illustration =
        Illustration::bind(&character_asset(), SkeletonConfig::default(), &BindConfig::default()).unwrap();
    let poses = [
        pose_from(&rest, Vec2::new(4.0, 0.0), 0.9),
        pose_from(&rest, Vec2::new(-4.0, 2.0), 0.9),
    ];
    let mut i = 0;

    c.bench_function("update_pose_only", |b| {
        b.iter(|| {
            i ^= 1;
            black_box(illustration.update(&poses[i], None))
        })
    });
}

fn bench_update_with_face(c: &mut Criterion) {
    let rest = rest_positions();
    let mut illustration =
        Illustration::bind(&character_asset(), SkeletonConfig::default(), &BindConfig::default()).unwrap();
    let pose = pose_from(&rest, Vec2::new(4.0, 0.0), 0.9);
    let face = face_from(&rest, Vec2::new(4.0, 1.0), 0.95);

    c.bench_function("update_with_face", |b| {
        b.iter(|| black_box(illustration.update(&pose, Some(&face))))
    });
}

fn bench_keyframe_codec(c: &mut Criterion) {
    let rest = rest_positions();
    let mut illustration =
        Illustration::bind(&character_asset(), SkeletonConfig::default(), &BindConfig::default()).unwrap();
    illustration.update(&pose_from(&rest, Vec2::ZERO, 0.9), None);
    let snapshot = illustration.skeleton().snapshot();
    let diff = DiffEncoder::new(1, 0.0).encode(&snapshot.parts, snapshot.body_scale, snapshot.face_scale);
    let message = PeerMessage::new(1, Payload::SkeletonUpdate(diff));
    let bytes = encode_frame(&message).unwrap();

    c.bench_function("keyframe_encode", |b| b.iter(|| encode_frame(black_box(&message)).unwrap()));
    c.bench_function("keyframe_decode", |b| b.iter(|| decode_frame(black_box(&bytes)).unwrap()));
}

criterion_group!(
    benches,
    bench_bind,
    bench_update_pose_only,
    bench_update_with_face,
    bench_keyframe_codec
);
criterion_main!(benches);
