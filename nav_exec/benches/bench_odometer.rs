//! # Odometer Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use nav_lib::{
    loco::ChassisParams,
    odom_corr::{compute_correction, OdomCorrParams},
    odometer::{integrate, WheelEncoderDelta},
    pose::Pose,
};

fn odometer_benchmark(c: &mut Criterion) {
    let chassis = ChassisParams::default();

    // A gentle left arc, typical of one cycle at full speed
    let delta = WheelEncoderDelta {
        left_deg: 4.0,
        right_deg: 4.5,
    };

    c.bench_function("integrate", |b| {
        b.iter(|| integrate(black_box(Pose::new(12.0, 40.0, 1.2)), black_box(delta), &chassis))
    });

    // Integrate a full lap of small steps
    c.bench_function("integrate 1000 steps", |b| {
        b.iter(|| {
            let mut pose = Pose::default();
            for _ in 0..1000 {
                pose = integrate(pose, black_box(delta), &chassis);
            }
            pose
        })
    });

    let corr_params = OdomCorrParams::default();
    c.bench_function("compute_correction", |b| {
        b.iter(|| {
            compute_correction(
                black_box(Pose::new(31.2, 60.1, 0.02)),
                black_box(30.9),
                black_box(30.3),
                &corr_params,
                30.48,
            )
        })
    });
}

criterion_group!(benches, odometer_benchmark);
criterion_main!(benches);
