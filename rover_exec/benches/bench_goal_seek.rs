//! # Goal Seek Benchmark

use criterion::{criterion_group, criterion_main, Criterion};

use rover_lib::motion_ctrl::{GoalSeek, Params, Pose, WheelChannel};

fn goal_seek_benchmark(c: &mut Criterion) {
    let params = Params::default();
    let left = WheelChannel::new(&params.left_wheel);
    let right = WheelChannel::new(&params.right_wheel);

    c.bench_function("goal_seek_step", |b| {
        let mut gs = GoalSeek::new(5.0, 5.0, 0.0, &params);
        let pose = Pose::default();

        b.iter(|| gs.step(&pose, &params, &left, &right));
    });

    c.bench_function("pose_integrate_arc", |b| {
        let mut pose = Pose::default();

        b.iter(|| pose.integrate_arc(0.003, 0.0031, params.track_width_m));
    });
}

criterion_group!(benches, goal_seek_benchmark);
criterion_main!(benches);
