use super::*;
use crate::gpu::{GridField, Kernel, NumericType, Uniform};
use glam::Vec2;
use std::f32::consts::TAU;

const N: u32 = 16;

fn fields(size: u32) -> FluidFields {
    FluidFields::allocate((size, size), (size * 8, size * 8), NumericType::Float32, false).unwrap()
}

fn solver(iterations: u32, size: u32) -> PressureSolver {
    let constants = FluidConstants {
        jacobi_iterations: iterations,
        ..Default::default()
    };
    let mut solver = PressureSolver::new(&constants).unwrap();
    solver.set_px_size(Vec2::splat(1.0 / size as f32)).unwrap();
    solver
}

fn divergence_kernel(size: u32) -> Kernel {
    let mut kernel = Kernel::new(fluid_compute::DIVERGENCE);
    kernel
        .set_uniform("px_size", Uniform::Vec2(Vec2::splat(1.0 / size as f32)))
        .unwrap();
    kernel
}

fn sum_sq(field: &GridField<f32>) -> f32 {
    field.front().iter().map(|d| d * d).sum()
}

/// Discretely divergence-free field built from a periodic stream function
fn stream_function_field(size: u32) -> Vec<[f32; 2]> {
    let psi = |x: i64, y: i64| {
        let x = x.rem_euclid(size as i64) as f32;
        let y = y.rem_euclid(size as i64) as f32;
        (TAU * x / size as f32).sin() * (TAU * y / size as f32).cos() * 4.0
    };
    let mut data = Vec::new();
    for y in 0..size as i64 {
        for x in 0..size as i64 {
            let vx = -0.5 * (psi(x, y + 1) - psi(x, y - 1));
            let vy = 0.5 * (psi(x + 1, y) - psi(x - 1, y));
            data.push([vx, vy]);
        }
    }
    data
}

#[test]
fn test_velocity_grid_size_rounds_up() {
    assert_eq!(velocity_grid_size(100, 100, 8), (13, 13));
    assert_eq!(velocity_grid_size(50, 50, 8), (7, 7));
    assert_eq!(velocity_grid_size(64, 8, 8), (8, 1));
}

#[test]
fn test_divergence_of_single_texel() {
    let mut fluid = fields(N);
    let mut velocity = vec![[0.0f32; 2]; (N * N) as usize];
    velocity[(2 * N + 3) as usize] = [1.0, 0.0];
    fluid.velocity.write(&velocity).unwrap();

    compute_divergence(&divergence_kernel(N), &fluid.velocity, &mut fluid.divergence).unwrap();

    let div = fluid.divergence.view().unwrap();
    assert!((div.texel(2, 2) - 0.5).abs() < 1e-6);
    assert!((div.texel(4, 2) + 0.5).abs() < 1e-6);
    assert_eq!(div.texel(3, 2), 0.0);
}

#[test]
fn test_single_jacobi_iteration() {
    let mut fluid = fields(N);
    let mut divergence = vec![0.0f32; (N * N) as usize];
    divergence[(5 * N + 5) as usize] = 1.0;
    fluid.divergence.write(&divergence).unwrap();

    solver(1, N).solve(&fluid.divergence, &mut fluid.pressure).unwrap();

    let pressure = fluid.pressure.view().unwrap();
    // (N + S + E + W + alpha * d) * beta with alpha = -1, beta = 0.25
    assert!((pressure.texel(5, 5) + 0.25).abs() < 1e-6);
    assert_eq!(pressure.texel(6, 5), 0.0);
}

#[test]
fn test_projection_fixed_point_for_divergence_free_field() {
    let mut fluid = fields(N);
    let before = stream_function_field(N);
    fluid.velocity.write(&before).unwrap();

    compute_divergence(&divergence_kernel(N), &fluid.velocity, &mut fluid.divergence).unwrap();
    assert!(sum_sq(&fluid.divergence) < 1e-8);

    let solver = solver(3, N);
    solver.solve(&fluid.divergence, &mut fluid.pressure).unwrap();
    solver.project(&fluid.pressure, &mut fluid.velocity).unwrap();

    for (a, b) in before.iter().zip(fluid.velocity.front()) {
        assert!((a[0] - b[0]).abs() < 1e-4);
        assert!((a[1] - b[1]).abs() < 1e-4);
    }
}

#[test]
fn test_projection_removes_smooth_divergence() {
    let size = 32;
    let mut fluid = fields(size);

    // Potential flow v = grad(phi), phi = sin(2 pi x / size): purely divergent
    let mut velocity = Vec::new();
    for _y in 0..size {
        for x in 0..size {
            let vx = (TAU * x as f32 / size as f32).cos();
            velocity.push([vx, 0.0]);
        }
    }
    fluid.velocity.write(&velocity).unwrap();

    let kernel = divergence_kernel(size);
    compute_divergence(&kernel, &fluid.velocity, &mut fluid.divergence).unwrap();
    let before = sum_sq(&fluid.divergence);

    let solver = solver(500, size);
    solver.solve(&fluid.divergence, &mut fluid.pressure).unwrap();
    solver.project(&fluid.pressure, &mut fluid.velocity).unwrap();

    compute_divergence(&kernel, &fluid.velocity, &mut fluid.divergence).unwrap();
    let after = sum_sq(&fluid.divergence);
    assert!(after < before * 0.1, "divergence {} -> {}", before, after);
}

#[test]
fn test_uniform_flow_survives_full_step() {
    let mut fluid = fields(N);
    fluid.velocity.fill([1.5, -0.5]).unwrap();

    let mut pipeline = FluidPipeline::new(FluidConstants::default(), None).unwrap();
    pipeline.update_dimensions((N * 8, N * 8), (N, N)).unwrap();
    pipeline.step(&mut fluid).unwrap();

    for v in fluid.velocity.front() {
        assert!((v[0] - 1.5).abs() < 1e-5);
        assert!((v[1] + 0.5).abs() < 1e-5);
    }
}

#[test]
fn test_advection_translates_field() {
    let mut fluid = fields(N);
    let mut velocity = vec![[8.0f32, 0.0]; (N * N) as usize];
    // A marker whose x velocity differs; uniform 8 px/frame on a 128 px display is one texel
    velocity[(4 * N + 4) as usize] = [8.0, 2.0];
    fluid.velocity.write(&velocity).unwrap();

    let mut kernel = Kernel::new(fluid_compute::ADVECTION);
    kernel
        .set_uniform("dimensions", Uniform::Vec2(Vec2::splat((N * 8) as f32)))
        .unwrap();
    advect(&kernel, &mut fluid.velocity).unwrap();

    let view = fluid.velocity.view().unwrap();
    assert!((view.texel(5, 4)[1] - 2.0).abs() < 1e-3);
    assert!(view.texel(4, 4)[1].abs() < 1e-3);
}

#[test]
fn test_damping_scales_velocity() {
    let mut fluid = fields(4);
    fluid.velocity.fill([2.0, -4.0]).unwrap();
    let constants = FluidConstants {
        damping: Some(0.5),
        ..Default::default()
    };
    let pipeline = FluidPipeline::new(constants, None).unwrap();
    assert_eq!(pipeline.constants().damping, Some(0.5));

    let mut kernel = Kernel::new(fluid_compute::DAMPING);
    kernel.set_uniform("damping", Uniform::Float(0.5)).unwrap();
    apply_damping(&kernel, &mut fluid.velocity).unwrap();
    assert_eq!(fluid.velocity.front()[0], [1.0, -2.0]);
}

#[test]
fn test_boundary_mask_profile() {
    assert_eq!(boundary::smoothstep(105.0, 95.0, 50.0), 1.0);
    assert_eq!(boundary::smoothstep(105.0, 95.0, 200.0), 0.0);
    assert!((boundary::smoothstep(105.0, 95.0, 100.0) - 0.5).abs() < 1e-6);

    let mut fluid = FluidFields::allocate((4, 4), (400, 400), NumericType::Float32, true).unwrap();
    let mut mask = BoundaryMask::new();
    mask.set_dimensions(Vec2::splat(400.0)).unwrap();
    mask.set_radius(100.0).unwrap();

    let field = fluid.boundary.as_mut().unwrap();
    mask.update(field).unwrap();
    assert_eq!(field.view().unwrap().texel(200, 200), 1.0);
    assert_eq!(field.view().unwrap().texel(0, 0), 0.0);

    // Velocity outside the disc is suppressed
    fluid.velocity.fill([3.0, 3.0]).unwrap();
    mask.apply(fluid.boundary.as_ref().unwrap(), &mut fluid.velocity).unwrap();
    assert_eq!(fluid.velocity.view().unwrap().texel(0, 0), [0.0, 0.0]);
}

#[test]
fn test_reallocated_preserves_descriptors() {
    let fluid = FluidFields::allocate((4, 4), (32, 32), NumericType::Float16, true).unwrap();
    let resized = fluid.reallocated((8, 2), (64, 16)).unwrap();
    assert_eq!(resized.grid_size(), (8, 2));
    assert_eq!(resized.velocity.descriptor(), fluid.velocity.descriptor());
    assert_eq!(resized.pressure.descriptor().numeric_type, NumericType::Float16);
    assert_eq!(resized.boundary.as_ref().map(|b| b.width()), Some(64));
}

#[test]
fn test_dispose_releases_all_fields() {
    let mut fluid = FluidFields::allocate((4, 4), (32, 32), NumericType::Float32, true).unwrap();
    assert_eq!(fluid.dispose().unwrap(), 4);
    assert!(fluid.dispose().is_err());
}
