//! Benchmarks for viscosity assembly and solve

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use viscous_solver::prelude::*;

fn create_block(n: usize) -> (TetMesh, PinnedNodes) {
    let mut mesh = TetMesh::block(n, n, n, 1.0 / n as f64, ViscousMaterial::new(1.0, 1.0))
        .expect("block mesh");
    mesh.set_stokes_drag(0.01, 1.0);
    mesh.update_viscosity_matrices().expect("element update");

    let base = mesh.nodes_on_plane(2, 0.0);
    let pinned = PinnedNodes::from_sources(mesh.num_nodes(), &base, std::iter::empty())
        .expect("pinned nodes");
    (mesh, pinned)
}

fn bench_pattern(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparsity_pattern");
    for n in [2, 4, 8] {
        let (mesh, pinned) = create_block(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                SparsityPatternBuilder::from_mesh(
                    mesh.num_nodes(),
                    black_box(&mesh.elements),
                    &pinned,
                    true,
                )
                .and_then(SparsityPatternBuilder::finalize)
                .expect("pattern")
            })
        });
    }
    group.finish();
}

fn bench_refresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("refresh");
    for n in [4, 8] {
        let (mesh, pinned) = create_block(n);
        let mut matrix = SparsityPatternBuilder::from_mesh(mesh.num_nodes(), &mesh.elements, &pinned, true)
            .and_then(SparsityPatternBuilder::finalize)
            .expect("pattern");
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| matrix.refresh(black_box(&mesh.nodes), &mesh.elements).expect("refresh"))
        });
    }
    group.finish();
}

fn bench_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve");
    for n in [4, 8] {
        let (mesh, pinned) = create_block(n);
        let options = SolverOptions::default()
            .with_tolerance(1e-10)
            .with_max_iter(5000)
            .with_stokes_drag(true);
        let mut solver = ViscositySolver::new(&mesh.nodes, &mesh.elements, &pinned, options)
            .expect("solver");
        let force: Vec<Vec3> = (0..mesh.num_nodes())
            .map(|i| {
                if pinned.is_pinned(i) {
                    Vec3::zeros()
                } else {
                    Vec3::new(0.0, 0.0, -1.0)
                }
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut x = force.clone();
                solver
                    .solve(&mesh.nodes, &mesh.elements, black_box(&mut x))
                    .expect("solve")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pattern, bench_refresh, bench_solve);
criterion_main!(benches);
