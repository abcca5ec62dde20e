//! Viscous Solver Example - a block sagging under its own weight
//!
//! Usage: `viscous-example [options.json] [--dump matrix.txt]`

use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use viscous_solver::prelude::*;

fn main() -> Result<()> {
    env_logger::init();

    let mut options_path = None;
    let mut dump_path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--dump" {
            dump_path = Some(args.next().context("--dump needs a file path")?);
        } else {
            options_path = Some(arg);
        }
    }

    let options = match options_path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read options from {path}"))?;
            SolverOptions::from_json(&json)?
        }
        None => SolverOptions::default()
            .with_tolerance(1e-10)
            .with_max_iter(500)
            .with_stokes_drag(true),
    };

    println!("=== Viscous Solver Example: Sagging Block ===\n");

    //   +---+---+---+---+
    //   |   |   |   |   |   4 x 1 x 1 cubes, 0.25 m
    //   +---+---+---+---+
    //   ^ pinned face (x = 0)
    let spacing = 0.25;
    let mut mesh = TetMesh::block(4, 1, 1, spacing, ViscousMaterial::new(1.0, 1.0))?;
    mesh.set_stokes_drag(0.05, 1.0);

    let clamped = mesh.nodes_on_plane(0, 0.0);
    let pinned = PinnedNodes::from_sources(mesh.num_nodes(), &clamped, std::iter::empty())?;

    println!(
        "Mesh: {} nodes, {} elements, {} pinned",
        mesh.num_nodes(),
        mesh.num_elements(),
        pinned.count()
    );

    let mut solver = ViscositySolver::new(&mesh.nodes, &mesh.elements, &pinned, options)?;
    println!(
        "Viscosity matrix: {} rows, {} nonzeros\n",
        solver.num_rows(),
        solver.matrix().nnz()
    );

    let dt = 1e-2;
    let weight = Vec3::new(0.0, 0.0, -0.1);
    let mut velocity = vec![Vec3::zeros(); mesh.num_nodes()];

    for step in 0..5 {
        mesh.update_viscosity_matrices()?;

        // Pinned nodes take no force, so their velocity stays zero
        for (node, v) in velocity.iter_mut().enumerate() {
            *v = if pinned.is_pinned(node) { Vec3::zeros() } else { weight };
        }

        let report = solver.solve(&mesh.nodes, &mesh.elements, &mut velocity)?;
        let balance = solver.energy_balance(&velocity)?;

        for (node, v) in mesh.nodes.iter_mut().zip(&velocity) {
            node.position += v * dt;
        }

        let tip = velocity
            .iter()
            .map(|v| v.z)
            .fold(Scalar::INFINITY, Scalar::min);
        println!(
            "step {step}: {:>3} iterations, residual {:.2e}, tip velocity {:.4e} m/s, power mismatch {:.2e}",
            report.iterations,
            report.relative_residual,
            tip,
            balance.relative_mismatch()
        );
    }

    if let Some(path) = dump_path {
        let file = File::create(&path).with_context(|| format!("Failed to create {path}"))?;
        solver.print_matrices(&velocity, BufWriter::new(file))?;
        println!("\nDense viscosity matrix written to {path}");
    }

    Ok(())
}
