// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Command-line front end for the sculpt kernel

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use sculpt_kernel::csg::{classify_object, BooleanOp, CsgContext, CsgObject, PolygonStatus};
use sculpt_kernel::mesh::{decompose, group_coplanar_faces, validate_meshes};
use sculpt_kernel::spatial::command_log;
use sculpt_kernel::{KernelConfig, MMesh};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sculpt")]
#[command(about = "Mesh topology, decomposition and spatial-index tools", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./sculpt.toml plus SCULPT_* environment overrides)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print every issue instead of a summary
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that meshes are closed manifolds
    Validate {
        /// Mesh JSON files
        #[arg(required = true)]
        meshes: Vec<PathBuf>,
    },

    /// Split every face of a mesh into convex pieces
    Decompose {
        /// Mesh JSON file
        mesh: PathBuf,

        /// Also list coplanar face groups that could be merged
        #[arg(long)]
        coplanar: bool,
    },

    /// Classify the faces of two meshes for a boolean operation
    Classify {
        /// First operand (A)
        a: PathBuf,

        /// Second operand (B)
        b: PathBuf,

        /// Operation (union, subtract, intersect)
        #[arg(long, default_value = "union")]
        op: String,
    },

    /// Re-run a recorded spatial command log
    Replay {
        /// JSON-lines command log
        log: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "sculpt_kernel=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => KernelConfig::from_file(path)?,
        None => KernelConfig::load()?,
    };

    match &cli.command {
        Commands::Validate { meshes } => run_validate(meshes, cli.verbose),
        Commands::Decompose { mesh, coplanar } => run_decompose(mesh, *coplanar, &config, cli.verbose),
        Commands::Classify { a, b, op } => run_classify(a, b, op, &config),
        Commands::Replay { log } => run_replay(log, &config, cli.verbose),
    }
}

fn run_validate(paths: &[PathBuf], verbose: bool) -> Result<()> {
    let meshes = paths
        .iter()
        .map(|path| MMesh::from_json_file(path))
        .collect::<Result<Vec<_>>>()?;
    let reports = validate_meshes(&meshes);

    let mut failures = 0;
    for (path, report) in paths.iter().zip(&reports) {
        if report.valid {
            println!("{} {}", "✓".green(), path.display());
            continue;
        }
        failures += 1;
        println!(
            "{} {} ({} issue(s))",
            "✗".red(),
            path.display(),
            report.issues.len()
        );
        let shown = if verbose { report.issues.len() } else { 5 };
        for issue in report.issues.iter().take(shown) {
            println!("    {issue}");
        }
        if report.issues.len() > shown {
            println!("    {}", format!("... {} more", report.issues.len() - shown).dimmed());
        }
    }

    println!();
    println!(
        "{}: {} valid, {} invalid",
        "Summary".bold(),
        (reports.len() - failures).to_string().green(),
        failures.to_string().red()
    );
    if failures > 0 {
        bail!("{failures} mesh(es) failed topology validation");
    }
    Ok(())
}

fn run_decompose(path: &Path, coplanar: bool, config: &KernelConfig, verbose: bool) -> Result<()> {
    let mesh = MMesh::from_json_file(path)?;
    let positions = mesh.positions();

    let mut pieces_total = 0;
    let mut split_faces = 0;
    for face in &mesh.faces {
        let pieces = decompose(&face.vertex_ids, &[], &positions, &config.tolerance)
            .with_context(|| format!("Failed to decompose face {}", face.id))?;
        if pieces.len() > 1 {
            split_faces += 1;
            if verbose {
                println!("  face {}: {} pieces", face.id, pieces.len());
            }
        }
        pieces_total += pieces.len();
    }

    println!("{} {}", "Mesh".bold(), path.display());
    println!("  Faces:         {}", mesh.face_count());
    println!("  Convex pieces: {}", pieces_total);
    println!("  Split faces:   {}", split_faces.to_string().yellow());

    if coplanar {
        let groups = group_coplanar_faces(&mesh, &config.tolerance)?;
        println!("  Coplanar groups: {}", groups.len());
        for group in &groups {
            println!("    {:?}", group);
        }
    }
    Ok(())
}

fn run_classify(a: &Path, b: &Path, op: &str, config: &KernelConfig) -> Result<()> {
    let Some(op) = BooleanOp::from_str(op) else {
        bail!("Unknown boolean operation: {op}");
    };

    let mut context = CsgContext::new(config.tolerance, &config.spatial);
    let solid_a = CsgObject::from_mesh(&MMesh::from_json_file(a)?, &mut context)?;
    let solid_b = CsgObject::from_mesh(&MMesh::from_json_file(b)?, &mut context)?;

    let classes_a = classify_object(&solid_a, &solid_b, &config.tolerance);
    let classes_b = classify_object(&solid_b, &solid_a, &config.tolerance);

    println!("{} {}", "Operation".bold(), op.as_str());
    for (label, solid, classes) in [("A", &solid_a, &classes_a), ("B", &solid_b, &classes_b)] {
        println!("  {label}: {} polygons", solid.polygons().len());
        for status in [
            PolygonStatus::Inside,
            PolygonStatus::Outside,
            PolygonStatus::Same,
            PolygonStatus::Opposite,
        ] {
            println!("    {:<9} {}", status.as_str(), classes.count(status));
        }
    }

    let kept = op.select(&solid_a, &classes_a, &solid_b, &classes_b);
    println!("  Retained polygons: {}", kept.len().to_string().green());
    println!("  Welded vertices:   {}", context.len());
    Ok(())
}

fn run_replay(path: &Path, config: &KernelConfig, verbose: bool) -> Result<()> {
    let summary = command_log::replay_file(path, &config.spatial)?;

    println!("{} {}", "Replayed".bold(), path.display());
    println!("  Commands: {}", summary.commands);
    println!("  Queries:  {}", summary.queries);
    println!("  Rejected: {}", summary.rejected);

    if summary.is_consistent() {
        println!("  {}", "All query results match the recording".green());
        return Ok(());
    }

    println!(
        "  {}",
        format!("{} query result(s) differ", summary.mismatches.len()).red()
    );
    if verbose {
        for mismatch in &summary.mismatches {
            println!(
                "    line {}: recorded {}, replayed {}",
                mismatch.line, mismatch.expected, mismatch.actual
            );
        }
    }
    bail!("replay diverged from the recorded session")
}
