//! Decomposes a Wavefront mesh into convex hulls keeping its navigable space free.

use anyhow::{bail, Context, Result};
use navacd::math::Real;
use navacd::shape::TriMesh;
use navacd::transformation::navacd::{decompose_mesh, NavAcdSettings};
use navacd::transformation::wavefront::write_decomposition_obj;
use std::env;
use std::path::PathBuf;

const USAGE: &str = "\
Usage: navacd -input <mesh.obj> -output <hulls.obj> [options]

Options:
    -r <fraction>          Agent radius, as a fraction of the mesh size (default 0.05).
    -t <fraction>          Fit tolerance, as a fraction of the mesh size (default 0.01).
    -stats                 Print statistics about the decomposition.
    -protect_unreachable   Also keep the free space unreachable from outside.
    -help                  Print this message.";

struct Args {
    input: PathBuf,
    output: PathBuf,
    settings: NavAcdSettings,
    stats: bool,
}

fn parse_fraction(flag: &str, value: Option<String>) -> Result<Real> {
    let value = value.with_context(|| format!("missing value after {}", flag))?;
    let fraction: Real = value
        .parse()
        .with_context(|| format!("invalid value for {}: {:?}", flag, value))?;

    if fraction.is_nan() || fraction < 0.0 {
        bail!("{} must be non-negative, got {}", flag, fraction);
    }

    Ok(fraction)
}

/// Parses the command line, or returns `None` if the usage was requested.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let mut input = None;
    let mut output = None;
    let mut settings = NavAcdSettings::default();
    let mut stats = false;

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-input" => input = Some(args.next().context("missing path after -input")?),
            "-output" => output = Some(args.next().context("missing path after -output")?),
            "-r" => settings.min_radius_fraction = parse_fraction("-r", args.next())?,
            "-t" => settings.tolerance_fraction = parse_fraction("-t", args.next())?,
            "-stats" => stats = true,
            "-protect_unreachable" => settings.protect_unreachable = true,
            "-help" | "--help" | "-h" => return Ok(None),
            other => bail!("unknown argument {:?}\n\n{}", other, USAGE),
        }
    }

    Ok(Some(Args {
        input: input.context("missing -input")?.into(),
        output: output.context("missing -output")?.into(),
        settings,
        stats,
    }))
}

fn main() -> Result<()> {
    env_logger::init();

    let Some(args) = parse_args(env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    let mesh = TriMesh::from_obj_file(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    log::info!(
        "Loaded {}: {} vertices, {} triangles.",
        args.input.display(),
        mesh.vertices().len(),
        mesh.num_triangles()
    );

    let result = decompose_mesh(mesh, &args.settings)
        .with_context(|| format!("failed to decompose {}", args.input.display()))?;

    write_decomposition_obj(&result.hulls, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    if args.stats {
        let stats = &result.stats;
        println!("negative-space samples: {}", stats.num_samples);
        println!("splits:                 {}", stats.num_splits);
        println!("cuts:                   {}", stats.num_cuts);
        println!("merges:                 {}", stats.num_merges);
        println!("hulls:                  {}", stats.num_hulls);
        println!("preprocessing:          {:?}", stats.preprocess_time);
        println!("sampling:               {:?}", stats.sampling_time);
        println!("splitting:              {:?}", stats.splitting_time);
        println!("overlap fixing:         {:?}", stats.overlap_fixing_time);
        println!("merging:                {:?}", stats.merging_time);
        println!("total:                  {:?}", stats.total_time());
    }

    Ok(())
}
