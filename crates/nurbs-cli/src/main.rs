//! brep2nurbs entry point

mod args;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use nurbs_core::{
    ConversionSinks, ConversionStatistics, ConvertOptions, ConvertedShape, FailedGeometry, Model,
    NurbsEncoder, convert_model,
};
use nurbs_kernel::default_kernel;

use args::{Command, ConvertArgs, USAGE};

fn main() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nurbs_cli=info,nurbs_core=info,nurbs_kernel=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args::parse(std::env::args().skip(1))? {
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Command::Convert(args) => run(&args),
    }
}

fn run(args: &ConvertArgs) -> Result<()> {
    let model = Model::load(&args.file_path)
        .with_context(|| format!("loading {}", args.file_path.display()))?;
    fs::create_dir_all(&args.save_dir)
        .with_context(|| format!("creating {}", args.save_dir.display()))?;
    let stem = args
        .file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| model.name.clone());

    let kernel = default_kernel();
    tracing::info!(kernel = kernel.name(), "Loaded model \"{}\"", model.name);

    let mut encoder = if args.write_nurbs {
        let path = args.save_dir.join(format!("{stem}.nurbs"));
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        Some(NurbsEncoder::new(BufWriter::new(file), args.version)?)
    } else {
        None
    };
    let mut statistics = ConversionStatistics::new();
    let mut converted: Vec<ConvertedShape> = Vec::new();

    let mut sinks = ConversionSinks {
        encoder: encoder.as_mut(),
        statistics: Some(&mut statistics),
        converted: (args.conv || args.conv_no_trim).then_some(&mut converted),
    };
    let summary = convert_model(&model, kernel.as_ref(), &ConvertOptions::default(), &mut sinks)?;

    if let Some(mut encoder) = encoder {
        encoder.flush()?;
    }
    if args.conv {
        write_ron(&args.save_dir.join(format!("{stem}_conv.ron")), &converted)?;
    }
    if args.conv_no_trim {
        let untrimmed: Vec<ConvertedShape> =
            converted.iter().map(ConvertedShape::without_trimming).collect();
        write_ron(
            &args.save_dir.join(format!("{stem}_conv_notrim.ron")),
            &untrimmed,
        )?;
    }
    if args.log_fails {
        write_fail_logs(&args.save_dir.join("Fails"), &statistics)?;
    }

    tracing::info!(
        solids = summary.solids,
        converted = summary.faces_converted,
        failed = summary.faces_failed,
        "Done"
    );
    Ok(())
}

fn write_ron<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// `fails.txt`, `stats.txt` and one RON dump per failed face or solid
fn write_fail_logs(dir: &Path, statistics: &ConversionStatistics) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut fails = BufWriter::new(File::create(dir.join("fails.txt"))?);
    statistics.write_fails_report(&mut fails)?;
    fails.flush()?;

    let mut stats = BufWriter::new(File::create(dir.join("stats.txt"))?);
    statistics.write_stats_report(&mut stats)?;
    stats.flush()?;

    for (identifier, geometry) in statistics.failed_geometry() {
        let path = dir.join(format!("{identifier}.ron"));
        match geometry {
            FailedGeometry::Face(face) => write_ron(&path, face)?,
            FailedGeometry::Solid(solid) => write_ron(&path, solid)?,
        }
    }
    Ok(())
}
