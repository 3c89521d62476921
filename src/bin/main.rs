//! SDF PLY CLI
//!
//! Export volumetric distance field maps as colored PLY point clouds.

use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use sdf_ply::{
    export_map, load_map, save_map, ExportConfig, ExportMode, PlyFormat, TsdfMap,
    TsdfMapConfig, VolumetricMap, DEFAULT_MAX_DISTANCE,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sdf-ply")]
#[command(author, version, about = "Export signed distance field maps as PLY point clouds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a map file as a PLY point cloud
    Export {
        /// Input JSON map file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// What to export
        #[arg(short, long, value_enum, default_value = "distance-color")]
        mode: Mode,

        /// Distance at which color saturates
        #[arg(long, default_value_t = DEFAULT_MAX_DISTANCE)]
        max_distance: f32,

        /// PLY body encoding
        #[arg(short, long, value_enum, default_value = "ascii")]
        format: OutputFormat,
    },

    /// Show information about a map file
    Info {
        /// Input JSON map file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Build a sphere distance field and export it
    Demo {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Sphere radius
        #[arg(long, default_value = "1.0")]
        radius: f32,

        /// Voxel edge length
        #[arg(long, default_value = "0.05")]
        voxel_size: f32,

        /// Also write the generated map as JSON
        #[arg(long)]
        save_map: Option<PathBuf>,

        /// PLY body encoding
        #[arg(short, long, value_enum, default_value = "ascii")]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Every allocated voxel colored by distance
    DistanceColor,
    /// Zero-level isosurface (not implemented)
    Isosurface,
}

impl From<Mode> for ExportMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::DistanceColor => ExportMode::DistanceColor,
            Mode::Isosurface => ExportMode::Isosurface,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// ASCII PLY
    Ascii,
    /// Binary little-endian PLY
    Binary,
}

impl From<OutputFormat> for PlyFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Ascii => PlyFormat::Ascii,
            OutputFormat::Binary => PlyFormat::BinaryLittleEndian,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            mode,
            max_distance,
            format,
        } => {
            let config = ExportConfig::default()
                .with_max_distance(max_distance)
                .with_format(format.into());
            export_file(&input, &output, mode.into(), &config)?;
        }
        Commands::Info { input } => {
            show_map_info(&input)?;
        }
        Commands::Demo {
            output,
            radius,
            voxel_size,
            save_map,
            format,
        } => {
            run_demo(&output, radius, voxel_size, save_map, format.into())?;
        }
    }

    Ok(())
}

fn export_file(
    input_path: &PathBuf,
    output_path: &PathBuf,
    mode: ExportMode,
    config: &ExportConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading map from {:?}...", input_path);
    let map = load_map(input_path)?;
    println!(
        "  {} blocks, {} voxels",
        map.num_allocated_blocks(),
        map.total_voxels()
    );

    let summary = export_map(map.representation(), output_path, mode, config)?;
    println!(
        "Exported {} points ({} blocks) to {:?}",
        summary.vertex_count, summary.block_count, output_path
    );
    Ok(())
}

fn show_map_info(input_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading map from {:?}...", input_path);
    let map = load_map(input_path)?;

    println!("\nMap Info:");
    println!("  Representation: {}", map.representation().name());
    println!("  Voxel size: {}", map.voxel_size());
    println!("  Voxels per side: {}", map.voxels_per_side());
    println!("  Allocated blocks: {}", map.num_allocated_blocks());
    println!("  Voxels: {}", map.total_voxels());

    if let Some(bounds) = map.bounds() {
        println!("  Bounds: {} .. {}", bounds.min, bounds.max);
        println!("  Extent: {}", bounds.extent());
    }

    if let VolumetricMap::Tsdf(tsdf) = &map {
        let observed = tsdf
            .layer()
            .blocks()
            .flat_map(|b| b.voxels().iter())
            .filter(|v| v.weight > 0.0)
            .count();
        println!("  Observed voxels: {}", observed);
    }

    Ok(())
}

fn run_demo(
    output_path: &PathBuf,
    radius: f32,
    voxel_size: f32,
    save_map_path: Option<PathBuf>,
    format: PlyFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = TsdfMapConfig {
        voxel_size,
        ..TsdfMapConfig::default()
    };
    let truncation = voxel_size * 4.0;
    println!(
        "Building sphere map (radius {}, voxel size {}, truncation {})...",
        radius, voxel_size, truncation
    );
    let map = TsdfMap::sphere(config, Vec3::ZERO, radius, truncation)?;
    let map = VolumetricMap::Tsdf(map);
    println!(
        "  {} blocks, {} voxels",
        map.num_allocated_blocks(),
        map.total_voxels()
    );

    if let Some(path) = save_map_path {
        save_map(&path, &map)?;
        println!("Saved map to {:?}", path);
    }

    let export_config = ExportConfig::default()
        .with_max_distance(truncation)
        .with_format(format);
    let summary = export_map(
        map.representation(),
        output_path,
        ExportMode::DistanceColor,
        &export_config,
    )?;
    println!(
        "Exported {} points to {:?}",
        summary.vertex_count, output_path
    );
    Ok(())
}
