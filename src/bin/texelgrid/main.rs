//! texelgrid CLI - pixel-perfect UV unwrapping from the command line.
//!
//! Usage: texelgrid <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `texelgrid --help` for available commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use texelgrid::algo::pixelate::{self, FaceView, Plane, PixelateReport};
use texelgrid::algo::Progress;
use texelgrid::config::Config;
use texelgrid::io;
use texelgrid::mesh::{validate_unique_positions, FaceId, PolyMesh};

#[derive(Parser)]
#[command(name = "texelgrid")]
#[command(author, version, about = "Pixel-perfect UV unwrapping", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Plane classification angle in degrees
        #[arg(long)]
        angle: Option<f64>,
    },

    /// Unwrap a mesh onto the texel grid
    Pixelate {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Texels per world unit
        #[arg(short, long)]
        density: Option<u32>,

        /// Texture size in texels
        #[arg(short, long)]
        texture_size: Option<u32>,

        /// Only unwrap selected faces
        #[arg(long)]
        selection_only: bool,

        /// Faces to select, as zero-based indices (implies --selection-only)
        #[arg(long, value_delimiter = ',')]
        select: Vec<usize>,

        /// Solve all planes as one group
        #[arg(long)]
        merge_planes: bool,

        /// Plane classification angle in degrees
        #[arg(long)]
        angle: Option<f64>,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    init_logging(&config.log.level);

    match cli.command {
        Commands::Info { input, angle } => {
            cmd_info(&input, angle.unwrap_or(config.solve.vertical_angle))?;
        }

        Commands::Pixelate {
            input,
            output,
            density,
            texture_size,
            selection_only,
            select,
            merge_planes,
            angle,
            sequential,
        } => {
            let mut config = config;
            if let Some(density) = density {
                config.solve.grid_density = density;
            }
            if let Some(texture_size) = texture_size {
                config.solve.texture_size = texture_size;
            }
            if let Some(angle) = angle {
                config.solve.vertical_angle = angle;
            }
            if selection_only || !select.is_empty() {
                config.solve.selection_only = true;
            }
            if merge_planes {
                config.solve.separate_by_plane = false;
            }
            check_selection(&config, &select)?;
            cmd_pixelate(&input, &output, &config, &select, sequential)?;
        }

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

/// OBJ files carry no selection, so a selection-only run needs `--select`.
fn check_selection(config: &Config, select: &[usize]) -> Result<(), String> {
    if config.solve.selection_only && select.is_empty() {
        return Err("selection-only mode needs faces given with --select".to_string());
    }
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0)); // Track highest percent seen (monotonic)

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Only ever move forward
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }
        let percent = raw_percent.max(previous);

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(input: &Path, angle: f64) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: PolyMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Corners: {}", mesh.num_corners());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    let threshold = angle.to_radians();
    let mut per_plane = [0usize; 3];
    let mut aligned = 0;
    let mut edges = 0;
    for f in mesh.face_ids() {
        let view = FaceView::new(&mesh, f, threshold);
        let slot = Plane::ORDER.iter().position(|&p| p == view.plane()).unwrap_or(0);
        per_plane[slot] += 1;
        aligned += view.aligned_edge_count();
        edges += view.len();
    }
    println!(
        "Planes ({}°): {} lateral, {} top, {} down",
        angle, per_plane[0], per_plane[1], per_plane[2]
    );
    println!("Aligned edges: {} of {}", aligned, edges);

    match validate_unique_positions(&mesh) {
        Ok(()) => println!("Vertices: all positions unique"),
        Err(e) => println!("Vertices: {}", e),
    }

    Ok(())
}

fn cmd_pixelate(
    input: &Path,
    output: &Path,
    config: &Config,
    select: &[usize],
    sequential: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: PolyMesh = io::load(input)?;

    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    if !select.is_empty() {
        if let Some(&bad) = select.iter().find(|&&i| i >= mesh.num_faces()) {
            return Err(format!("face {} does not exist", bad).into());
        }
        mesh.select_only(select.iter().map(|&i| FaceId::new(i)));
    }

    let options = config.to_options()?.with_parallel(!sequential);
    let mode = if sequential { "sequential" } else { "parallel" };
    println!(
        "Pixelating (density {}, {}x{} texture, {})...",
        options.grid_density, options.texture_size, options.texture_size, mode
    );

    let progress = create_progress();
    let start = Instant::now();
    let report = pixelate::pixelate_with_progress(&mut mesh, &options, &progress)?;
    let elapsed = start.elapsed();

    print_report(&report);
    io::save(&mesh, output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn print_report(report: &PixelateReport) {
    println!(
        "Faces: {} lateral, {} top, {} down ({} solved)",
        report.lateral_faces, report.top_faces, report.down_faces, report.faces_solved
    );
    println!(
        "Islands: {} ({} edge stitches, {} vertex stitches)",
        report.islands, report.edge_stitches, report.vertex_stitches
    );
    if report.imperfect_edges > 0 {
        println!("Imperfect edges: {}", report.imperfect_edges);
    }
    if report.misaligned_faces > 0 {
        println!("Faces not aligned in UV: {}", report.misaligned_faces);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_only_needs_faces() {
        let mut config = Config::default();
        assert!(check_selection(&config, &[]).is_ok());

        config.solve.selection_only = true;
        assert!(check_selection(&config, &[]).is_err());
        assert!(check_selection(&config, &[0, 2]).is_ok());
    }

    #[test]
    fn test_parse_select_list() {
        let cli = Cli::try_parse_from([
            "texelgrid",
            "pixelate",
            "in.obj",
            "out.obj",
            "--selection-only",
            "--select",
            "1,3",
        ])
        .unwrap();
        match cli.command {
            Commands::Pixelate {
                selection_only,
                select,
                ..
            } => {
                assert!(selection_only);
                assert_eq!(select, vec![1, 3]);
            }
            _ => panic!("expected pixelate"),
        }
    }
}
