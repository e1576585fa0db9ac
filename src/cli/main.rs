use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use photo_geotag::exif::{format_tag_key, read_exif_tags, ExifGroup, GpsTags};
use photo_geotag::geo::{calculate_bounds, extract_geotag, GeotagBatch};
use photo_geotag::{config, export, pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "photo-geotag",
    version,
    about = "Export the GPS locations and camera directions of geotagged photos to KML and zipped shapefiles"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// JSON file of pre-parsed GPS tags to process alongside (or instead of) images
    #[arg(long, value_name = "FILE")]
    tags: Option<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Length of the camera direction lines, in meters
    #[arg(long = "line-length", value_name = "METERS")]
    line_length: Option<f64>,

    /// Directory to write the exports to
    #[arg(long = "output-dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Do not write the KML document
    #[arg(long = "no-kml")]
    no_kml: bool,

    /// Do not write the shapefile archive
    #[arg(long = "no-shapefile")]
    no_shapefile: bool,

    /// Display the GPS tags of each photo and exit
    #[arg(long = "show-gps")]
    show_gps: bool,

    /// Display all EXIF metadata of each photo, grouped by section, and exit
    #[arg(long = "show-exif")]
    show_exif: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = config::Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => config::Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() && cli.tags.is_none() {
        anyhow::bail!("No input files, directories or --tags file specified. Use --help for usage.");
    }

    // Handle --show-exif
    if cli.show_exif {
        return show_exif(&cli);
    }

    let photos = gather_photos(&cli)?;
    if photos.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    // Handle --show-gps
    if cli.show_gps {
        for (name, tags) in &photos {
            print_gps(name, tags.as_ref());
        }
        return Ok(());
    }

    // Load config and apply CLI overrides
    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(length) = cli.line_length {
        config.export.line_length = length;
    }
    if let Some(ref dir) = cli.output_dir {
        config.output.output_dir = dir.clone();
    }
    if cli.no_kml {
        config.export.write_kml = false;
    }
    if cli.no_shapefile {
        config.export.write_shapefile = false;
    }
    if cli.json {
        config.output.json = true;
    }
    config.validate()?;

    let total = photos.len();
    log::info!("Found {total} photo(s) to process");
    let batch = pipeline::build_batch(photos);

    match calculate_bounds(batch.records()) {
        Some(b) => log::info!(
            "Map bounds: lat {:.6} .. {:.6}, lon {:.6} .. {:.6}",
            b.min_lat,
            b.max_lat,
            b.min_lon,
            b.max_lon
        ),
        None => log::warn!("No located photos; no map bounds"),
    }

    let outputs = if batch.located_count() > 0 {
        write_exports(&config, &batch)?
    } else {
        log::warn!("Nothing to export");
        Vec::new()
    };

    // JSON output
    if config.output.json {
        println!("{}", serde_json::to_string_pretty(&pipeline::batch_summary(&batch, &outputs))?);
    }

    // Summary
    let located = batch.located_count();
    log::info!(
        "Done: {located} located, {} without location out of {total} photos",
        total - located
    );

    Ok(())
}

/// Collect `(name, tags)` pairs from the `--tags` dump and the image paths.
fn gather_photos(cli: &Cli) -> Result<Vec<(String, Option<GpsTags>)>> {
    let mut photos = Vec::new();

    if let Some(ref tags_path) = cli.tags {
        let dump = pipeline::load_tag_dump(tags_path)?;
        log::info!("Loaded {} tagged photo(s) from {}", dump.len(), tags_path.display());
        photos.extend(dump.into_iter().map(|p| (p.name, p.gps)));
    }

    if !cli.paths.is_empty() {
        let images = pipeline::collect_images(&cli.paths);
        let total = images.len();
        for (i, path) in images.iter().enumerate() {
            log::debug!("[{}/{}] Reading: {}", i + 1, total, path.display());
            photos.push((pipeline::photo_name(path), pipeline::read_tags_lossy(path)));
        }
    }

    Ok(photos)
}

fn write_exports(config: &config::Config, batch: &GeotagBatch) -> Result<Vec<PathBuf>> {
    let dir = &config.output.output_dir;
    let length = config.export.line_length;
    let mut written = Vec::new();

    if config.export.write_kml || config.export.write_shapefile {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    if config.export.write_kml {
        let path = config.kml_path();
        let kml = export::create_kml(batch.records(), length).context("KML export failed")?;
        write_file(&path, &kml)?;
        written.push(path);
    }

    if config.export.write_shapefile {
        let path = config.shapefile_path();
        let zip = export::create_shapefile_archive(batch.records(), length)
            .context("Shapefile export failed")?;
        write_file(&path, &zip)?;
        written.push(path);
    }

    Ok(written)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

// ANSI color codes
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Max width for the value column before wrapping.
const VAL_WIDTH: usize = 46;
/// Indent for continuation lines (tag column width + " : " = 25 chars + 2 leading spaces).
const INDENT: &str = "                           ";

/// Print the grouped EXIF view of every input photo.
fn show_exif(cli: &Cli) -> Result<()> {
    let mut shown = 0usize;

    if let Some(ref tags_path) = cli.tags {
        for photo in pipeline::load_tag_dump(tags_path)? {
            let groups = pipeline::exif_groups(&photo.name, Vec::new(), photo.gps.as_ref());
            print_exif(&photo.name, &groups);
            shown += 1;
        }
    }

    for path in pipeline::collect_images(&cli.paths) {
        let name = pipeline::photo_name(&path);
        let exif = read_exif_tags(&path).unwrap_or_else(|e| {
            log::warn!("Failed to read EXIF from {}: {e:#}", path.display());
            Vec::new()
        });
        let gps = pipeline::read_tags_lossy(&path);
        print_exif(&name, &pipeline::exif_groups(&name, exif, gps.as_ref()));
        shown += 1;
    }

    if shown == 0 {
        anyhow::bail!("No supported image files found in the specified paths.");
    }
    Ok(())
}

/// Print EXIF groups of one photo, one section per group.
fn print_exif(name: &str, groups: &[ExifGroup]) {
    println!();
    println!("{BOLD}File:{RESET} {name}");
    println!("{DIM}{}{RESET}", "═".repeat(72));

    if groups.is_empty() {
        println!("  {DIM}(no EXIF metadata found){RESET}");
        println!();
        return;
    }

    for group in groups {
        println!("  {BOLD}{}{RESET}", group.section.title());
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        for (key, value) in &group.items {
            print_row(&format_tag_key(key), &value.to_string());
        }
        println!();
    }
}

/// Print the raw GPS tags of a photo and the coordinates derived from them.
fn print_gps(name: &str, tags: Option<&GpsTags>) {
    println!();
    println!("{BOLD}File:{RESET} {name}");
    println!("{DIM}{}{RESET}", "═".repeat(72));

    let Some(tags) = tags.filter(|t| !t.is_empty()) else {
        println!("  {DIM}(no GPS metadata found){RESET}");
        println!();
        return;
    };

    println!("  {BOLD}GPS Tags{RESET}");
    println!("  {DIM}{}{RESET}", "─".repeat(70));
    for (key, value) in tags.named_entries() {
        print_row(&format_tag_key(&key), &value.to_string());
    }
    println!();

    println!("  {BOLD}Decimal{RESET}");
    println!("  {DIM}{}{RESET}", "─".repeat(70));
    match extract_geotag(name, Some(tags)) {
        Ok(record) => {
            if let Some(p) = record.position() {
                print_row("Latitude", &format!("{:.6}", p.latitude));
                print_row("Longitude", &format!("{:.6}", p.longitude));
                if let Some(alt) = p.altitude {
                    print_row("Altitude", &format!("{alt:.1} m"));
                }
                if let Some(bearing) = p.bearing {
                    print_row("Direction", &format!("{bearing:.2}°"));
                }
            }
        }
        Err(e) => print_row("Error", &e.to_string()),
    }
    println!();
}

/// Print a single row in the EXIF display table.
fn print_row(tag: &str, val: &str) {
    let tag_col = format!("{:<22}", tag);
    let lines = wrap_text(val, VAL_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {INDENT}{line}");
        }
    }
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}
