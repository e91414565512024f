//! Veles CLI - Command-line tool for Warcraft III game file conversion.
//!
//! This is the main entry point for the Veles command-line application.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use veles::prelude::*;

/// Veles - Warcraft III game file conversion tool
#[derive(Parser)]
#[command(name = "veles")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of an MPQ archive
    MpqList {
        /// Path to the MPQ/W3X/W3M file
        #[arg(short, long, env = "INPUT_MPQ")]
        mpq: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Extract files from an MPQ archive
    MpqExtract {
        /// Path to the MPQ/W3X/W3M file
        #[arg(short, long, env = "INPUT_MPQ")]
        mpq: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern (glob-style)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show a summary of an MDX model
    MdxInfo {
        /// Input MDX file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Convert a binary MDX model to MDL text notation
    MdxToMdl {
        /// Input MDX file
        #[arg(short, long)]
        input: PathBuf,

        /// Output MDL file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert an MDL text model to binary MDX
    MdlToMdx {
        /// Input MDL file
        #[arg(short, long)]
        input: PathBuf,

        /// Output MDX file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode a BLP texture to PNG
    BlpDecode {
        /// Input BLP file
        #[arg(short, long)]
        input: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Mipmap level to decode
        #[arg(short, long, default_value_t = 0)]
        level: usize,
    },

    /// Show war3map.w3i map info from a map archive or a bare w3i file
    W3iInfo {
        /// Input W3X/W3M map or war3map.w3i file
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::MpqList { mpq, filter, detailed } => {
            cmd_mpq_list(&mpq, filter.as_deref(), detailed)?;
        }
        Commands::MpqExtract { mpq, output, filter } => {
            cmd_mpq_extract(&mpq, &output, filter.as_deref())?;
        }
        Commands::MdxInfo { input } => {
            cmd_mdx_info(&input)?;
        }
        Commands::MdxToMdl { input, output } => {
            cmd_mdx_to_mdl(&input, &output)?;
        }
        Commands::MdlToMdx { input, output } => {
            cmd_mdl_to_mdx(&input, &output)?;
        }
        Commands::BlpDecode { input, output, level } => {
            cmd_blp_decode(&input, &output, level)?;
        }
        Commands::W3iInfo { input } => {
            cmd_w3i_info(&input)?;
        }
    }

    Ok(())
}

fn cmd_mpq_list(mpq_path: &PathBuf, filter: Option<&str>, detailed: bool) -> Result<()> {
    let archive = MpqArchive::open(mpq_path).context("Failed to open MPQ archive")?;
    let names = archive
        .list_files()
        .context("Archive has no (listfile); cannot enumerate names")?;

    let mut count = 0;
    for name in &names {
        if let Some(pattern) = filter {
            if !glob_match(pattern, name) {
                continue;
            }
        }

        if detailed {
            match archive.find(name) {
                Some(entry) => println!(
                    "{:>12} {:>12} {}{} {}",
                    entry.compressed_size,
                    entry.file_size,
                    if entry.is_encrypted { "E" } else { " " },
                    if entry.is_compressed { "C" } else { " " },
                    name
                ),
                None => println!("{:>12} {:>12}    {} (missing)", "-", "-", name),
            }
        } else {
            println!("{name}");
        }
        count += 1;
    }

    println!("\nTotal: {count} entries");

    Ok(())
}

fn cmd_mpq_extract(mpq_path: &PathBuf, output: &PathBuf, filter: Option<&str>) -> Result<()> {
    println!("Opening MPQ archive: {}", mpq_path.display());

    let start = Instant::now();
    let archive = MpqArchive::open(mpq_path).context("Failed to open MPQ archive")?;

    let names: Vec<String> = archive
        .list_files()
        .context("Archive has no (listfile); cannot enumerate names")?
        .into_iter()
        .filter(|name| filter.map_or(true, |pattern| glob_match(pattern, name)))
        .collect();

    println!(
        "Loaded {} blocks in {:?}, extracting {} named entries...",
        archive.file_count(),
        start.elapsed(),
        names.len()
    );

    let pb = ProgressBar::new(names.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let errors: Vec<String> = names
        .par_iter()
        .filter_map(|name| {
            let result = extract_one(&archive, name, output);
            pb.inc(1);
            result.err().map(|e| format!("{name}: {e:#}"))
        })
        .collect();

    pb.finish_with_message("Done");
    for error in &errors {
        eprintln!("Error extracting {error}");
    }
    println!(
        "Extracted {} entries in {:?} ({} errors)",
        names.len() - errors.len(),
        start.elapsed(),
        errors.len()
    );

    Ok(())
}

fn extract_one(archive: &MpqArchive, name: &str, output: &PathBuf) -> Result<()> {
    let data = archive.read_file(name)?;
    let output_path = output.join(name.replace('\\', "/"));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output_path, data)?;
    Ok(())
}

fn cmd_mdx_info(input: &PathBuf) -> Result<()> {
    let data = fs::read(input).context("Failed to read input file")?;
    let model = Model::from_mdx(&data).context("Failed to parse MDX")?;

    println!("Model: {}", model.name);
    println!("  format version: {}", model.version);
    println!("  blend time:     {}", model.blend_time);
    println!("  sequences:      {}", model.sequences.len());
    for sequence in &model.sequences {
        println!(
            "    {:<24} {} - {}",
            sequence.name, sequence.interval[0], sequence.interval[1]
        );
    }
    println!("  textures:       {}", model.textures.len());
    for texture in &model.textures {
        if texture.path.is_empty() {
            println!("    replaceable id {}", texture.replaceable_id);
        } else {
            println!("    {}", texture.path);
        }
    }
    println!("  materials:      {}", model.materials.len());
    println!("  geosets:        {}", model.geosets.len());
    for geoset in &model.geosets {
        println!(
            "    {} vertices, {} faces",
            geoset.vertices.len() / 3,
            geoset.faces.len() / 3
        );
    }
    println!("  bones:          {}", model.bones.len());
    println!("  helpers:        {}", model.helpers.len());
    println!("  attachments:    {}", model.attachments.len());
    println!("  cameras:        {}", model.cameras.len());
    println!("  event objects:  {}", model.event_objects.len());
    println!("  collision:      {}", model.collision_shapes.len());
    if !model.unknown_chunks.is_empty() {
        let tags: Vec<String> = model
            .unknown_chunks
            .iter()
            .map(|c| String::from_utf8_lossy(&c.tag).into_owned())
            .collect();
        println!("  unknown chunks: {}", tags.join(", "));
    }

    Ok(())
}

fn cmd_mdx_to_mdl(input: &PathBuf, output: &PathBuf) -> Result<()> {
    println!("Converting: {} -> {}", input.display(), output.display());

    let data = fs::read(input).context("Failed to read input file")?;
    let model = Model::from_mdx(&data).context("Failed to parse MDX")?;
    fs::write(output, model.to_mdl()).context("Failed to write output file")?;

    println!("Conversion complete");

    Ok(())
}

fn cmd_mdl_to_mdx(input: &PathBuf, output: &PathBuf) -> Result<()> {
    println!("Converting: {} -> {}", input.display(), output.display());

    let text = fs::read_to_string(input).context("Failed to read input file")?;
    let model = Model::from_mdl(&text).context("Failed to parse MDL")?;
    let data = model.to_mdx().context("Failed to serialize MDX")?;
    fs::write(output, data).context("Failed to write output file")?;

    println!("Conversion complete");

    Ok(())
}

fn cmd_blp_decode(input: &PathBuf, output: &PathBuf, level: usize) -> Result<()> {
    println!("Decoding: {} -> {}", input.display(), output.display());

    let data = fs::read(input).context("Failed to read input file")?;
    let texture = BlpTexture::parse(&data).context("Failed to parse BLP")?;
    let image = texture
        .decode_mipmap(level)
        .with_context(|| format!("Failed to decode mipmap level {level}"))?;

    image::save_buffer(
        output,
        &image.pixels,
        image.width,
        image.height,
        image::ColorType::Rgba8,
    )
    .context("Failed to write PNG")?;

    println!("Decoded {}x{} image", image.width, image.height);

    Ok(())
}

fn cmd_w3i_info(input: &PathBuf) -> Result<()> {
    let is_map = matches!(
        input.extension().and_then(|e| e.to_str()),
        Some("w3x") | Some("w3m") | Some("mpq")
    );

    let data = if is_map {
        let archive = MpqArchive::open(input).context("Failed to open map archive")?;
        archive
            .read_file("war3map.w3i")
            .context("Map has no war3map.w3i")?
    } else {
        fs::read(input).context("Failed to read input file")?
    };

    let info = MapInfo::read(&data).context("Failed to parse map info")?;

    println!("Map: {}", info.name);
    println!("  author:      {}", info.author);
    println!("  description: {}", info.description);
    println!("  suggested:   {}", info.recommended_players);
    println!("  version:     w3i v{}, {} saves", info.version, info.map_version);
    println!(
        "  playable:    {}x{}, tileset '{}'",
        info.playable_width, info.playable_height, info.tileset as char
    );
    println!("  players:     {}", info.players.len());
    for player in &info.players {
        println!(
            "    {:>2} {:<20} controller {} race {}",
            player.id, player.name, player.controller, player.race
        );
    }
    println!("  forces:      {}", info.forces.len());
    for force in &info.forces {
        println!("    {} (mask {:#x})", force.name, force.player_mask);
    }

    Ok(())
}

/// Simple glob matching for filtering.
fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern_lower = pattern.to_lowercase();
    let name_lower = name.to_lowercase();

    if pattern_lower.contains('*') {
        let parts: Vec<&str> = pattern_lower.split('*').collect();
        let mut pos = 0;

        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }

            if let Some(found) = name_lower[pos..].find(part) {
                if i == 0 && found != 0 {
                    // First part must match at start if no leading *
                    return false;
                }
                pos += found + part.len();
            } else {
                return false;
            }
        }

        // If pattern ends with *, any remaining is ok
        // If not, must have consumed the whole string
        parts.last().map_or(true, |p| p.is_empty()) || pos == name_lower.len()
    } else {
        name_lower.contains(&pattern_lower)
    }
}
