//! hsq-cli - Command-line interface for HsqLib
//!
//! A command-line tool for decompressing Cryo HSQ asset files and exporting
//! their image/text payloads as JSON.

use clap::{Parser, Subcommand};
use hsqlib::text::{builtin_table, dune_instructions};
use hsqlib::{
    interpret_image_asset, interpret_text_asset, unpack_named, HsqAsset, HsqHeader, HEADER_SIZE,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "hsq-cli")]
#[command(about = "A CLI tool for decoding Cryo HSQ asset files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompress HSQ files to raw payload bytes
    Decompress {
        /// Input HSQ files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the decompressed output files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Skip the header checksum test
        #[arg(long)]
        ignore_bad_checksum: bool,

        /// Force overwrite of existing output files
        #[arg(short, long)]
        force: bool,
    },

    /// Decode an image asset and export it as JSON
    Image {
        /// Input HSQ file
        input: PathBuf,

        /// Output JSON file (defaults to the input name + ".json")
        output: Option<PathBuf>,

        /// Skip the header checksum test
        #[arg(long)]
        ignore_bad_checksum: bool,

        /// Force overwrite of the output file
        #[arg(short, long)]
        force: bool,
    },

    /// Decode a text asset and export it as JSON
    Text {
        /// Input HSQ file
        input: PathBuf,

        /// Output JSON file (defaults to the input name + ".json")
        output: Option<PathBuf>,

        /// Charset locale for character redirection
        #[arg(short, long, default_value = "en-US")]
        culture: String,

        /// Skip the header checksum test
        #[arg(long)]
        ignore_bad_checksum: bool,

        /// Force overwrite of the output file
        #[arg(short, long)]
        force: bool,
    },

    /// Show header information for an HSQ file
    Info {
        /// HSQ file to analyze
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Decompress {
            inputs,
            output_dir,
            ignore_bad_checksum,
            force,
        } => decompress_files(
            &inputs,
            &output_dir,
            ignore_bad_checksum,
            force,
            cli.verbose,
            cli.quiet,
        ),
        Commands::Image {
            input,
            output,
            ignore_bad_checksum,
            force,
        } => export_image(&input, output.as_deref(), ignore_bad_checksum, force, cli.quiet),
        Commands::Text {
            input,
            output,
            culture,
            ignore_bad_checksum,
            force,
        } => export_text(
            &input,
            output.as_deref(),
            &culture,
            ignore_bad_checksum,
            force,
            cli.quiet,
        ),
        Commands::Info { input } => show_file_info(&input, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Decompress one HSQ file into memory, carrying its file name through
fn unpack_file(input: &Path, ignore_bad_checksum: bool) -> Result<HsqAsset, Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }

    let compressed = fs::read(input)?;
    let source_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let asset = unpack_named(&source_name, &compressed, !ignore_bad_checksum)
        .map_err(|e| format!("Decompression of '{}' failed: {}", input.display(), e))?;
    Ok(asset)
}

fn decompress_files(
    inputs: &[PathBuf],
    output_dir: &Path,
    ignore_bad_checksum: bool,
    force: bool,
    verbose: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    fs::create_dir_all(output_dir)?;

    let progress = if !quiet && inputs.len() > 1 {
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start_time = Instant::now();
    for input in inputs {
        if let Some(ref pb) = progress {
            pb.set_message(input.display().to_string());
        }

        let output = output_dir.join(format!(
            "{}.unpacked",
            input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string())
        ));
        if output.exists() && !force {
            return Err(format!(
                "Output file '{}' already exists. Use --force to overwrite",
                output.display()
            )
            .into());
        }

        let asset = unpack_file(input, ignore_bad_checksum)?;

        if verbose {
            println!(
                "{}: {} -> {} bytes (header declares {})",
                input.display(),
                asset.header.compressed_size,
                asset.bytes.len(),
                asset.header.uncompressed_size
            );
            if !asset.header.matches_uncompressed_len(asset.bytes.len()) {
                println!("  Note: decompressed size differs from the header declaration");
            }
        }

        fs::write(&output, &asset.bytes)?;

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("Decompression complete");
    }

    if !quiet {
        println!(
            "✓ Decompressed {} file(s) in {:.2?}",
            inputs.len(),
            start_time.elapsed()
        );
    }

    Ok(())
}

fn resolve_output(input: &Path, output: Option<&Path>, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let mut name = input.as_os_str().to_owned();
            name.push(".json");
            PathBuf::from(name)
        }
    };
    if path.exists() && !force {
        return Err(format!(
            "Output file '{}' already exists. Use --force to overwrite",
            path.display()
        )
        .into());
    }
    Ok(path)
}

fn export_image(
    input: &Path,
    output: Option<&Path>,
    ignore_bad_checksum: bool,
    force: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = resolve_output(input, output, force)?;
    let asset = unpack_file(input, ignore_bad_checksum)?;
    let image = interpret_image_asset(&asset)?;

    fs::write(&output, serde_json::to_string_pretty(&image)?)?;

    if !quiet {
        println!("✓ Image asset decoded");
        println!("  Subpalettes:   {}", image.sub_palettes.len());
        println!("  Image parts:   {}", image.image_parts.len());
        println!("  Unknown parts: {}", image.unknown_parts.len());
        println!("  Output:        {}", output.display());
    }

    Ok(())
}

fn export_text(
    input: &Path,
    output: Option<&Path>,
    culture: &str,
    ignore_bad_checksum: bool,
    force: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let charset = builtin_table(culture)
        .ok_or_else(|| format!("Unknown culture '{}' (built-in: en-US, fr-FR)", culture))?;

    let output = resolve_output(input, output, force)?;
    let asset = unpack_file(input, ignore_bad_checksum)?;
    let text = interpret_text_asset(&asset, &charset, &dune_instructions())?;

    fs::write(&output, serde_json::to_string_pretty(&text)?)?;

    if !quiet {
        println!("✓ Text asset decoded");
        println!("  Culture:   {}", text.culture);
        println!("  Sentences: {}", text.sentences.len());
        println!("  Output:    {}", output.display());
    }

    Ok(())
}

fn show_file_info(input: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file '{}' does not exist", input.display()).into());
    }

    let data = fs::read(input)?;
    if data.len() < HEADER_SIZE {
        return Err("File too small to be a valid HSQ file".into());
    }

    let checksum_ok = HsqHeader::checksum_valid(&data[..HEADER_SIZE]);
    let header = HsqHeader::from_bytes(&data, false)?;

    println!("HSQ File Information:");
    println!("  File: {}", input.display());
    println!("  Size: {} bytes", data.len());
    println!("  Declared compressed size:   {} bytes", header.compressed_size);
    println!("  Declared uncompressed size: {} bytes", header.uncompressed_size);
    println!(
        "  Header checksum: {}",
        if checksum_ok { "✓ valid" } else { "✗ invalid" }
    );

    if !header.matches_compressed_len(data.len()) {
        println!("  Note: file size differs from the declared compressed size");
    }

    if verbose {
        let h = &data[..HEADER_SIZE];
        println!(
            "  Header bytes: {:02x} {:02x} {:02x} {:02x} {:02x} {:02x}",
            h[0], h[1], h[2], h[3], h[4], h[5]
        );
    }

    // Try to decompress to confirm the body is intact.
    match unpack_named("", &data, false) {
        Ok(asset) => {
            println!("  Decompressed size: {} bytes", asset.bytes.len());
            println!("  Status: ✓ Valid HSQ file");
        }
        Err(e) => {
            println!("  Status: ✗ Invalid or corrupted HSQ file");
            if verbose {
                println!("  Error: {}", e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_decompress_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let input_path = dir.path().join("SAMPLE.HSQ");

        // All-literal stream: instruction word 0xFFFF then 8 data bytes.
        let payload = [0x01u8, 0x02, 0x04, 0x08, 0x0C, 0x10, 0x03, 0x11];
        let mut file = vec![0x08, 0x00, 0x00, 0x10, 0x00, 0x93, 0xFF, 0xFF];
        file.extend_from_slice(&payload);
        fs::write(&input_path, &file)?;

        decompress_files(&[input_path], dir.path(), false, false, false, true)?;

        let result = fs::read(dir.path().join("SAMPLE.unpacked"))?;
        assert_eq!(result, payload);

        Ok(())
    }
}
