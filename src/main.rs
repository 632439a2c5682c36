use clap::{Parser, Subcommand};
use icnspack::catalog::{icns_catalog, IconSpec, IconTag};
use icnspack::container::read_container;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "icnspack", about = "Multi-resolution ICNS icon container packer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack an iconset directory into an .icns container
    Pack {
        source_dir: PathBuf,
        output: PathBuf,
        /// Replacement icon table (JSON array of {tag, canonical, fallbacks})
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// List the blocks of a packed container
    List {
        input: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Parse a container and report the first structural violation
    Verify {
        input: PathBuf,
    },
    /// Write each block's payload back out under its iconset filename
    Extract {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[derive(Serialize)]
struct BlockInfo {
    tag: IconTag,
    payload_size: usize,
    block_length: u32,
    filename: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse().command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { source_dir, output, catalog } => {
            let specs = match catalog {
                Some(path) => load_catalog(&path)?,
                None => icns_catalog(),
            };
            let report = icnspack::pack_iconset(&source_dir, &specs, &output)?;
            println!(
                "Created: {} ({} bytes, {} block(s))",
                output.display(),
                report.written,
                report.packed.len()
            );
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, json } => {
            let blocks = read_container(&input)?;
            if json {
                let infos: Vec<BlockInfo> = blocks
                    .iter()
                    .map(|b| BlockInfo {
                        tag: b.tag,
                        payload_size: b.payload.len(),
                        block_length: b.declared_len(),
                        filename: canonical_name(b.tag),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else {
                println!("Container: {}", input.display());
                println!("{:<6} {:>10}  Filename", "Tag", "Size");
                for b in &blocks {
                    println!(
                        "{:<6} {:>10}  {}",
                        b.tag.to_string(),
                        b.payload.len(),
                        canonical_name(b.tag).unwrap_or_else(|| "—".into())
                    );
                }
            }
        }

        // ── Verify ───────────────────────────────────────────────────────────
        Commands::Verify { input } => {
            let blocks = read_container(&input)?;
            println!("OK: {} ({} block(s))", input.display(), blocks.len());
        }

        // ── Extract ──────────────────────────────────────────────────────────
        Commands::Extract { input, output_dir } => {
            let blocks = read_container(&input)?;
            if !output_dir.exists() {
                std::fs::create_dir_all(&output_dir)?;
            }
            for b in blocks {
                let name = canonical_name(b.tag).unwrap_or_else(|| format!("{}.png", b.tag));
                std::fs::write(output_dir.join(&name), &b.payload)?;
                println!("  wrote  {name}");
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn load_catalog(path: &PathBuf) -> Result<Vec<IconSpec>, Box<dyn std::error::Error>> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

fn canonical_name(tag: IconTag) -> Option<String> {
    icns_catalog()
        .into_iter()
        .find(|s| s.tag == tag)
        .map(|s| s.canonical)
}
