//! PDF Batch CLI tool
//!
//! A command-line tool for merging, annotating, watermarking and protecting PDFs.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::PathBuf;
use std::process;

use pdf_batch::model::{OutputOptions, PageSelection, TextEdit};
use pdf_batch::naming::format_file_size;
use pdf_batch::pdf::extract_metadata;
use pdf_batch::platform::{
    AlwaysGranted, DirectoryPicker, DocumentPicker, FixedDirectory, LocalFiles, NoShare,
    OpenWithDefaultApp, PathPicker, ShareTarget,
};
use pdf_batch::{Collaborators, Session};

/// PDF Batch - Merge, annotate, watermark and protect PDFs
#[derive(Parser)]
#[command(name = "pdf-batch")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Merge every PDF in the directory into ./processed_<millis>.pdf
    pdf-batch process \"*.pdf\"

    # Keep pages 1 and 3-5 of each input and stamp a watermark
    pdf-batch process -o out --pages 1,3-5 --watermark DRAFT a.pdf b.pdf

    # Add a note to page 2 and require a password to open the result
    pdf-batch process --text \"2:72:720:Reviewed\" --password s3cret report.pdf

    # Show information about a PDF
    pdf-batch info report.pdf")]
struct Cli {
    /// Show per-page diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the inputs and apply edits, watermark and protection
    Process {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output directory (defaults to the current directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Pages to keep from every input, 1-based (e.g. "1,3-5")
        #[arg(long)]
        pages: Option<String>,

        /// Text to draw, as PAGE:X:Y:TEXT (PAGE is 1-based, may repeat)
        #[arg(long = "text", value_name = "PAGE:X:Y:TEXT")]
        texts: Vec<String>,

        /// Watermark text stamped diagonally on every page
        #[arg(long)]
        watermark: Option<String>,

        /// Watermark opacity between 0 and 1
        #[arg(long, default_value_t = pdf_batch::config::DEFAULT_WATERMARK_OPACITY)]
        opacity: f32,

        /// Password required to open the output
        #[arg(long)]
        password: Option<String>,

        /// Leave content streams uncompressed
        #[arg(long)]
        no_compress: bool,

        /// Write a classic cross-reference table instead of object streams
        #[arg(long)]
        no_object_streams: bool,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,

        /// Password for protected files
        #[arg(long)]
        password: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Commands::Process {
            inputs,
            output_dir,
            pages,
            texts,
            watermark,
            opacity,
            password,
            no_compress,
            no_object_streams,
            open,
        } => {
            let options = OutputOptions {
                compress: !no_compress,
                use_object_streams: !no_object_streams,
                password,
            };
            cmd_process(inputs, output_dir, pages, texts, watermark, opacity, options, open)
        }
        Commands::Info { input, password } => cmd_info(input, password),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched: Vec<PathBuf> = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("invalid pattern {}", pattern))? {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => log::warn!("glob error for {}: {}", pattern, e),
                }
            }
            if matched.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            // Sorted within a pattern; patterns keep command-line order
            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Merge the inputs and apply everything requested
#[allow(clippy::too_many_arguments)]
fn cmd_process(
    inputs: Vec<String>,
    output_dir: Option<PathBuf>,
    pages: Option<String>,
    texts: Vec<String>,
    watermark: Option<String>,
    opacity: f32,
    options: OutputOptions,
    open: bool,
) -> Result<()> {
    let inputs = expand_globs(inputs)?;
    let default_dir = std::env::current_dir().context("cannot determine current directory")?;

    let mut session = Session::new(default_dir);
    session.set_output_location(FixedDirectory(output_dir).pick_directory());
    session.add_documents(PathPicker::new(inputs).pick_documents());
    if let Some(err) = session.last_error() {
        bail!("{}", err);
    }

    if let Some(pages) = pages {
        session.set_page_selection(PageSelection::parse(&pages)?);
    }
    for text in &texts {
        session.push_text_edit(TextEdit::parse(text)?);
    }
    if let Some(text) = watermark {
        session.set_watermark_with_opacity(text, opacity);
    }
    session.set_output_options(options);

    eprintln!("Processing {} PDF files...", session.sources().len());

    let share: &dyn ShareTarget = if open { &OpenWithDefaultApp } else { &NoShare };
    let with = Collaborators {
        permissions: &AlwaysGranted,
        files: &LocalFiles,
        share,
    };

    match session.process(&with) {
        Some(output) => {
            eprintln!("Output: {}", output.display());
            Ok(())
        }
        None => match session.last_error() {
            Some(err) => bail!("{}", err),
            None => bail!("No input files provided"),
        },
    }
}

/// Show information about a PDF
fn cmd_info(input: PathBuf, password: Option<String>) -> Result<()> {
    let metadata = extract_metadata(&input, password.as_deref())?;
    let size = std::fs::metadata(&input)?.len();

    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(size));
    if metadata.page_count == 0 && metadata.encrypted {
        println!("Pages: unknown (protected)");
    } else {
        println!("Pages: {}", metadata.page_count);
    }

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }
    if metadata.encrypted {
        println!("Encrypted: yes");
    }

    Ok(())
}
