use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use uuid::Uuid;

use imagepost::cli::{build_pipeline, Cli, Command};
use imagepost::io::{collect_files, read_file, resolve_output, write_file};
use imagepost::report::{FileResult, Report};
use imagepost_core::cache_key::http_date;
use imagepost_core::config::RenderConfig;
use imagepost_core::format::OutputFormat;
use imagepost_core::{render_encoded, ImageKind, MediaEntity, Pipeline, RenderOutcome, RenderRequest};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match &cli.command {
        Command::Render {
            input,
            output,
            width,
            height,
            kind,
            index,
            entity,
            only_kind,
            filter,
            quality,
            recursive,
            dry_run,
        } => {
            let config = cli.to_config(*width, *height, *filter, *quality);
            let pipeline = build_pipeline(only_kind);
            let entity = entity.map(MediaEntity::new);
            let request = RenderRequest {
                entity: entity.as_ref(),
                kind: *kind,
                index: *index,
            };
            handle_render(&pipeline, input, output.as_deref(), *recursive, *dry_run, &config, request)
        }
        Command::Processors { only_kind } => handle_processors(&build_pipeline(only_kind)),
        Command::CacheKey {
            entity,
            kind,
            index,
            only_kind,
        } => handle_cache_key(&build_pipeline(only_kind), *entity, *kind, *index),
    }
}

fn handle_render(
    pipeline: &Pipeline,
    input: &Path,
    output: Option<&Path>,
    recursive: bool,
    dry_run: bool,
    config: &RenderConfig,
    request: RenderRequest<'_>,
) -> Result<()> {
    let files = collect_files(input, recursive).context("Failed to collect input files")?;

    if files.is_empty() {
        println!("No supported files found.");
        return Ok(());
    }

    println!("Found {} file(s) to render.", files.len());

    if dry_run {
        println!("[dry-run] Would render:");
        for f in &files {
            let original = OutputFormat::from_path(f);
            let format =
                pipeline.output_format(original, request.entity, request.kind, request.index, config);
            let out = resolve_output(f, input, output, format);
            println!("  {} → {}", f.display(), out.display());
        }
        return Ok(());
    }

    // Progress bar
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("█▓░"),
    );

    let report = Mutex::new(Report::new());

    // Render files in parallel; the pipeline is shared by every worker
    files.par_iter().for_each(|input_path| {
        let result = (|| -> std::result::Result<FileResult, anyhow::Error> {
            let data = read_file(input_path)?;
            let rendered = render_encoded(pipeline, &data, config, request)?;

            let output_path = resolve_output(input_path, input, output, rendered.format);
            write_file(&output_path, &rendered.bytes)?;

            Ok(FileResult {
                path: input_path.clone(),
                original_size: data.len() as u64,
                output_size: rendered.bytes.len() as u64,
                processor: rendered.outcome.processor().map(String::from),
                recovered: matches!(rendered.outcome, RenderOutcome::Recovered { .. }),
                error: None,
            })
        })();

        match result {
            Ok(file_result) => {
                let name = input_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                pb.set_message(format!(
                    "{} ({})",
                    name,
                    file_result.processor.as_deref().unwrap_or("unprocessed")
                ));
                add_result(&report, file_result);
            }
            Err(e) => {
                log::error!("Error rendering {}: {}", input_path.display(), e);
                add_result(&report, FileResult::failed(input_path.clone(), e));
            }
        }

        pb.inc(1);
    });

    pb.finish_with_message("Done!");
    let report = report.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    report.print_summary();

    Ok(())
}

fn add_result(report: &Mutex<Report>, result: FileResult) {
    report
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .add(result);
}

fn handle_processors(pipeline: &Pipeline) -> Result<()> {
    if pipeline.is_empty() {
        println!("No processors registered.");
        return Ok(());
    }

    println!("Registered processors (priority order):");
    for (position, processor) in pipeline.processors().enumerate() {
        println!(
            "  {}. {} | transparency: {} | configured: {}",
            position + 1,
            processor.name(),
            if processor.requires_transparency() { "required" } else { "no" },
            processor.configuration_last_modified().to_rfc3339()
        );
    }
    Ok(())
}

fn handle_cache_key(
    pipeline: &Pipeline,
    entity: Option<Uuid>,
    kind: ImageKind,
    index: u32,
) -> Result<()> {
    let entity = entity.map(MediaEntity::new);
    let key = pipeline.cache_key(entity.as_ref(), kind, index);

    println!("Key:           {}", key.canonical());
    println!("ETag:          {}", key.etag());
    match key.last_modified() {
        Some(at) => println!("Last-Modified: {}", http_date(at)),
        None => println!("Last-Modified: (no processor applies)"),
    }
    Ok(())
}
