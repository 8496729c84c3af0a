use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use surface_forge::AtomClassifier;
use surface_forge::pipeline::{Config, Manifest, Options, Pipeline, read_structure_list};

use crate::commands::progress_bar;

/// Builds or updates one bundle per listed structure.
#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// File listing structure file names, one per line, relative to PDB_FILES_PATH.
    #[arg(value_name = "LIST")]
    pub list: PathBuf,
    /// JSON configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,
    /// Classifier for labels: a built-in class set, a JSON class set, or an identifier list.
    #[arg(
        short = 'm',
        long = "moieties",
        value_name = "CLASSIFIER",
        required_unless_present = "no_labels"
    )]
    pub moieties: Option<String>,
    /// Manifest receiving the name of every bundle written.
    #[arg(short, long, value_name = "FILE", default_value = "processed_files.dat")]
    pub output_file: PathBuf,
    /// Recompute every requested group even when it is already stored.
    #[arg(short, long)]
    pub refresh: bool,
    /// Skip the electrostatic feature columns.
    #[arg(short = 'E', long)]
    pub no_electrostatics: bool,
    /// Skip labels.
    #[arg(short = 'L', long)]
    pub no_labels: bool,
    /// Skip features.
    #[arg(short = 'F', long)]
    pub no_features: bool,
    /// Skip the adjacency artifact.
    #[arg(short = 'A', long)]
    pub no_adjacency: bool,
}

impl ProcessArgs {
    fn options(&self) -> Options {
        Options {
            features: !self.no_features,
            electrostatics: !self.no_electrostatics,
            labels: !self.no_labels,
            adjacency: !self.no_adjacency,
            refresh: self.refresh,
        }
    }
}

pub fn run(args: &ProcessArgs, show_progress: bool) -> Result<()> {
    let config = Config::from_file(&args.config)?;
    let classifier = match (&args.moieties, args.no_labels) {
        (Some(spec), false) => Some(
            AtomClassifier::resolve(spec)
                .with_context(|| format!("Failed to build classifier from '{}'", spec))?,
        ),
        _ => None,
    };
    if let Some(classifier) = &classifier {
        log::info!(
            "labelling with class set '{}' ({})",
            classifier.name(),
            classifier.classes().join(", ")
        );
    }

    let pipeline = Pipeline::new(config, args.options(), classifier)?;
    let entries = read_structure_list(&args.list)
        .with_context(|| format!("Failed to read structure list {}", args.list.display()))?;
    let mut manifest = Manifest::create(&args.output_file)?;
    log::info!("processing {} structures from {}", entries.len(), args.list.display());

    let progress = progress_bar(entries.len() as u64, show_progress);
    let result = pipeline.run(&entries, &mut manifest, |entry| {
        progress.set_message(entry.to_string());
        progress.inc(1);
    });

    let summary = match result {
        Ok(summary) => {
            progress.finish_with_message("done");
            summary
        }
        Err(e) => {
            progress.abandon_with_message("aborted");
            return Err(e).context("Run aborted");
        }
    };

    log::info!(
        "wrote {} bundles to {}; manifest {}",
        summary.processed,
        pipeline.config().feature_data_path.display(),
        manifest.path().display()
    );
    if !summary.failed.is_empty() {
        log::warn!(
            "{} structures failed: {}",
            summary.failed.len(),
            summary.failed.join(", ")
        );
    }
    Ok(())
}
