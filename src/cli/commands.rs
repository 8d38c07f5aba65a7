//! Command implementations.

use std::path::{Path, PathBuf};

use anyhow::Context;
use console::style;

use doctime::config::Config;
use doctime::services::{AnnotationOutput, Annotator};

use super::helpers;
use super::DctArgs;

pub fn cmd_dct(config: &Config, input: &Path, args: &DctArgs, write: bool) -> anyhow::Result<()> {
    let mut doc = helpers::load_document(input)?;
    let dct = helpers::dct_annotator(config, args);

    let estimate = dct
        .resolve(&mut doc)
        .with_context(|| format!("Could not resolve creation time for {}", doc.id()))?;

    match &estimate.date {
        Some(date) => println!(
            "{} {}: {} (from {})",
            style("✓").green(),
            doc.id(),
            style(date).cyan(),
            estimate.source
        ),
        None => println!(
            "{} {}: no creation time found",
            style("!").yellow(),
            doc.id()
        ),
    }

    if write {
        doc.save(input)?;
        println!("  Updated {}", input.display());
    }
    Ok(())
}

pub fn cmd_filter(
    config: &Config,
    input: &Path,
    filter_list: Option<&str>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let filter = helpers::event_filter(config, filter_list)?;
    let mut doc = helpers::load_document(input)?;

    let outcome = filter.process(&mut doc)?;
    println!(
        "{} {}: kept {} event mentions, removed {}",
        style("✓").green(),
        doc.id(),
        outcome.retained.len(),
        outcome.removed.len()
    );
    for span in &outcome.removed {
        println!("  {} {:?}", style("-").red(), doc.covered_text(span));
    }

    if let Some(output) = output {
        doc.save(output)?;
        println!("  Wrote {}", output.display());
    }
    Ok(())
}

pub fn cmd_timex(config: &Config, input: &Path, output_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let doc = helpers::load_document(input)?;
    let writer = helpers::timex_writer(helpers::output_dir(config, output_dir, input));

    let path = writer.write_file(&doc)?;
    println!("{} Wrote {}", style("✓").green(), path.display());
    Ok(())
}

/// Run every pass over one document and save the result.
pub fn cmd_run(
    config: &Config,
    input: &Path,
    args: &DctArgs,
    filter_list: Option<&str>,
    output_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    // Build every pass up front so a missing filter list fails before any output.
    let dct = helpers::dct_annotator(config, args);
    let filter = helpers::event_filter(config, filter_list)?;
    let output_dir = helpers::output_dir(config, output_dir, input);
    let writer = helpers::timex_writer(output_dir.clone());

    let mut doc = helpers::load_document(input)?;
    let passes: [&dyn Annotator; 3] = [&dct, &filter, &writer];
    for pass in passes {
        let output = pass
            .annotate(&mut doc)
            .with_context(|| format!("{} failed for {}", pass.display_name(), doc.id()))?;
        match output {
            AnnotationOutput::Data(data) => {
                println!("{} {}: {}", style("✓").green(), pass.display_name(), data)
            }
            AnnotationOutput::NoResult => {
                println!("{} {}: no result", style("!").yellow(), pass.display_name())
            }
            AnnotationOutput::Skipped => {
                println!("{} {}: skipped", style("-").dim(), pass.display_name())
            }
        }
    }

    let annotated = output_dir.join(format!("{}_annotated.json", doc.id()));
    doc.save(&annotated)?;
    println!("  Saved {}", annotated.display());
    Ok(())
}
