//! Shared helper functions for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use doctime::config::{Config, LoadOptions};
use doctime::models::Document;
use doctime::services::{
    DctAnnotator, EventFilter, FileLocator, LatestDateApproximator, PatternNormalizer,
    TermFilterSet, TimexTextWriter,
};

use super::DctArgs;

/// Load config from `--config`, or next to the input, or from the CWD.
pub fn load_config(config_path: Option<&Path>, input: &Path) -> anyhow::Result<Config> {
    let mut search_dirs = Vec::new();
    if let Some(parent) = input.parent().filter(|p| !p.as_os_str().is_empty()) {
        search_dirs.push(parent.to_path_buf());
    }
    if let Ok(cwd) = std::env::current_dir() {
        search_dirs.push(cwd);
    }

    let options = LoadOptions {
        config_path: config_path.map(Path::to_path_buf),
        search_dirs,
    };
    Ok(Config::load(&options)?)
}

pub fn load_document(path: &Path) -> anyhow::Result<Document> {
    Document::load(path).with_context(|| format!("Could not load document {}", path.display()))
}

pub fn dct_annotator(config: &Config, args: &DctArgs) -> DctAnnotator {
    let header_mode = args
        .header_mode
        .map(Into::into)
        .unwrap_or(config.doc_time.header_mode);
    let policy = args
        .on_malformed_header
        .map(Into::into)
        .unwrap_or(config.doc_time.on_malformed_header);

    DctAnnotator::new(Arc::new(LatestDateApproximator::new()))
        .with_header_mode(header_mode)
        .with_malformed_policy(policy)
}

/// Filter list from the flag (CWD relative) or the config (config relative).
pub fn event_filter(config: &Config, filter_list: Option<&str>) -> anyhow::Result<EventFilter> {
    let filter = match filter_list {
        Some(location) => EventFilter::new(TermFilterSet::load(Some(location), &FileLocator::new())?),
        None => EventFilter::from_config(config.event_filter.filter_list.as_deref(), &config.locator())?,
    };
    Ok(filter)
}

/// Output directory from the flag, then the config, then the input's directory.
pub fn output_dir(config: &Config, flag: Option<PathBuf>, input: &Path) -> PathBuf {
    flag.or_else(|| config.output_dir()).unwrap_or_else(|| {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

pub fn timex_writer(output_dir: PathBuf) -> TimexTextWriter {
    TimexTextWriter::new(Arc::new(PatternNormalizer::new()), output_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_dir_precedence() {
        let mut config = Config::default();
        let input = Path::new("/notes/a.json");
        assert_eq!(output_dir(&config, None, input), PathBuf::from("/notes"));
        assert_eq!(output_dir(&config, None, Path::new("a.json")), PathBuf::from("."));

        config.timex.output_dir = Some("/cfg/out".to_string());
        assert_eq!(output_dir(&config, None, input), PathBuf::from("/cfg/out"));
        assert_eq!(
            output_dir(&config, Some(PathBuf::from("/flag")), input),
            PathBuf::from("/flag")
        );
    }

    #[test]
    fn test_event_filter_requires_list() {
        let err = event_filter(&Config::default(), None).err().unwrap();
        assert!(err.to_string().contains("No event filter list configured"));
    }
}
