//! `ferry check` command implementation
//!
//! Validates a pipeline configuration and shows the loader order.

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

use ferry_etl::config::PipelineConfig;
use ferry_etl::load::Loader;

use crate::config::Config;
use crate::error::{CliError, Result};

/// Validate the pipeline configuration and print its loaders
pub fn run(config: &Config) -> Result<()> {
    if !config.pipeline.is_file() {
        return Err(CliError::file_not_found(&config.pipeline));
    }

    let pipeline = PipelineConfig::from_path(&config.pipeline)?;
    let loaders = pipeline.registry()?.loaders()?;

    println!(
        "{} {}",
        "Pipeline OK:".green().bold(),
        config.pipeline.display()
    );
    println!("{}", loader_table(&loaders));
    println!(
        "Source format: {}, duplicates: {:?}",
        pipeline.source.format,
        pipeline.duplicates
    );

    Ok(())
}

fn loader_table(loaders: &[Loader]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["#", "Entity", "Source tag", "Candidates"]);

    for (index, loader) in loaders.iter().enumerate() {
        let candidates: Vec<&str> = loader.candidates().iter().map(|c| c.name()).collect();
        table.add_row(vec![
            (index + 1).to_string(),
            loader.entity().to_string(),
            loader.source_tag().to_string(),
            candidates.join(" -> "),
        ]);
    }
    table
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ferry_etl::transform::TransformCandidate;
    use ferry_etl::EntityType;

    #[test]
    fn test_loader_table_lists_candidates_in_order() {
        let loader = Loader::new(
            EntityType::new("blog.category"),
            vec![
                TransformCandidate::identity("v2"),
                TransformCandidate::identity("v1"),
            ],
        )
        .unwrap()
        .with_source_tag("category");

        let rendered = loader_table(&[loader]).to_string();
        assert!(rendered.contains("blog.category"));
        assert!(rendered.contains("v2 -> v1"));
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ferry.toml");
        std::fs::write(&path, "[[entities]]\nname = \"widget\"\n").unwrap();

        let config = Config {
            pipeline: path,
            ..Config::default()
        };
        assert!(matches!(run(&config).unwrap_err(), CliError::Config(_)));
    }
}
