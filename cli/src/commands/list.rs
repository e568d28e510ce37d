//! `boxes list` command.

use clap::Args;
use serde::Serialize;

use boxes_core::naming;
use boxes_core::BoxesConfig;

use crate::output;

#[derive(Args)]
pub struct ListArgs {
    /// Print the boxes as JSON
    #[arg(long)]
    pub json: bool,
}

/// Display row for one configured box.
#[derive(Debug, Serialize)]
struct BoxRow {
    #[serde(rename = "box")]
    name: String,
    container: String,
    base: Option<String>,
    packaged: Option<String>,
}

fn rows(config: &BoxesConfig) -> Vec<BoxRow> {
    config
        .boxes
        .keys()
        .map(|name| {
            let container = naming::container_name(name);
            let archive = naming::publish_target_path(&config.work_dir, &container);
            BoxRow {
                name: name.clone(),
                base: config.base_for(name).map(str::to_string),
                packaged: archive
                    .exists()
                    .then(|| archive.display().to_string()),
                container,
            }
        })
        .collect()
}

pub fn execute(args: ListArgs, config: &BoxesConfig) -> Result<(), Box<dyn std::error::Error>> {
    let rows = rows(config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mut table = output::new_table(&["BOX", "CONTAINER", "BASE", "PACKAGED"]);
    for row in &rows {
        let packaged = match &row.packaged {
            Some(path) => output::file_size(std::path::Path::new(path)),
            None => "-".to_string(),
        };
        table.add_row(&[
            row.name.as_str(),
            row.container.as_str(),
            row.base.as_deref().unwrap_or("-"),
            packaged.as_str(),
        ]);
    }
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxes_core::BoxDefinition;

    fn config(work_dir: &std::path::Path) -> BoxesConfig {
        let mut config = BoxesConfig {
            work_dir: work_dir.to_path_buf(),
            ..BoxesConfig::default()
        };
        config.boxes.insert(
            "development".to_string(),
            BoxDefinition {
                base: Some("http://example.com/precise64.tar.gz".to_string()),
            },
        );
        config
            .boxes
            .insert("ruby".to_string(), BoxDefinition { base: None });
        config
    }

    #[test]
    fn test_rows_follow_config_order() {
        let tmp = tempfile::tempdir().unwrap();
        let rows = rows(&config(tmp.path()));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "development");
        assert_eq!(rows[0].container, "travis-development");
        assert_eq!(
            rows[0].base.as_deref(),
            Some("http://example.com/precise64.tar.gz")
        );
        assert_eq!(rows[1].name, "ruby");
        assert!(rows[1].base.is_none());
        assert!(rows.iter().all(|r| r.packaged.is_none()));
    }

    #[test]
    fn test_rows_detect_packaged_box() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("templates")).unwrap();
        std::fs::write(tmp.path().join("templates/travis-ruby.tar.gz"), "box").unwrap();

        let rows = rows(&config(tmp.path()));
        assert!(rows[0].packaged.is_none());
        assert!(rows[1]
            .packaged
            .as_deref()
            .unwrap()
            .ends_with("travis-ruby.tar.gz"));
    }

    #[test]
    fn test_json_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let json = serde_json::to_value(rows(&config(tmp.path()))).unwrap();
        assert_eq!(json[0]["box"], "development");
        assert_eq!(json[1]["base"], serde_json::Value::Null);
    }
}
