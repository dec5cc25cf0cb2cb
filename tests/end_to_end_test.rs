use anyhow::Result;
use clap::Parser;
use httpmock::prelude::*;
use planning_extract::{
    ApplicationsPipeline, CliConfig, ElasticsearchBackend, EtlEngine, LocalStorage, TomlConfig,
};
use serde_json::json;
use tempfile::TempDir;

fn mock_two_pages(server: &MockServer) {
    server.mock(|when, then| {
        when.method(POST).path("/applications/_search");
        then.status(200).json_body(json!({
            "_scroll_id": "s0",
            "hits": {"hits": [
                {
                    "_index": "applications",
                    "_id": "a1",
                    "_source": {
                        "borough": "Tower Hamlets",
                        "site_name": "Former Gasworks, Bow",
                        "application_details": {"residential_details": {"site_area": 2.5}},
                        "polygon": {"type": "Polygon", "coordinates": [[[-0.02, 51.53]]]}
                    }
                },
                {
                    "_index": "applications",
                    "_id": "a2",
                    "_source": {"borough": "Lambeth", "postcode": "SW9 8AA"}
                }
            ]}
        }));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/_search/scroll")
            .json_body(json!({"scroll": "2m", "scroll_id": "s0"}));
        then.status(200).json_body(json!({
            "_scroll_id": "s1",
            "hits": {"hits": [
                {"_index": "applications", "_id": "a3", "_source": {"borough": "Ealing"}}
            ]}
        }));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/_search/scroll")
            .json_body(json!({"scroll": "2m", "scroll_id": "s1"}));
        then.status(200)
            .json_body(json!({"_scroll_id": "s2", "hits": {"hits": []}}));
    });
}

#[tokio::test]
async fn test_cli_config_writes_flat_csv() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let server = MockServer::start();
    mock_two_pages(&server);

    let config = CliConfig::parse_from([
        "planning-extract",
        "--endpoint",
        server.base_url().as_str(),
        "--threshold",
        "50",
        "--output-path",
        output_path.as_str(),
        "--formats",
        "csv,json",
    ]);

    let backend = ElasticsearchBackend::from_config(&config)?;
    let storage = LocalStorage::new(output_path.clone());
    let pipeline = ApplicationsPipeline::new(storage, config, backend);
    let engine = EtlEngine::new_with_monitoring(pipeline, true);

    let written = engine.run().await?;
    assert!(written.contains("applications.csv"));
    assert!(written.contains("applications.json"));

    let mut reader = csv::Reader::from_path(temp_dir.path().join("applications.csv"))?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    assert_eq!(
        headers,
        vec![
            "_index",
            "_id",
            "_source.borough",
            "_source.site_name",
            "_source.application_details.residential_details.site_area",
            "_source.polygon.type",
            "_source.polygon.coordinates",
            "_source.postcode",
        ]
    );

    let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][3], "Former Gasworks, Bow");
    assert_eq!(&rows[0][6], "[[[-0.02,51.53]]]");
    assert_eq!(&rows[1][7], "SW9 8AA");
    assert_eq!(&rows[2][2], "Ealing");
    assert_eq!(&rows[2][4], "");

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(temp_dir.path().join("applications.json"))?)?;
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert!(json[2].get("_source.postcode").is_none());
    Ok(())
}

#[tokio::test]
async fn test_toml_config_writes_zip_archive() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().replace('\\', "/");
    let server = MockServer::start();
    mock_two_pages(&server);

    let config = TomlConfig::from_toml_str(&format!(
        r#"
[pipeline]
name = "zip-run"

[source]
endpoint = "{}"

[query]
variant = "social-rent-units"
threshold = 1

[load]
output_path = "{}"
output_formats = ["csv", "tsv"]
compression = {{ enabled = true, filename = "export.zip" }}
"#,
        server.base_url(),
        output_path
    ))?;

    let backend = ElasticsearchBackend::from_config(&config)?;
    let storage = LocalStorage::new(output_path.clone());
    let engine = EtlEngine::new(ApplicationsPipeline::new(storage, config, backend));

    let written = engine.run().await?;
    assert!(written.ends_with("/export.zip"));

    let zip_data = std::fs::read(temp_dir.path().join("export.zip"))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data))?;
    assert_eq!(archive.len(), 2);

    let mut tsv = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("applications.tsv")?, &mut tsv)?;
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("_index\t_id\t_source.borough"));
    Ok(())
}

#[tokio::test]
async fn test_backend_failure_writes_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(POST).path("/applications/_search");
        then.status(200).json_body(json!({
            "_scroll_id": "s0",
            "hits": {"hits": [{"_id": "a1", "_source": {}}]}
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/_search/scroll");
        then.status(500).body("boom");
    });

    let config = CliConfig::parse_from([
        "planning-extract",
        "--endpoint",
        server.base_url().as_str(),
        "--threshold",
        "1",
        "--output-path",
        output_path.as_str(),
    ]);
    let backend = ElasticsearchBackend::from_config(&config)?;
    let storage = LocalStorage::new(output_path.clone());
    let engine = EtlEngine::new(ApplicationsPipeline::new(storage, config, backend));

    assert!(engine.run().await.is_err());
    assert!(!temp_dir.path().join("applications.csv").exists());
    Ok(())
}
