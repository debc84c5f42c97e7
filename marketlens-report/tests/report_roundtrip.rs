//! Config → load → build → export, end to end on a temp CSV.

use marketlens_core::store::DatasetStore;
use marketlens_core::version::VersionWeights;
use marketlens_report::{build_report, open_store, write_report_csv, ReportConfig};
use std::io::Write;

fn write_sample_csv(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("prices.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "year,mmdd,version,region,value").unwrap();
    // tx1 row is superseded by txr on the same (date, region)
    writeln!(f, "2025,115,tx1,North,100").unwrap();
    writeln!(f, "2025,115,txr,North,5").unwrap();
    writeln!(f, "2025,116,txr,North,6").unwrap();
    writeln!(f, "2025,115,txr,South,7").unwrap();
    path
}

#[test]
fn report_builds_and_exports_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = write_sample_csv(dir.path());

    let toml_text = format!(
        r#"
dataset = "{}"
op = "sum"
value_column = "value"

[[blocks]]
label = "All regions"

[[blocks]]
label = "North"
filters = {{ region = "North" }}

[[blocks]]
label = "Ghost"
filters = {{ region = "Atlantis" }}
"#,
        data_path.display()
    );
    let config = ReportConfig::from_toml_str(&toml_text).unwrap();

    let store = open_store(&config.dataset, Some(&config.display_name()), &config.technical)
        .unwrap();
    assert_eq!(store.schema().dimension_columns(), vec!["region"]);

    let blocks = build_report(&store, &VersionWeights::default(), &config).unwrap();
    assert_eq!(blocks.len(), 3);

    // Version resolution dropped the tx1 row: 2025-01-15 sums 5 + 7.
    assert_eq!(blocks[0].points[0].value, 12.0);
    assert_eq!(blocks[1].points[0].value, 5.0);
    assert!(blocks[2].empty);

    let out = dir.path().join("report.csv");
    write_report_csv(&out, &blocks).unwrap();
    let text = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "date,All regions,date,North,date,Ghost");
    assert!(lines[1].contains("region=North"));
    assert!(lines[1].contains("no data"));
    assert_eq!(lines[2], "2025-01-15,12,2025-01-15,5,,");
    assert_eq!(lines[3], "2025-01-16,6,2025-01-16,6,,");
}
