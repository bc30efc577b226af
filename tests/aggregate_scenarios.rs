use std::collections::BTreeMap;

use rusty_mass::analysis::ranges::MeanMass;
use rusty_mass::analysis::{aggregate, analyze_bytes, analyze_file, AnalysisRequest, ViewMode};
use rusty_mass::data::loader::parse_table;
use rusty_mass::data::model::{MeasurementRow, MeasurementTable};
use rusty_mass::data::store::write_parquet;
use rusty_mass::error::AnalysisError;

fn unique_path(name: &str) -> std::path::PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!(
        "rusty_mass_it_{}_{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos(),
        name
    ));
    p
}

const UPLOAD: &[u8] = b"3.0,1,\n\
3.5,1,\n\
1000.0,1,\n\
5000.0,2,\n\
-4.0,2,\n\
91.2,3,\n\
125.0,4,4ee\n\
124.0,4,4MM\n\
garbage,4,4me\n";

#[test]
fn upload_response_has_plots_and_statistics() {
    let result = analyze_bytes(UPLOAD, &AnalysisRequest::default()).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert!(json["plots"]["dilepton"]["traces"].is_array());
    assert_eq!(json["plots"]["dilepton"]["layout"]["barmode"], "stack");
    assert_eq!(json["plots"]["fourlepton"]["traces"].as_array().unwrap().len(), 2);

    let electrons = &json["statistics"]["electrons"];
    assert_eq!(electrons.as_array().unwrap().len(), 6);
    assert_eq!(electrons[0]["events"], 2);
    assert_eq!(electrons[0]["mean"], 3.25);
    assert_eq!(electrons[3]["events"], 1);
    assert_eq!(electrons[3]["mean"], 1000.0);
    assert_eq!(electrons[1]["mean"], "N/A");
    assert_eq!(electrons[5]["range"], "Total");
    assert_eq!(electrons[5]["events"], 3);
    assert_eq!(electrons[5]["mean"], 335.5);
}

#[test]
fn diphoton_view_keeps_every_statistics_table() {
    let form: BTreeMap<String, String> = [("view_mode", "diphoton"), ("num_bins", "12")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let request = AnalysisRequest::from_form(&form);

    let result = analyze_bytes(UPLOAD, &request).unwrap();
    assert_eq!(result.plots.keys().collect::<Vec<_>>(), vec!["diphoton"]);
    assert_eq!(result.plots["diphoton"].traces[0].counts.len(), 12);
    for key in ["electrons", "muons", "photons"] {
        assert!(result.statistics.contains_key(key), "missing {key}");
    }
}

#[test]
fn file_with_no_valid_rows_is_no_data() {
    let err = analyze_bytes(b"mass,type,combination\nx,y,\n,,\n", &AnalysisRequest::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::NoData(_)));
    assert_eq!(err.to_body()["error"], "No valid data found in file");
}

#[test]
fn total_never_less_than_window_sum() {
    let table = parse_table(UPLOAD).unwrap();
    let result = aggregate(&table, ViewMode::All, None, false).unwrap();
    for stats in result.statistics.values() {
        let windows: usize = stats[..5].iter().map(|s| s.event_count).sum();
        assert!(stats[5].event_count >= windows);
    }
}

#[test]
fn log_scale_drops_non_positive_muons() {
    let table = parse_table(UPLOAD).unwrap();
    let linear = aggregate(&table, ViewMode::Dilepton, None, false).unwrap();
    let log = aggregate(&table, ViewMode::Dilepton, None, true).unwrap();

    let muons = |r: &rusty_mass::analysis::AggregateResult| {
        r.plots["dilepton"]
            .traces
            .iter()
            .find(|t| t.category_label == "Muons")
            .map(|t| t.values.len())
            .unwrap()
    };
    assert_eq!(muons(&linear), 2);
    assert_eq!(muons(&log), 1);
    assert!(log.plots["dilepton"].layout.title.contains("non-positive"));
    assert!(!linear.plots["dilepton"].layout.title.contains("non-positive"));
}

#[test]
fn aggregate_is_idempotent() {
    let table = parse_table(UPLOAD).unwrap();
    let a = serde_json::to_string(&aggregate(&table, ViewMode::All, Some(8), true).unwrap()).unwrap();
    let b = serde_json::to_string(&aggregate(&table, ViewMode::All, Some(8), true).unwrap()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn persisted_groups_are_scoped() {
    let path = unique_path("scoped.parquet");
    let team_a: MeasurementTable = vec![MeasurementRow::new(3.0, 1, ""), MeasurementRow::new(3.5, 1, "")]
        .into_iter()
        .collect();
    let team_b: MeasurementTable = vec![MeasurementRow::new(91.0, 3, "")].into_iter().collect();
    write_parquet(&path, &[(Some("a"), &team_a), (Some("b"), &team_b)]).unwrap();

    let mut request = AnalysisRequest {
        group_id: Some("a".to_string()),
        ..Default::default()
    };
    let result = analyze_file(&path, &request).unwrap();
    assert_eq!(result.statistics["electrons"][0].mean_mass, MeanMass::Value(3.25));
    assert_eq!(result.statistics["photons"][5].event_count, 0);

    request.group_id = Some("nobody".to_string());
    let err = analyze_file(&path, &request).unwrap_err();
    assert_eq!(err, AnalysisError::NoData("No valid data found for group nobody".to_string()));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn delimited_files_load_by_extension() {
    let path = unique_path("events.tsv");
    std::fs::write(&path, "3.0\t1\t\n91.0\t3\t\n").unwrap();
    let result = analyze_file(&path, &AnalysisRequest::default()).unwrap();
    assert_eq!(result.statistics["photons"][2].event_count, 1);
    let _ = std::fs::remove_file(&path);

    let err = analyze_file(&unique_path("events.json"), &AnalysisRequest::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::Processing(_)));
}
