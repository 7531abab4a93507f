use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serp_preview::{export_snapshot, FontSpec, SnippetModel, SnippetSnapshot, TextMeasurer};

struct Monospace;

impl TextMeasurer for Monospace {
    fn measure(&self, text: &str, _font: &FontSpec) -> serp_preview::Result<f32> {
        Ok(text.chars().count() as f32 * 8.0)
    }
}

fn golden_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/goldens/expected")
}

fn default_export() -> String {
    let model = SnippetModel::new(Arc::new(Monospace)).expect("model");
    let snapshot = SnippetSnapshot::capture(&model);
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
    export_snapshot(&snapshot, now).expect("export").contents
}

#[test]
fn export_is_deterministic_for_fixed_input() {
    assert_eq!(default_export(), default_export());
}

#[test]
fn golden_export_matches_fixture() {
    let contents = default_export();

    let expected_path = golden_dir().join("default_export.json");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all(golden_dir()).ok();
        fs::write(&expected_path, &contents).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    let exp = fs::read_to_string(&expected_path).unwrap_or_else(|e| {
        panic!(
            "unable to read golden {:?} ({}); run with UPDATE_GOLDENS=1 to create it",
            expected_path, e
        )
    });
    assert_eq!(contents, exp);

    // the digest covers the snippet alone, so it is pinned independently of the timestamp
    let payload: serde_json::Value = serde_json::from_str(&exp).expect("golden is json");
    assert_eq!(
        payload["digest"],
        "bf5a178d5d899704f62127b00ef09d18f94ca4306efb57c3a91577ca48cd069c"
    );
    assert_eq!(payload["snippet"]["description"]["overflow"], true);
    assert_eq!(payload["snippet"]["description_chars"]["count"], 152);
}
