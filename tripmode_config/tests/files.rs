use std::fs;
use tempfile::tempdir;
use tripmode_config::{load_model, load_norm_params, load_recording_dir, load_toml};
use tripmode_traits::{Channel, Classifier, FEATURE_LEN};

fn weights_line(hot: usize) -> String {
    let w: Vec<String> = (0..FEATURE_LEN)
        .map(|i| if i == hot { "1.0".into() } else { "0.0".into() })
        .collect();
    format!("[{}]", w.join(", "))
}

#[test]
fn loads_model_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.toml");
    let text = format!(
        "[[classes]]\ncode = 1\nweights = {}\n\n[[classes]]\ncode = 5\nbias = 0.5\nweights = {}\n",
        weights_line(0),
        weights_line(1)
    );
    fs::write(&path, text).unwrap();

    let model = load_model(&path).expect("load model");
    assert_eq!(model.codes().collect::<Vec<_>>(), vec![1, 5]);
    // x = 0 everywhere: class 5 wins on bias
    assert_eq!(model.predict(&[0.0; FEATURE_LEN]).unwrap(), 5);
}

#[test]
fn model_with_short_weights_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.toml");
    fs::write(&path, "[[classes]]\ncode = 1\nweights = [1.0, 2.0]\n").unwrap();
    let err = load_model(&path).expect_err("short weights");
    assert!(format!("{err}").contains("expected 18"));
}

#[test]
fn normalization_file_overrides_inline_values() {
    let dir = tempdir().unwrap();
    let norm = dir.path().join("norm_param.txt");
    fs::write(&norm, "2.0,-0.5").unwrap();
    assert_eq!(load_norm_params(&norm).unwrap().scale, 2.0);

    let toml = format!(
        "[normalization]\nscale = 1.0\noffset = 0.0\nfile = {:?}\n",
        norm.to_string_lossy()
    );
    let cfg = load_toml(&toml).unwrap();
    let p = cfg.resolve_normalization().unwrap();
    assert_eq!(p.scale, 2.0);
    assert_eq!(p.offset, -0.5);
}

#[test]
fn loads_recording_directory_in_time_order() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("linear.csv"),
        "2,20000,0.1,0.2,0.3\n2,10000,0.4,0.5,0.6\n",
    )
    .unwrap();
    fs::write(dir.path().join("gravity.csv"), "2,15000,0,0,9.8\n").unwrap();
    fs::write(dir.path().join("gyro.csv"), "0,10000,0.01,0.02,0.03\n").unwrap();

    let rec = load_recording_dir(dir.path()).expect("load recording");
    assert_eq!(rec.len(), 4);
    assert_eq!(rec.span(), Some((10_000, 20_000)));
    assert_eq!(rec.rows(Channel::LinearAcceleration)[0].timestamp_us, 10_000);

    let ts: Vec<u64> = rec.events().iter().map(|e| e.sample.timestamp_us).collect();
    assert_eq!(ts, vec![10_000, 10_000, 15_000, 20_000]);
    assert_eq!(rec.class_at(5_000), None);
    assert_eq!(rec.class_at(12_000), Some(2));
}

#[test]
fn malformed_row_reports_line_number() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("linear.csv"), "1,0,0,0,0\n1,10,abc,0,0\n").unwrap();
    fs::write(dir.path().join("gravity.csv"), "").unwrap();
    fs::write(dir.path().join("gyro.csv"), "").unwrap();
    let err = load_recording_dir(dir.path()).expect_err("bad float");
    assert!(format!("{err}").contains("row 2"), "{err}");
}
