#![no_main]
use libfuzzer_sys::fuzz_target;
use tripmode_traits::{Classifier, FEATURE_LEN};

fuzz_target!(|data: &str| {
    let Ok(model) = tripmode_config::LinearModel::from_toml_str(data) else {
        return;
    };
    // An accepted model always answers with one of its own codes.
    let code = model.predict(&[0.5; FEATURE_LEN]).unwrap();
    assert!(model.codes().any(|c| c == code));
});
