#![no_main]

use libfuzzer_sys::fuzz_target;
use puppet_skin::{BindConfig, Illustration, VectorAsset};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(asset) = VectorAsset::from_json(json) {
        // Binding may reject the asset but must not panic
        let _ = Illustration::bind(&asset, Default::default(), &BindConfig::default());
    }
});
