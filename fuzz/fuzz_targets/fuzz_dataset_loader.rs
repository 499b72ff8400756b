#![no_main]
use libfuzzer_sys::fuzz_target;

use mcp_hotel::adapters::dataset::Dataset;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Anything that loads must re-serialize and load again
        if let Ok(dataset) = Dataset::from_json_str(text) {
            let json = dataset.to_json_pretty().expect("loaded dataset serializes");
            let again = Dataset::from_json_str(&json).expect("serialized dataset reloads");
            assert_eq!(dataset, again);
        }
        let _ = Dataset::from_yaml_str(text);
    }
});
