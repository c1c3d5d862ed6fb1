#![no_main]

use libfuzzer_sys::fuzz_target;
use xmlx::Document;

// Anything that loads must save to text that reloads into the same tree.
fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let mut doc = Document::new();
    if doc.load_str(s).is_err() {
        return;
    }
    let saved = doc.save_string();

    let mut reloaded = Document::new();
    if let Err(e) = reloaded.load_str(&saved) {
        panic!("saved output failed to reload: {e}\n{saved}");
    }
    assert_eq!(reloaded.tree(), doc.tree(), "tree changed through\n{saved}");
    assert_eq!(reloaded.save_string(), saved);
});
