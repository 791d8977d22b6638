#![no_main]

use coordwatch::extract_coordinates;
use libfuzzer_sys::fuzz_target;

const MAX_TEXT_LEN: usize = 2048;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_TEXT_LEN {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Some(position) = extract_coordinates(text) {
        assert!(position.x.is_finite());
        assert!(position.z.is_finite());
        if let Some(y) = position.y {
            assert!(y.is_finite());
        }
        if let Some(comment) = &position.comment {
            assert!(!comment.is_empty());
            assert_eq!(comment.trim(), comment);
        }
    }
});
