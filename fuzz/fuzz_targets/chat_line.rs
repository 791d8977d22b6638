#![no_main]

use coordwatch::extract_chat_message;
use libfuzzer_sys::fuzz_target;

const MAX_LINE_LEN: usize = 4096;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_LINE_LEN {
        return;
    }
    let line = String::from_utf8_lossy(data);

    // Also try the seed wrapped in a plausible chat prefix so the fuzzer
    // reaches the username and content groups quickly.
    let wrapped = format!("[12:34:56] [Server thread/INFO]: <{}\n", line);

    for candidate in [line.as_ref(), wrapped.as_str()] {
        if let Some(message) = extract_chat_message(candidate) {
            assert!(!message.username.is_empty());
            assert!(!message.username.contains('>'));
            assert!(!message.content.is_empty());
            assert!(!message.content.ends_with('\n'));
        }
    }
});
