#![no_main]

use admkit_document::scene::fuzz_parse_scene;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    fuzz_parse_scene(data);
});
