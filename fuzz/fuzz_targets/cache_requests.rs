#![no_main]

use admkit_audio::fuzz_cache_requests;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    fuzz_cache_requests(data);
});
