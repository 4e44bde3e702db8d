#![no_main]
use chunking_core::{buzhash, buzhash_update};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Property 7: buzhash_update(buzhash(b[0..W]), b0, b[W], W, seed) ==
    // buzhash(b[1..W+1], seed), for any window width the input can supply.
    if data.len() < 2 {
        return;
    }
    let seed = u32::from_le_bytes([
        data[0],
        data.get(1).copied().unwrap_or(0),
        data.get(2).copied().unwrap_or(0),
        data.get(3).copied().unwrap_or(0),
    ]);
    let body = &data[data.len().min(4)..];
    if body.len() < 2 {
        return;
    }
    // Try every window width that fits, not just the largest, so small
    // inputs still exercise the recurrence.
    for w in 1..body.len() {
        if body.len() < w + 1 {
            break;
        }
        let h0 = buzhash(&body[0..w], seed);
        let rolled = buzhash_update(h0, body[0], body[w], w, seed);
        let direct = buzhash(&body[1..w + 1], seed);
        assert_eq!(rolled, direct, "rolling/full hash mismatch at window {w}");
    }
});
