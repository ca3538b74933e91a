#![no_main]

use libfuzzer_sys::fuzz_target;
use ticktock_oracle::{Comparator, ResponseTree, normalize};

fuzz_target!(|data: &[u8]| {
    // Split the input into two JSON documents at the first NUL byte
    let (left, right) = match data.iter().position(|&b| b == 0) {
        Some(at) => (&data[..at], &data[at + 1..]),
        None => (data, data),
    };
    let (Ok(left), Ok(right)) = (
        serde_json::from_slice::<serde_json::Value>(left),
        serde_json::from_slice::<serde_json::Value>(right),
    ) else {
        return;
    };
    let left = ResponseTree::from(left);
    let right = ResponseTree::from(right);
    let comparator = Comparator::default();

    // Booleans and nulls are uncomparable on either side, so only the
    // symmetry of the verdict is checked here.
    assert_eq!(
        comparator.equivalent(&left, &right),
        comparator.equivalent(&right, &left),
        "asymmetric verdict for {left} vs {right}"
    );

    // Normalizing twice changes nothing
    let once = normalize(&left);
    assert_eq!(normalize(&once), once);
});
