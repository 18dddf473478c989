#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use iam_atlas::TrustPolicy;

#[derive(Arbitrary, Debug)]
struct TrustInput {
    document: String,
    arn: Option<String>,
}

fuzz_target!(|input: TrustInput| {
    let document: serde_json::Value = match serde_json::from_str(&input.document) {
        Ok(v) => v,
        Err(_) => return,
    };

    let policy = TrustPolicy::new(&document);
    let allowed = policy.allows(input.arn.as_deref());
    if policy.is_public() {
        assert!(allowed);
    }
});
