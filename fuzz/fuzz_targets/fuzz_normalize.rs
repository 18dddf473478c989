#![no_main]
use libfuzzer_sys::fuzz_target;
use iam_atlas::ExportLoader;

// Arbitrary bytes through the loader: errors are fine, panics are not
fuzz_target!(|data: &[u8]| {
    let model = match ExportLoader::default().load_reader(data) {
        Ok(m) => m,
        Err(_) => return,
    };

    let resolver = model.resolver();
    for user in model.users() {
        let _ = resolver.groups_of(user);
        let _ = resolver.policies_of(user);
        let _ = resolver.assumable_roles_for(user);
    }
    for policy in model.policies() {
        let _ = resolver.attached_entities_of(policy);
        let _ = resolver.default_document(policy);
    }
    for group in model.groups() {
        let _ = resolver.users_of(group);
    }
});
