use oxmon::storage::{Fingerprint, FingerprintHasher, ProvenanceRecord};
use oxmon::utils;
use proptest::prelude::*;
use std::path::Path;

proptest! {
    #[test]
    fn test_chunked_hashing_matches_one_shot(
        data in prop::collection::vec(any::<u8>(), 0..20000),
        chunk in 1usize..4096
    ) {
        // Test invariant: the fingerprint does not depend on how the bytes arrive
        let mut hasher = FingerprintHasher::new();
        for piece in data.chunks(chunk) {
            hasher.update(piece);
        }
        prop_assert_eq!(hasher.finish(), Fingerprint::of(&data));
    }

    #[test]
    fn test_fingerprint_name_is_directory_safe(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let name = Fingerprint::of(&data).to_hex();
        prop_assert_eq!(name.len(), 32);
        prop_assert!(Fingerprint::is_fingerprint_name(&name));
        prop_assert_eq!(name.parse::<Fingerprint>().unwrap(), Fingerprint::of(&data));
    }

    #[test]
    fn test_distinct_content_distinct_fingerprint(
        a in prop::collection::vec(any::<u8>(), 0..256),
        b in prop::collection::vec(any::<u8>(), 0..256)
    ) {
        prop_assume!(a != b);
        prop_assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn test_record_line_is_one_line(
        parts in prop::collection::vec("[^/\u{0}]{1,12}", 1..5)
    ) {
        // Test invariant: any file name yields exactly one newline-terminated line
        let relative = parts.join("/");
        let record = ProvenanceRecord::now(Path::new(&relative));
        let line = record.to_line();

        prop_assert!(line.ends_with('\n'));
        prop_assert_eq!(line.matches('\n').count(), 1);
        prop_assert_eq!(ProvenanceRecord::parse_line(&line).unwrap(), record);
    }

    #[test]
    fn test_no_patterns_never_ignore(path in "[a-z0-9_./-]{0,40}") {
        prop_assert!(!utils::should_ignore(Path::new(&path), &[]));
    }
}
