//! Property-based tests for specifier rewriting and path helpers.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::injection::normalize::{normalize, GivenInjection};
    use crate::resolver::alias::{AliasTable, ReplacementTable};
    use crate::resolver::path::{is_file_path_in_location, normalize_paths, LoaderRequest};
    use indexmap::IndexMap;
    use proptest::prelude::*;
    use std::path::Path;

    fn alias_table() -> impl Strategy<Value = AliasTable> {
        prop::collection::vec(("[a-c]{1,3}\\$?", "[a-d]{0,3}"), 0..4).prop_map(AliasTable::from_pairs)
    }

    // ============================================================================
    // Alias and replacement properties
    // ============================================================================

    proptest! {
        /// Property: once no alias matches the output, applying again changes nothing
        #[test]
        fn aliasing_is_idempotent_on_unmatched_output(
            table in alias_table(),
            specifier in "[a-d./]{0,8}"
        ) {
            let once = table.apply(&specifier);
            prop_assume!(!table.matches(&once));
            prop_assert_eq!(table.apply(&once), once);
        }

        /// Property: a specifier matching no alias is returned unchanged
        #[test]
        fn unmatched_specifiers_pass_through(
            table in alias_table(),
            specifier in "[e-z]{0,8}"
        ) {
            prop_assert_eq!(table.apply(&specifier), specifier);
        }

        /// Property: the empty replacement table is the identity
        #[test]
        fn empty_replacement_table_is_identity(specifier in ".*") {
            let table = ReplacementTable::default();
            prop_assert_eq!(table.apply(&specifier), specifier);
        }
    }

    // ============================================================================
    // Path helper properties
    // ============================================================================

    proptest! {
        /// Property: normalize_paths is stable and never yields duplicates
        #[test]
        fn normalize_paths_is_stable(paths in prop::collection::vec("[ab/.]{0,6}", 0..8)) {
            let once = normalize_paths(&paths);
            prop_assert_eq!(normalize_paths(&once), once.clone());
            for (index, path) in once.iter().enumerate() {
                prop_assert!(!once[index + 1..].contains(path));
            }
        }

        /// Property: splitting a specifier into loaders, request and query loses nothing
        #[test]
        fn loader_request_parts_concatenate_to_input(specifier in "[a-c!?=./]{0,12}") {
            let parsed = LoaderRequest::parse(&specifier);
            prop_assert_eq!(
                format!("{}{}{}", parsed.loaders, parsed.request, parsed.query),
                specifier.clone()
            );
            prop_assert!(!parsed.request.contains('!'));
        }

        /// Property: a sibling sharing a name prefix is never inside the location
        #[test]
        fn location_containment_respects_boundaries(
            directory in "[a-c]{1,4}",
            suffix in "[a-c]{1,4}"
        ) {
            let location = Path::new("/project").join(&directory);
            let sibling = Path::new("/project").join(format!("{}{}", directory, suffix));
            prop_assert!(!is_file_path_in_location(&sibling, &[&location]));
            prop_assert!(is_file_path_in_location(&location.join(&suffix), &[&location]));
        }
    }

    // ============================================================================
    // Injection normalization properties
    // ============================================================================

    proptest! {
        /// Property: normalization never yields an empty chunk map or empty chunks
        /// next to non-empty ones
        #[test]
        fn normalized_chunks_are_never_empty(
            chunks in prop::collection::vec(
                ("[a-c]{1,2}", prop::collection::vec("[a-c./]{1,4}", 0..3)),
                0..4
            )
        ) {
            let chunks: IndexMap<String, Vec<String>> = chunks.into_iter().collect();
            let normalized = normalize(&GivenInjection::Chunks(chunks));
            prop_assert!(!normalized.is_empty());
            let all_empty = normalized.values().all(Vec::is_empty);
            if all_empty {
                prop_assert_eq!(normalized.len(), 1);
                prop_assert!(normalized.contains_key("index"));
            } else {
                prop_assert!(normalized.values().all(|specifiers| !specifiers.is_empty()));
            }
        }
    }
}
