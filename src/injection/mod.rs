//! Entry injection
//!
//! Entry points are given in one of several shapes (see [`GivenInjection`]),
//! normalized into a [`ChunkMap`] and then resolved module by module into an
//! [`InjectionConfiguration`].

use indexmap::IndexMap;

pub mod normalize;
pub mod resolve;

pub use normalize::{normalize, GivenInjection, InjectionFactory};
pub use resolve::{
    EntryInjection, InjectionConfiguration, InjectionResolver, InjectionSettings, ModuleLocations,
};

/// Ordered chunk name to module specifiers mapping
pub type ChunkMap = IndexMap<String, Vec<String>>;

/// Entry value requesting auto-discovery.
pub const AUTO_INJECTION_SENTINEL: &str = "__auto__";

/// Chunk receiving entries not assigned elsewhere.
pub const DEFAULT_CHUNK_NAME: &str = "index";

/// Drop repeated specifiers, keeping the first occurrence.
pub fn deduplicate(specifiers: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    specifiers
        .iter()
        .filter(|specifier| seen.insert(specifier.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deduplicate_keeps_first_occurrence() {
        let specifiers: Vec<String> = ["b", "a", "b", "c", "a"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(deduplicate(&specifiers), ["b", "a", "c"]);
    }
}
