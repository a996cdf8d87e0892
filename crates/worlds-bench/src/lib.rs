//! Benchmark profiles for the Worlds compiler.
//!
//! - [`reference_profile`]: 200 species, 2 000 instances, 50 worlds
//! - [`stress_profile`]: 1 000 species, 20 000 instances, 500 worlds

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use worlds_core::Graph;
use worlds_test_utils::GraphGen;

/// A mid-sized graph with one transfer per ten instances.
pub fn reference_profile(seed: u64) -> Graph {
    GraphGen::new(seed)
        .animals(200)
        .instances(2_000)
        .worlds(50)
        .transfers(200)
        .max_str(16)
        .generate()
}

/// A large graph for stress testing the layout and emission paths.
///
/// Roughly a megabyte of image, well inside the default 16 MiB bound.
pub fn stress_profile(seed: u64) -> Graph {
    GraphGen::new(seed)
        .animals(1_000)
        .instances(20_000)
        .worlds(500)
        .transfers(5_000)
        .max_str(24)
        .generate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile_shape() {
        let g = reference_profile(42);
        assert_eq!(g.animals.len(), 200);
        assert_eq!(g.instances.len(), 2_000);
        assert_eq!(g.worlds.len(), 50);
        assert_eq!(g.transfers.len(), 200);
    }
}
