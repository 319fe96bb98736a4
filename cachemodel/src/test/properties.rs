use proptest::prelude::*;

use crate::address::AddressDecoder;
use crate::cache::Cache;
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::timing::TimingMode;

fn policy() -> impl Strategy<Value = ReplacementPolicyConfig> {
    prop::sample::select(ReplacementPolicyConfig::ALL.to_vec())
}

fn small_cache(associativity: u64, policy: ReplacementPolicyConfig) -> Cache {
    Cache::new(&CacheConfig::new(1024 * associativity, 32, associativity, 2, TimingMode::flat(50)).with_policy(policy))
        .expect("valid geometry")
}

proptest! {
    #[test]
    fn decomposition_round_trips(address in any::<u64>(), line_size in 1u64..=4096, num_sets in 1u64..=4096) {
        let decoder = AddressDecoder::new(line_size, num_sets);
        let (tag, index) = decoder.split(address);
        prop_assert_eq!(tag, decoder.tag(address));
        prop_assert_eq!(index, decoder.index(address));
        prop_assert!(index < num_sets);
        prop_assert_eq!(decoder.block_address(tag, index), address / line_size);
    }

    #[test]
    fn repeated_access_hits(
        prefix in prop::collection::vec(0u64..1 << 16, 0..200),
        address in 0u64..1 << 16,
        associativity in 1u64..=8,
        policy in policy(),
    ) {
        let mut cache = small_cache(associativity, policy);
        for a in prefix {
            cache.access(a);
        }
        cache.access(address);
        prop_assert_eq!(cache.access(address), (true, 2));
    }

    #[test]
    fn statistics_stay_in_range(
        trace in prop::collection::vec(0u64..1 << 20, 0..500),
        associativity in 1u64..=8,
        policy in policy(),
    ) {
        let mut cache = small_cache(associativity, policy);
        for a in &trace {
            cache.access(*a);
        }
        prop_assert_eq!(cache.get_accesses(), trace.len() as u64);
        prop_assert_eq!(cache.get_access_counter(), trace.len() as u64);
        let miss_rate = cache.get_miss_rate();
        prop_assert!((0.0..=1.0).contains(&miss_rate));
        prop_assert!(cache.get_amat() >= 2.0);
        prop_assert!(cache.get_valid_line_count() as u64 <= cache.get_geometry().num_sets * associativity);
    }

    #[test]
    fn no_duplicate_residency(
        trace in prop::collection::vec(0u64..1 << 14, 0..400),
        policy in policy(),
    ) {
        let mut cache = small_cache(4, policy);
        for a in trace {
            cache.access(a);
        }
        for index in 0..cache.get_geometry().num_sets {
            let set = cache.get_set(index).expect("index in range");
            let mut tags: Vec<u64> = set.lines().iter().filter(|l| l.valid).map(|l| l.tag).collect();
            let resident = tags.len();
            tags.sort_unstable();
            tags.dedup();
            prop_assert_eq!(tags.len(), resident);
        }
    }

    #[test]
    fn identical_caches_agree(trace in prop::collection::vec(0u64..1 << 16, 0..300), policy in policy()) {
        let mut first = small_cache(4, policy);
        let mut second = small_cache(4, policy);
        for a in trace {
            prop_assert_eq!(first.access(a), second.access(a));
        }
    }
}
