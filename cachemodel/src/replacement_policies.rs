use crate::cache::CacheLine;

/// A generic trait for replacement policies
///
/// The cache always prefers an invalid line when it has one, so policies are only consulted for
/// sets where every way is valid. Hits are recorded on the lines themselves (`last_used`,
/// `inserted_at`) by the cache, policies which only need those timestamps keep no state
pub trait ReplacementPolicy {
    /// Chooses the way to evict from a full set
    ///
    /// # Arguments
    ///
    /// * `lines`: The lines of the set, indexed by way. Never empty
    ///
    /// returns: usize, the way to evict
    fn pick_victim(&mut self, lines: &[CacheLine]) -> usize;

    /// Returns any internal state to how it was at construction
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    fn reset(&mut self) {}
}

/// Evicts the line which has gone longest without a hit or an insertion
#[derive(Debug, Default, Clone)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn pick_victim(&mut self, lines: &[CacheLine]) -> usize {
        oldest_by(lines, |line| line.last_used)
    }
}

/// Evicts the line which was inserted longest ago, regardless of how often it has been hit
#[derive(Debug, Default, Clone)]
pub struct FirstInFirstOut;

impl ReplacementPolicy for FirstInFirstOut {
    fn pick_victim(&mut self, lines: &[CacheLine]) -> usize {
        oldest_by(lines, |line| line.inserted_at)
    }
}

// Strict less-than, so the lowest way wins ties
#[inline]
fn oldest_by(lines: &[CacheLine], key: impl Fn(&CacheLine) -> u64) -> usize {
    let mut min_value = u64::MAX;
    let mut min_index = 0;
    for (way, line) in lines.iter().enumerate() {
        let value = key(line);
        if value < min_value {
            min_value = value;
            min_index = way;
        }
    }
    min_index
}

/// Evicts a pseudo-randomly chosen way
///
/// The generator belongs to the policy (and so to a single cache), and is seeded from the cache
/// geometry. Two caches with identical parameters fed the same addresses evict identically, which
/// is all that is required here, not any particular distribution
#[derive(Debug, Clone)]
pub struct Random {
    seed: u64,
    rng: XorShiftStar,
}

impl Random {
    pub fn new(cache_size: u64, line_size: u64, associativity: u64) -> Self {
        let seed = geometry_seed(cache_size, line_size, associativity);
        Self {
            seed,
            rng: XorShiftStar::new(seed),
        }
    }
}

impl ReplacementPolicy for Random {
    fn pick_victim(&mut self, lines: &[CacheLine]) -> usize {
        (self.rng.next_u64() % lines.len() as u64) as usize
    }

    fn reset(&mut self) {
        self.rng = XorShiftStar::new(self.seed);
    }
}

const SEED_BASIS: u64 = 0x9e37_79b9_7f4a_7c15;
const SEED_PRIME: u64 = 0x0000_0100_0000_01b3;

fn geometry_seed(cache_size: u64, line_size: u64, associativity: u64) -> u64 {
    [cache_size, line_size, associativity]
        .iter()
        .fold(SEED_BASIS, |seed, value| (seed ^ value).wrapping_mul(SEED_PRIME))
}

/// 64-bit xorshift generator with a multiplicative output scramble (xorshift64*)
#[derive(Debug, Clone)]
pub struct XorShiftStar {
    state: u64,
}

impl XorShiftStar {
    /// A zero state would be a fixed point, it is replaced with a non-zero constant
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { SEED_BASIS } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }
}

/// Enum for the replacement policies provided by the library
///
/// The cache holds one of these rather than a `Box<dyn ReplacementPolicy>`, branching explicitly on
/// the variant lets the compiler see the concrete types and inline the victim search, which runs
/// on every miss
#[derive(Debug, Clone)]
pub enum GenericPolicy {
    LeastRecentlyUsed(LeastRecentlyUsed),
    FirstInFirstOut(FirstInFirstOut),
    Random(Random),
}

impl From<LeastRecentlyUsed> for GenericPolicy {
    fn from(value: LeastRecentlyUsed) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<FirstInFirstOut> for GenericPolicy {
    fn from(value: FirstInFirstOut) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl From<Random> for GenericPolicy {
    fn from(value: Random) -> Self {
        Self::Random(value)
    }
}

impl ReplacementPolicy for GenericPolicy {
    fn pick_victim(&mut self, lines: &[CacheLine]) -> usize {
        match self {
            GenericPolicy::LeastRecentlyUsed(p) => p.pick_victim(lines),
            GenericPolicy::FirstInFirstOut(p) => p.pick_victim(lines),
            GenericPolicy::Random(p) => p.pick_victim(lines),
        }
    }

    fn reset(&mut self) {
        match self {
            GenericPolicy::LeastRecentlyUsed(p) => p.reset(),
            GenericPolicy::FirstInFirstOut(p) => p.reset(),
            GenericPolicy::Random(p) => p.reset(),
        }
    }
}
