/// Something a cache line can be fetched from
///
/// Implemented by [`crate::cache::Cache`] and the terminal [`crate::memory::Memory`], so a miss at
/// one level can be handed to whatever sits below it without knowing its concrete type
///
/// The trait assumes that splitting accesses spanning multiple lines is the responsibility of the
/// caller
pub trait BackingStore {
    /// Looks up the line holding `address`, updating any internal state
    ///
    /// returns: (hit, latency), where latency is the total cycles this level spent on the request,
    /// including servicing a miss
    fn access(&mut self, address: u64) -> (bool, u64);

    /// Zeroes counters and drops any cached contents
    fn reset_stats(&mut self);
}
