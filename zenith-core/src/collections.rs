pub type SmallVec<A> = smallvec::SmallVec<A>;
pub use smallvec::smallvec;

/// Seeded with a constant so that iteration order is reproducible from run to run.
pub type DefaultHashBuilder = foldhash::fast::FixedState;

pub mod hashmap {
    pub type HashMap<K, V> = hashbrown::HashMap<K, V, super::DefaultHashBuilder>;
    pub use hashbrown::hash_map::*;
}
