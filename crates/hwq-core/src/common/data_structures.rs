use fxhash::FxBuildHasher;

pub type Map<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;
pub type Set<T> = hashbrown::HashSet<T, FxBuildHasher>;
