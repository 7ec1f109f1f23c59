pub mod heap_map;

pub use heap_map::HeapMap;
