pub mod document;
pub mod keys;
pub mod legacy;
pub mod ordered_map;

pub use document::{split_name_value, ConfigDocument, IniDocument, PropertyDocument};
pub use ordered_map::{DuplicatePolicy, Entry, OrderedMap};
