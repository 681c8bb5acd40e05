// src/matching/mod.rs
pub mod detector;
pub mod name;
pub mod normalize;
pub mod relationship;
pub mod similarity;

pub use detector::{detect_duplicates, detect_duplicates_with_config, score_pair};
pub use name::score_names;
pub use normalize::{extract_name_parts, normalize_name, NameParts};
pub use relationship::score_relationship;
pub use similarity::string_similarity;
