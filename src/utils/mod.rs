pub mod data;
pub mod dates;
pub mod fallback;
pub mod normalizer;
pub mod odds;
pub mod table;
