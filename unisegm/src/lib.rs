pub mod character_model;
pub mod corpus;
pub mod errors;
pub mod language_model;
pub mod lattice;
pub mod sampler;
pub mod segmenter;
pub mod sentence;
pub mod trainer;

const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn get_version() -> &'static str {
    VERSION
}
