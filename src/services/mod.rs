pub mod batch;
pub mod card;
pub mod genre;
pub mod lists;
pub mod normalize;
pub mod providers;
pub mod recommendations;
pub mod scoring;
pub mod settings;

pub use lists::{ListStore, ListWriterHandle};
pub use providers::{AllocineSource, CandidateSource};
pub use recommendations::RecommendationSelector;
