pub mod client;
pub mod error;
pub mod normalize;

pub use client::{PrimaryTrigger, ProviderClient, TriggerPath};
pub use error::ProviderError;
pub use normalize::{normalize, NormalizedData, NormalizedPayload};
