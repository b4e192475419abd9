pub mod classifier;
pub mod client;
pub mod providers;
pub mod server;

pub use classifier::{classify, classify_with, Classification, RegionSet};
pub use client::{ClientGeoResolver, ProviderHit};
pub use providers::{GeoProvider, HttpJsonProvider};
pub use server::{InboundRequest, RequestView, Resolution, ServerResolver};
