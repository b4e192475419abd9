pub mod config_payload;
pub mod language;

pub use config_payload::{CargoType, ConfigEnvelope, ConfigPayload};
pub use language::{GeoSignal, Language, LanguageDecision, SignalSource};
