pub mod forwarder;
pub mod generator_handle;
pub mod metrics;
pub mod providers;

pub use forwarder::{ForwardError, ForwardedResponse, PassthroughForwarder};
pub use generator_handle::{GeneratorFactory, GeneratorHandle};
pub use providers::{GenerationConfig, GenerationPreset, GeneratorError, TextGenerator};
