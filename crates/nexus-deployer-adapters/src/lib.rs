pub mod artifacts;
#[cfg(target_arch = "wasm32")]
pub mod browser;
pub mod clock;
pub mod config;
pub mod devchain;
pub mod eip1193;
pub mod surface;

pub use artifacts::{attach_artifacts, ArtifactError, HardhatArtifact};
#[cfg(target_arch = "wasm32")]
pub use browser::BrowserSurface;
pub use clock::SystemClockAdapter;
pub use config::{network_by_name, DeployerConfig, RuntimeProfile};
pub use devchain::SimChain;
pub use eip1193::{Eip1193Adapter, RuntimeKind};
pub use surface::ConfiguredSurface;
