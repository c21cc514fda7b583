pub mod architecture;
pub mod diagram;
pub mod metadata;
pub mod network;
pub mod spec;
pub mod summary;

pub use architecture::Architecture;
pub use metadata::ModelMetadata;
pub use network::{argmax, Network};
pub use spec::{LayerSpec, NetworkSpec};
