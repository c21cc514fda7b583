pub mod activation;
pub mod calibration;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod layers;
pub mod loss;
pub mod lsmap;
pub mod math;
pub mod network;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use activation::ActivationFunction;
pub use calibration::CameraCalibration;
pub use config::RunConfig;
pub use data::Dataset;
pub use error::{Error, Result};
pub use lsmap::LensShadingMap;
pub use math::{Matrix, Shape, Tensor3};
pub use network::{Architecture, Network};
pub use train::train_network;
