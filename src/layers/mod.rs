pub mod conv;
pub mod dense;
pub mod flatten;
pub mod layer;
pub mod pool;

pub use conv::Conv2d;
pub use dense::Dense;
pub use flatten::Flatten;
pub use layer::Layer;
pub use pool::MaxPool2d;
