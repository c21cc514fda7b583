pub mod checkpoint;
pub mod epoch_stats;
pub mod event_log;
pub mod loop_fn;
pub mod train_config;
pub mod trainer;

pub use epoch_stats::EpochStats;
pub use event_log::EventLog;
pub use loop_fn::train_loop;
pub use train_config::TrainConfig;
pub use trainer::{train_network, TrainReport};
