pub mod config;
pub mod config_loader;
pub mod hedge;
pub mod report;

pub use config::{AppConfig, BitmexConfig};
pub use config_loader::ConfigLoader;
pub use hedge::{HedgeReport, HedgeSnapshot, OrderPlan, Side};
pub use report::{format_amount, HedgeFormatter};
