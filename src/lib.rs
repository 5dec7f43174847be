#[macro_use]
extern crate lazy_static;

#[macro_use]
pub mod log;
pub mod common;
pub mod configuration;
pub mod dot_exporter;
pub mod error;
pub mod exporter;
pub mod loader;
pub mod permutation;
pub mod router;
pub mod simulator;
pub mod topology;
pub mod verify;

pub use crate::configuration::{RoutingConfiguration, SwitchId, SwitchSetting, SwitchState};
pub use crate::error::{Error, Result};
pub use crate::permutation::Permutation;
pub use crate::router::{Router, route};
pub use crate::topology::{Topology, TopologyBuilder};
