//! Alert decision core: camera and subscriber registries, the latest-alert slot and the engine
//! that turns a frame's detections into an alert.
//!
//! All shared state is owned by the structures below and handed to request handlers by the
//! caller. Each structure sits behind its own `tokio::sync::RwLock`; locks are held only for the
//! read or write itself and never across model inference.

pub mod alert;
pub mod cameras;
pub mod config;
pub mod engine;
pub mod error;
pub mod subscribers;

pub use alert::{first_dangerous, Alert, DangerousSet, LatestAlert};
pub use cameras::{CameraRecord, CameraRegistry, UNKNOWN_LOCATION};
pub use config::{ConfigError, Settings};
pub use engine::{AlertEngine, DecisionPolicy, FrameOutcome, Verdict};
pub use error::RegistryError;
pub use subscribers::{AlertDispatcher, DispatchError, LogDispatcher, Subscriber, SubscriberRegistry};
