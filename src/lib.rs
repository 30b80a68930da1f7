//! Monthly flight-delay estimator for an airline/airport pair.
//!
//! A validated [`FeatureVector`] goes through an injected [`Predictor`]
//! (normally the loaded [`DelayModel`] artifact) and the resulting minutes
//! are presented as minutes, hours and days.

pub mod config;
pub mod error;
pub mod model;
pub mod page;
pub mod present;
pub mod server;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, InputError, ModelError, PredictError};
pub use model::{DelayModel, ModelMeta, Predictor};
pub use present::{DisplayedPrediction, Prediction};
pub use server::{build_router, AppState};
pub use types::{Airport, Carrier, FeatureInput, FeatureVector, Season};
