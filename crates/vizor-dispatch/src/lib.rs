//! vizor-dispatch: send image regions to external services and route the
//! results back.
//!
//! [`regions_for`] crops a processed image by its selections.
//! [`RegionDispatcher`] runs every `(region, service)` pair as its own
//! blocking task under a timeout and reports through a single channel.
//! [`ResultBoard`] consumes that channel, keyed by image index and
//! [`ResultLabel`], and drops results from superseded dispatches.
//!
//! ```no_run
//! # use vizor_dispatch::{DispatchConfig, RegionDispatcher, ResultBoard, ServiceError};
//! # async fn run(jobs: Vec<vizor_dispatch::RegionJob>) {
//! let handle = tokio::runtime::Handle::current();
//! let (dispatcher, mut completions) = RegionDispatcher::new(handle, DispatchConfig::default());
//! let mut dispatcher = dispatcher.with_recognizer("ocr", |_: &vizor_pipeline::RgbImage| {
//!     Ok::<_, ServiceError>(String::from("text"))
//! });
//!
//! let mut board = ResultBoard::new();
//! board.begin(&dispatcher.dispatch_recognition(&jobs));
//! while !board.is_settled() {
//!     let Some(completion) = completions.recv().await else { break };
//!     board.accept(completion);
//! }
//! # }
//! ```

pub mod board;
pub mod config;
pub mod dispatcher;
pub mod region;
pub mod service;
pub mod token;

pub use board::{Accepted, NO_TEXT_DETECTED, ResultBoard, SlotValue};
pub use config::DispatchConfig;
pub use dispatcher::{Completion, DispatchTicket, RegionDispatcher, RegionJob, TranslationSource};
pub use region::{Region, RegionLabel, regions_for};
pub use service::{Describer, Recognizer, ServiceError, Translator};
pub use token::{Generation, GenerationCounter, PassKind, ResultLabel, Token};
