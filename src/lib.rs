//! Ground-station gateway core for a GMSK downlink.
//!
//! Implements the receive-decode-dispatch pipeline between a hardware modem
//! and one or more remote collector services:
//!
//! 1. [`radio::RadioSession`] produces [`radio::Frame`]s with link-quality
//!    metadata.
//! 2. [`fec`] corrects the received message as a left-zero-padded
//!    RS(255,223) code block, reporting the number of byte errors
//!    corrected or that the block is unrecoverable.
//! 3. [`packet::classify`] separates telemetry text from coded image chunks.
//! 4. [`gateway::Gateway`] drives the loop: telemetry goes straight to an
//!    [`uploader::UploadSink`], image chunks accumulate in a
//!    [`batch::ImageBatcher`] and are delivered to a
//!    [`uploader::BatchSink`] in bounded batches.
//!
//! All collector submissions are fire-and-forget on a background worker
//! pool so a slow or failing network path never delays frame reception.
//!
//! The modem driver, the collector services, and configuration/CLI loading
//! are external collaborators; this crate models them only at their trait
//! interfaces.

mod error;

pub mod batch;
pub mod fec;
pub mod gateway;
pub mod packet;
pub mod radio;
pub mod uploader;

pub use error::{Error, Result};
