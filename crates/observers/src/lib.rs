//! Reusable observers for Stride solver adapters.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work with any adapter event exposing the right data.
//!
//! # Modules
//!
//! - [`traits`]: capability traits for cross-solver observers
//!   ([`HasIteration`], [`HasObjective`], [`CanStopEarly`])
//! - [`progress`]: logs iteration progress through the `log` facade
//! - [`trace`]: records objective histories and stops on a target objective
//!
//! [`Observer`]: stride_core::Observer
//! [`HasIteration`]: traits::HasIteration
//! [`HasObjective`]: traits::HasObjective
//! [`CanStopEarly`]: traits::CanStopEarly

pub mod progress;
pub mod trace;
pub mod traits;

pub use progress::Progress;
pub use trace::{ObjectiveBelow, Trace};
