#![no_std]

extern crate alloc;
extern crate fugit;
extern crate heapless;
#[macro_use]
extern crate log;
extern crate micromath;
extern crate nalgebra;
#[macro_use]
extern crate serde;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod config;
pub mod controller;
pub mod fcs;
pub mod hal;
pub mod mission;
pub mod sync;
pub mod types;

pub use controller::{InspectionController, Output};

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;
