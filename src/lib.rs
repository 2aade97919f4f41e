// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Process launch descriptors for strategy runners
//!
//! An ecosystem source lists apps, each with a script and the environment to inject
//! into it. This crate loads and validates those descriptors, checks a strategy
//! runner's environment contract, and can launch one app once.

pub mod cmds;
pub mod descriptor;
mod error;
pub mod launch;
pub mod loader;
pub mod strategy;

pub use descriptor::{validate, AppDescriptor, EnvMap, EnvValue};
pub use error::{Error, ErrorKind, ValidationError};
pub use loader::{load, DuplicateKeys, Loader};
