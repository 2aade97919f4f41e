// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

mod check;
mod env;
mod run;
mod show;

pub use check::Check;
pub use env::Env;
pub use run::Run;
pub use show::{render, Show};

use clap::{App, Arg, ArgMatches};

use crate::descriptor::AppDescriptor;
use crate::loader::{DuplicateKeys, Loader};
use crate::Error;

pub const CONFIG: &str = "config";
pub const APP: &str = "app";
pub const STRICT: &str = "strict";

/// A trait to define common construction of a subcommand
pub trait Cmd {
    const NAME: &'static str;

    fn sub_command() -> App<'static, 'static>;

    /// Returns the process exit code
    fn run(args: &ArgMatches<'_>) -> Result<i32, Error>;
}

pub(crate) fn config_arg() -> Arg<'static, 'static> {
    Arg::with_name(CONFIG)
        .value_name("CONFIG")
        .help("ecosystem file(s), plain json or `module.exports = {...};`")
        .required(true)
        .multiple(true)
}

pub(crate) fn app_arg() -> Arg<'static, 'static> {
    Arg::with_name(APP)
        .short("a")
        .long(APP)
        .value_name("NAME")
        .help("name of the app in the ecosystem")
        .required(true)
        .takes_value(true)
}

pub(crate) fn loader(args: &ArgMatches<'_>) -> Loader {
    if args.is_present(STRICT) {
        Loader::new().duplicate_keys(DuplicateKeys::Reject)
    } else {
        Loader::new()
    }
}

pub(crate) fn load_configs(args: &ArgMatches<'_>) -> Result<Vec<AppDescriptor>, Error> {
    let paths = args
        .values_of_os(CONFIG)
        .ok_or_else(|| "at least one config is required")?;

    loader(args).load_paths(paths)
}
