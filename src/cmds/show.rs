// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use clap::{App, ArgMatches, SubCommand};
use serde::Serialize;

use crate::cmds::{self, Cmd};
use crate::descriptor::AppDescriptor;
use crate::Error;

#[derive(Serialize)]
struct Ecosystem<'a> {
    apps: &'a [AppDescriptor],
}

/// Re-serializes loaded apps as an ecosystem json document, loadable again
pub fn render(apps: &[AppDescriptor]) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(&Ecosystem { apps })?)
}

/// Print the apps as they were loaded
#[derive(Debug)]
pub struct Show;

impl Cmd for Show {
    const NAME: &'static str = "show";

    fn sub_command() -> App<'static, 'static> {
        SubCommand::with_name(Self::NAME)
            .about("Print the loaded apps as json, after duplicate keys are resolved")
            .arg(cmds::config_arg())
    }

    fn run(args: &ArgMatches<'_>) -> Result<i32, Error> {
        let apps = cmds::load_configs(args)?;
        println!("{}", render(&apps)?);
        Ok(0)
    }
}
