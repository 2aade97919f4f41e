// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::io::{self, Write};

use clap::{App, ArgMatches, SubCommand};

use crate::cmds::{self, Cmd};
use crate::descriptor::AppDescriptor;
use crate::loader::find;
use crate::Error;

/// Print one app's environment as it would be injected
#[derive(Debug)]
pub struct Env;

impl Env {
    pub fn write_vars<W: Write>(app: &AppDescriptor, out: &mut W) -> Result<(), Error> {
        for (key, value) in app.env.to_env_vars() {
            writeln!(out, "{}={}", key, value)?;
        }

        Ok(())
    }
}

impl Cmd for Env {
    const NAME: &'static str = "env";

    fn sub_command() -> App<'static, 'static> {
        SubCommand::with_name(Self::NAME)
            .about("Print KEY=VALUE lines for one app")
            .arg(cmds::config_arg())
            .arg(cmds::app_arg())
    }

    fn run(args: &ArgMatches<'_>) -> Result<i32, Error> {
        let apps = cmds::load_configs(args)?;
        let name = args.value_of(cmds::APP).ok_or_else(|| "--app is required")?;

        let stdout = io::stdout();
        Self::write_vars(find(&apps, name)?, &mut stdout.lock())?;
        Ok(0)
    }
}
