// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::io::{self, Write};

use clap::{App, Arg, ArgMatches, SubCommand};
use tracing::warn;

use crate::cmds::{self, Cmd};
use crate::descriptor::AppDescriptor;
use crate::strategy::StrategyEnv;
use crate::Error;

const STRATEGY: &str = "strategy";

/// Load and validate ecosystem files
#[derive(Debug)]
pub struct Check;

impl Check {
    /// Writes one line per app, returns the number of apps that failed
    pub fn report<W: Write>(
        apps: &[AppDescriptor],
        check_strategy: bool,
        out: &mut W,
    ) -> Result<usize, Error> {
        let mut failed = 0;

        for app in apps {
            let strategy = if check_strategy {
                Some(StrategyEnv::from_descriptor(app))
            } else {
                None
            };

            match strategy {
                Some(Err(err)) => {
                    warn!(app = %app.name, %err, "strategy environment is invalid");
                    writeln!(out, "FAIL {}: {}", app.name, err)?;
                    failed += 1;
                }
                Some(Ok(strategy)) => writeln!(
                    out,
                    "ok   {} {} ({} vars, {} on product {})",
                    app.name,
                    app.script.display(),
                    app.env.len(),
                    strategy.strategy,
                    strategy.product_symbol,
                )?,
                None => writeln!(
                    out,
                    "ok   {} {} ({} vars)",
                    app.name,
                    app.script.display(),
                    app.env.len()
                )?,
            }
        }

        Ok(failed)
    }
}

impl Cmd for Check {
    const NAME: &'static str = "check";

    fn sub_command() -> App<'static, 'static> {
        SubCommand::with_name(Self::NAME)
            .about("Load and validate ecosystem files")
            .arg(cmds::config_arg())
            .arg(
                Arg::with_name(STRATEGY)
                    .short("s")
                    .long(STRATEGY)
                    .help("also check every app's strategy runner environment"),
            )
    }

    fn run(args: &ArgMatches<'_>) -> Result<i32, Error> {
        let apps = cmds::load_configs(args)?;

        let stdout = io::stdout();
        let failed = Self::report(&apps, args.is_present(STRATEGY), &mut stdout.lock())?;

        Ok(if failed == 0 { 0 } else { 1 })
    }
}
