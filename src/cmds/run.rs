// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use clap::{App, ArgMatches, SubCommand};
use tokio::runtime;
use tracing::{info, warn};

use crate::cmds::{self, Cmd};
use crate::launch::{launch, LaunchPlan, StdIoConf};
use crate::loader::find;
use crate::Error;

/// Launch one app with its environment injected
///
/// Rules:
///   - spawns exactly once, restarts are the supervisor's business
///   - stdio is inherited
///   - exits with the child's exit code
#[derive(Debug)]
pub struct Run;

impl Cmd for Run {
    const NAME: &'static str = "run";

    fn sub_command() -> App<'static, 'static> {
        SubCommand::with_name(Self::NAME)
            .about("Launch one app and wait for it to exit")
            .arg(cmds::config_arg())
            .arg(cmds::app_arg())
    }

    fn run(args: &ArgMatches<'_>) -> Result<i32, Error> {
        let apps = cmds::load_configs(args)?;
        let name = args.value_of(cmds::APP).ok_or_else(|| "--app is required")?;

        let plan = LaunchPlan::from_descriptor(find(&apps, name)?);
        plan.check_executable()?;

        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async move {
            let mut child = launch(&plan, StdIoConf::inherit())?;
            info!(app = %child.name(), pid = ?child.id(), "launched");

            let status = child.wait().await?;

            let code = status.code().unwrap_or_else(|| {
                warn!(app = %plan.name, %status, "process was terminated by a signal");
                1
            });

            Ok::<_, Error>(code)
        })
    }
}
