// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use nix::unistd::{access, AccessFlags};
use tokio::process::Command;
use tracing::{debug, info};

use crate::descriptor::AppDescriptor;
use crate::error::ValidationError;
use crate::Error;

pub struct StdIoConf {
    pub stdin: Stdio,
    pub stderr: Stdio,
    pub stdout: Stdio,
}

impl StdIoConf {
    /// The child shares the launcher's terminal
    pub fn inherit() -> Self {
        Self {
            stdin: Stdio::inherit(),
            stderr: Stdio::inherit(),
            stdout: Stdio::inherit(),
        }
    }
}

/// The concrete command line for one descriptor
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchPlan {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    interpreted: bool,
}

/// Interpreter implied by the script's extension when none is declared
pub fn default_interpreter(script: &Path) -> Option<&'static str> {
    match script.extension().and_then(OsStr::to_str) {
        Some("py") => Some("python3"),
        Some("js") => Some("node"),
        Some("sh") => Some("sh"),
        _ => None,
    }
}

impl LaunchPlan {
    /// With an interpreter the script becomes its first argument, otherwise the script is run directly
    ///
    /// A directly run relative script is resolved against `cwd`, or `.` without one, so
    /// that it is never looked up on `PATH`.
    pub fn from_descriptor(app: &AppDescriptor) -> Self {
        let mut args = Vec::with_capacity(app.args.len() + 1);

        let interpreter = app
            .interpreter
            .as_deref()
            .or_else(|| default_interpreter(&app.script));

        let (program, interpreted) = match interpreter {
            Some(interpreter) => {
                args.push(app.script.clone().into_os_string());
                (PathBuf::from(interpreter), true)
            }
            None if app.script.is_relative() => {
                let base = app.cwd.as_deref().unwrap_or_else(|| Path::new("."));
                (base.join(&app.script), false)
            }
            None => (app.script.clone(), false),
        };

        args.extend(app.args.iter().map(OsString::from));

        Self {
            name: app.name.clone(),
            program,
            args,
            cwd: app.cwd.clone(),
            env: app.env.to_env_vars(),
            interpreted,
        }
    }

    /// A script run without an interpreter must exist and be executable
    pub fn check_executable(&self) -> Result<(), ValidationError> {
        if self.interpreted {
            return Ok(());
        }

        access(self.program.as_path(), AccessFlags::X_OK).map_err(|errno| {
            ValidationError::new(
                &self.name,
                "script",
                format!("{} is not executable: {}", self.program.display(), errno),
            )
        })
    }
}

pub struct Child {
    name: String,
    child: tokio::process::Child,
}

impl Child {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// None once the child has been waited on
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub async fn wait(&mut self) -> Result<ExitStatus, Error> {
        let status = self.child.wait().await?;
        info!(app = %self.name, %status, "process exited");
        Ok(status)
    }
}

/// Spawns the planned process once, must be called from within a tokio runtime
///
/// The child inherits this process's environment with the plan's variables on top.
pub fn launch(plan: &LaunchPlan, stdio: StdIoConf) -> Result<Child, Error> {
    // the child changes into cwd before exec, a relative program must not move with it
    let program = if plan.cwd.is_some() && plan.program.is_relative() && !plan.interpreted {
        env::current_dir()?.join(&plan.program)
    } else {
        plan.program.clone()
    };

    let mut command = Command::new(&program);
    command
        .args(&plan.args)
        .envs(plan.env.iter().map(|(key, value)| (key, value)))
        .kill_on_drop(true)
        .stdin(stdio.stdin)
        .stdout(stdio.stdout)
        .stderr(stdio.stderr);

    if let Some(ref cwd) = plan.cwd {
        command.current_dir(cwd);
    }

    debug!(app = %plan.name, program = %program.display(), vars = plan.env.len(), "spawning");
    let child = command
        .spawn()
        .map_err(|e| Error::spawn(&plan.name, e))?;

    Ok(Child {
        name: plan.name.clone(),
        child,
    })
}
