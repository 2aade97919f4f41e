// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use clap::{App, Arg, ArgMatches};
use tracing::error;
use tracing_subscriber::EnvFilter;

use strategyrc::cmds::{self, Check, Cmd, Env, Run, Show};
use strategyrc::Error;

trait SetupClapApp {
    fn setup_clap_app(self) -> Self;
    fn default_subcommand_opts(self) -> Self;
}

impl<'a, 'b> SetupClapApp for App<'a, 'b> {
    fn setup_clap_app(self) -> Self {
        self.version(env!("CARGO_PKG_VERSION"))
            .author(env!("CARGO_PKG_AUTHORS"))
    }

    fn default_subcommand_opts(self) -> Self {
        self.arg(
            Arg::with_name(cmds::STRICT)
                .long(cmds::STRICT)
                .help("reject env keys declared more than once instead of keeping the last value"),
        )
    }
}

fn sub_command<C: Cmd>() -> App<'static, 'static> {
    C::sub_command().setup_clap_app().default_subcommand_opts()
}

fn main() {
    // logs go to stderr, stdout is for `show` and `env` output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = App::new(env!("CARGO_PKG_NAME"))
        .setup_clap_app()
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .subcommand(sub_command::<Check>())
        .subcommand(sub_command::<Show>())
        .subcommand(sub_command::<Env>())
        .subcommand(sub_command::<Run>())
        .get_matches();

    match dispatch(&args) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            error!(%err, "strategyrc failed");
            std::process::exit(1);
        }
    }
}

fn dispatch(args: &ArgMatches<'_>) -> Result<i32, Error> {
    match args.subcommand() {
        (Check::NAME, Some(args)) => Check::run(args),
        (Show::NAME, Some(args)) => Show::run(args),
        (Env::NAME, Some(args)) => Env::run(args),
        (Run::NAME, Some(args)) => Run::run(args),
        ("", None) => {
            println!("command required");
            println!("{}", args.usage());
            Ok(2)
        }
        (arg, _) => {
            println!("unexpected argument: {}", arg);
            println!("{}", args.usage());
            Ok(2)
        }
    }
}
