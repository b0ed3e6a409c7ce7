// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Runs a farm of bots from the command line, using a YAML configuration
//! file. Meant to be scheduled by cron:
//!
//! ```text
//! $ tweetbot-farm config/bots_configuration.yml
//! $ tweetbot-farm myBots.yml --bot=myBotName
//! $ tweetbot-farm configFile.yml --cronlogs=/tmp/my_cronlogs.yml --debug
//! ```

use std::path::PathBuf;

use structopt::StructOpt;
use tweetbot::Farm;

#[derive(StructOpt)]
#[structopt(name = "tweetbot-farm")]
struct Args {
    /// Path to the YAML farm configuration file
    #[structopt(parse(from_os_str))]
    config: PathBuf,
    /// Run only the named bot instead of the whole farm
    #[structopt(long)]
    bot: Option<String>,
    /// Path of the cron-log file storing last-run timestamps
    #[structopt(long, parse(from_os_str))]
    cronlogs: Option<PathBuf>,
    /// Enable verbose debugging output
    #[structopt(long)]
    debug: bool,
    /// Run every operation regardless of periodicity
    #[structopt(long)]
    force: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::from_args();

    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    if let Err(err) = run(args).await {
        eprintln!("Farm execution stopped with error: \"{}\"", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> tweetbot::Result<()> {
    let mut farm = Farm::from_path(&args.config)?.with_force_update(args.force);
    if let Some(path) = args.cronlogs {
        farm = farm.with_cron_logs_file(path);
    }

    match args.bot {
        Some(name) => farm.run_bot(&name).await,
        None => farm.run().await,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use structopt::StructOpt;

    use super::Args;

    #[test]
    fn parses_all_farm_options() {
        let args = Args::from_iter_safe(&[
            "tweetbot-farm",
            "bots.yml",
            "--bot=myfirstbot",
            "--cronlogs=/tmp/my_cronlogs.yml",
            "--debug",
            "--force",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("bots.yml"));
        assert_eq!(args.bot.as_deref(), Some("myfirstbot"));
        assert_eq!(args.cronlogs, Some(PathBuf::from("/tmp/my_cronlogs.yml")));
        assert!(args.debug);
        assert!(args.force);
    }

    #[test]
    fn config_file_argument_is_required() {
        assert!(Args::from_iter_safe(&["tweetbot-farm", "--force"]).is_err());
    }

    #[test]
    fn options_default_off() {
        let args = Args::from_iter_safe(&["tweetbot-farm", "bots.yml"]).unwrap();
        assert!(args.bot.is_none());
        assert!(args.cronlogs.is_none());
        assert!(!args.debug);
        assert!(!args.force);
    }
}
