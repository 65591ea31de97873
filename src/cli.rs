// Command-line surface. `Cli` is the parsed-arguments struct handed to
// `ui::run`; nothing else in the crate reads `std::env::args`.

use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

const USAGE: &str = "\
----- 'danft' \"Dan File Transfer\" Help -----
01 Use 'danft' to quickly upload or download a file or 'clip' to/from the cloud
02 Upload a file to the cloud: ' danft put <filepath> '
03 Upload a clip to the cloud: ' danft putclip <string of text in quotes> '
04 Download a file from the cloud: ' danft get <filename> <OPTIONAL new filename>'
05 Download the last file uploaded: ' danft get '
06 Download the last text clip: ' danft getclip '
07 NOTE: Commands are accepted in lower case, UPPER case or Capitalized form
08 NOTE: If your parameters include embedded spaces, remember to enclose those parameters in quotes
09 NOTE: Use the web application if your clip includes newline characters
----- 'danft' Help -----";

#[derive(Parser, Debug)]
#[command(name = "danft", version, about, after_help = USAGE)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Command>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Pass many times for more log output
    ///
    /// By default errors, warnings and info are reported,
    /// `-v` enables debug messages, `-vv` trace messages.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Silence all log output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    pub quiet: bool,
}

/// Where to send requests and how to authenticate them.
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionArgs {
    /// Base URL of the drop box service
    #[arg(long, env = "DANFT_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Shared secret sent in the X-Upload-Key header
    #[arg(long, env = "DANFT_UPLOAD_KEY", global = true, hide_env_values = true)]
    pub upload_key: Option<String>,

    /// Config file (defaults to <config dir>/danft/config.json)
    #[arg(long, env = "DANFT_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Upload a file to the cloud
    #[command(aliases = ["PUT", "Put"])]
    Put { path: PathBuf },

    /// Upload a text clip to the cloud
    #[command(aliases = ["PUTCLIP", "PutClip", "Putclip"])]
    Putclip {
        #[arg(allow_hyphen_values = true)]
        text: String,
    },

    /// Download a file (the last uploaded one when no name is given)
    #[command(aliases = ["GET", "Get"])]
    Get {
        name: Option<String>,
        /// Save the download under this name instead of the server's
        new_name: Option<String>,
    },

    /// Download the last text clip
    #[command(aliases = ["GETCLIP", "GetClip", "Getclip"])]
    Getclip,

    /// Store the base URL and upload key in the config file
    Configure,

    /// Print usage
    #[command(aliases = ["h", "H", "HELP", "Help"])]
    Help,
}

impl Cli {
    /// Set up `env_logger`. `DANFT_LOG` overrides the level chosen by flags.
    pub fn init_logging(&self) {
        let level = match (self.quiet, self.verbose) {
            (true, _) => log::LevelFilter::Off,
            (false, 0) => log::LevelFilter::Info,
            (false, 1) => log::LevelFilter::Debug,
            (false, _) => log::LevelFilter::Trace,
        };

        env_logger::Builder::new()
            .filter_level(level)
            .parse_env("DANFT_LOG")
            .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
            .init();
    }

    pub fn print_help() -> std::io::Result<()> {
        Self::command().print_long_help()
    }
}
