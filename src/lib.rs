// Library root
// -----------
// `danft` moves one file or one short text clip to and from a cloud drop
// box. The binary (`main.rs`) parses the command line and hands it to
// `ui::run`.
//
// Module responsibilities:
// - `api`: the blocking transfer client (upload, upload clip, download,
//   download clip).
// - `config`: base URL / upload key resolution and the config file.
// - `error`: the typed error returned by the transfer client.
// - `cli`: the clap command surface and logging setup.
// - `ui`: per-command handlers, console output and the `configure` prompts.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod ui;
