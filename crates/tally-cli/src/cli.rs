use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the default configuration and create the database tables
    Init,

    /// Print the configuration file to stdout
    Config,

    /// Print the resolved config and database locations
    Env,

    /// Insert sample users, printers and invoice templates
    Seed,

    /// Run one model operation and print its JSON result
    #[command(arg_required_else_help = true)]
    Call {
        /// Model name, e.g. `users` or `invoiceTemplates`
        model: String,

        /// Operation name, e.g. `findMany` or `upsert`
        method: String,

        /// Operation arguments as JSON; `-` reads them from stdin
        #[arg(required = false)]
        args: Option<String>,
    },

    /// Serve calls read from stdin, one JSON object per line
    ///
    /// Each line is `{"model": .., "method": .., "args": ..}`; each answer is written
    /// to stdout as one line of JSON, or an error envelope when the call fails.
    Stdio,
}
