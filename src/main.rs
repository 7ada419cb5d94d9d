use anyhow::Result;
use clap::Parser;

use mos6502_frontend::{
    frontend::{parse_files, ParseArgs},
    instrumentation,
};

#[derive(Parser)]
#[command(version)]
#[command(about = "Parse 6502 assembly into a syntax tree")]
struct Cli {
    #[clap(long)]
    #[clap(help = "Enable chrome tracing")]
    #[clap(long_help = "Enable chrome tracing which on program exit will generate
a json file to be opened with a chrome tracing compatible
viewer.")]
    trace: bool,
    #[clap(short, long, action = clap::ArgAction::Count)]
    #[clap(help = "Log more, can be repeated")]
    verbose: u8,
    #[command(flatten)]
    args: ParseArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _trace_guard = instrumentation::init(cli.verbose, cli.trace);

    parse_files(&cli.args)
}
