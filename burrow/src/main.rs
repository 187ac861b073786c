use burrow::commands::command_argument_builder;
use burrow::{ScanArgs, handle_scan, init_logging};
use burrow_core::print_banner;
use colored::Colorize;

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    let args = ScanArgs::from_matches(&matches);

    if !args.quiet {
        print_banner();
    }

    if let Err(e) = init_logging(&args.log_file, args.verbose) {
        eprintln!("{} {:#}", "[!]".red().bold(), e);
        std::process::exit(1);
    }

    if let Err(e) = handle_scan(args).await {
        eprintln!("{} {:#}", "[!]".red().bold(), e);
        std::process::exit(1);
    }
}
