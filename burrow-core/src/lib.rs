pub mod error;
pub mod proxy;
pub mod report;
pub mod scan;
pub mod wordlist;

use colored::Colorize;

const BANNER: &str = r#"
  _
 | |__  _   _ _ __ _ __ _____      __
 | '_ \| | | | '__| '__/ _ \ \ /\ / /
 | |_) | |_| | |  | | | (_) \ V  V /
 |_.__/ \__,_|_|  |_|  \___/ \_/\_/
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_yellow().bold());
    println!(
        "  {} {}\n",
        "wordlist path scanner".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
