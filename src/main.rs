use std::process;

use clap::Parser;

use nodecop::cli::Args;

fn main() {
    let args = Args::parse();
    match nodecop::run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(3);
        }
    }
}
