mod app;
mod commands;
mod config;
mod logging;
mod scope;
mod source;

use std::process;

fn main() {
    if let Err(e) = app::run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
