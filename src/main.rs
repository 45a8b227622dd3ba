use crate::cli::run;

pub mod artwork;
pub mod cli;
mod config;
pub mod domain;
pub mod http;
pub mod media;
pub mod presence;

fn main() {
    run();
}
