// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("jakarta-migrate")
        .version(env!("CARGO_PKG_VERSION"))
        .author("jakarta-migrate contributors")
        .about("Migrate Java archives and classes from javax to jakarta")
        .arg(Arg::new("source").required(true).help("Source file or directory"))
        .arg(
            Arg::new("destination")
                .required(true)
                .help("Destination file or directory"),
        )
        .arg(
            Arg::new("profile")
                .short('p')
                .long("profile")
                .value_parser(["tomcat", "ee"])
                .help("Namespace profile"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("Configuration file (TOML)"),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .value_name("GLOB")
                .action(ArgAction::Append)
                .help("Copy files and entries matching this glob unchanged (repeatable)"),
        )
        .arg(
            Arg::new("log_level")
                .long("log-level")
                .default_value("info")
                .help("Log level when RUST_LOG is not set"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("jakarta-migrate.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
