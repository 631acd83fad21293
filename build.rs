// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn cache_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(
            Arg::new("md_path")
                .required(true)
                .help("Path to the metadata file (optionally compressed)"),
        )
        .arg(
            Arg::new("checksum")
                .required(true)
                .help("Checksum of the metadata, as listed in repomd.xml"),
        )
}

fn build_cli() -> Command {
    Command::new("repocache")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Repocache Contributors")
        .about("Decode RPM repodata and maintain its SQLite caches")
        .subcommand_required(true)
        .subcommand(cache_command("primary", "Update the cache of a primary.xml file"))
        .subcommand(cache_command("filelists", "Update the cache of a filelists.xml file"))
        .subcommand(cache_command("other", "Update the cache of an other.xml file"))
        .subcommand(
            Command::new("update")
                .about("Update all caches of a repository")
                .arg(
                    Arg::new("repo_root")
                        .required(true)
                        .help("Repository root (the directory containing repodata/)"),
                ),
        )
        .subcommand(
            Command::new("dump")
                .about("Print the packages of a metadata file")
                .arg(
                    Arg::new("kind")
                        .required(true)
                        .value_parser(["primary", "filelists", "other"])
                        .help("Document kind"),
                )
                .arg(
                    Arg::new("md_path")
                        .required(true)
                        .help("Path to the metadata file (optionally compressed)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(clap::ArgAction::SetTrue)
                        .help("Print one JSON object per package instead of NEVRAs"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("repocache.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
