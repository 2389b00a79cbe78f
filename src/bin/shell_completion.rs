mod opt_bkgeff;
mod opt_common;
mod opt_significance;
mod opt_table;
mod opt_toy;

use std::{
    env::var_os,
    ffi::OsStr,
    fs::{create_dir_all, File},
    io::{stdout, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Command, CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, shells::*, Generator};
use dirs::home_dir;
use strum::Display;

#[derive(Copy, Clone, Debug, Display, Eq, PartialEq, Ord, PartialOrd, Hash, ValueEnum)]
#[strum(serialize_all = "lowercase")]
enum Shell {
    Bash,
    Elvish,
    Fish,
    PowerShell,
    Zsh,
}

#[derive(Debug, Parser)]
#[clap(about = "Generate shell completions for all bkgeff tools", version)]
struct ShellSelect {
    /// Shell for which to generate completions
    #[clap(value_enum)]
    shell: Shell,
}

fn commands() -> [(Command, &'static str); 4] {
    [
        (opt_bkgeff::Opt::command(), "bkgeff"),
        (opt_significance::Opt::command(), "bkgeff-significance"),
        (opt_table::Opt::command(), "bkgeff-table"),
        (opt_toy::Opt::command(), "bkgeff-toy"),
    ]
}

fn gen_completion<S: Copy + Generator, W: Write>(shell: S, mut to: W) {
    for (mut cmd, name) in commands() {
        generate(shell, &mut cmd, name, &mut to);
    }
}

fn main() -> Result<()> {
    let shell = ShellSelect::parse().shell;
    eprintln!("Generating {shell} completions");
    match shell {
        Shell::Bash => gen_completion(Bash, gen_bash_outfile()?),
        Shell::Elvish => gen_completion(Elvish, &mut stdout()),
        Shell::Fish => gen_completion(Fish, gen_fish_outfile()?),
        Shell::PowerShell => gen_completion(PowerShell, &mut stdout()),
        Shell::Zsh => gen_completion(Zsh, &mut stdout()),
    }
    Ok(())
}

fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = var_os("XDG_DATA_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let mut dir = home_dir().context("No home directory found")?;
    dir.push(".local");
    dir.push("share");
    Ok(dir)
}

fn gen_bash_outfile() -> Result<File> {
    let mut outfile = match var_os("BASH_COMPLETION_USER_DIR") {
        Some(dir) => PathBuf::from_iter([dir.as_os_str(), OsStr::new("completions")]),
        None => {
            let mut dir = data_dir()?;
            dir.push("bash-completion");
            dir.push("completions");
            dir
        }
    };
    outfile.push("bkgeff.bash");
    create_file(outfile)
}

fn gen_fish_outfile() -> Result<File> {
    let mut outfile = data_dir()?;
    for part in ["fish", "vendor_completions.d", "bkgeff.fish"] {
        outfile.push(part);
    }
    create_file(outfile)
}

fn create_file<P: AsRef<Path>>(name: P) -> Result<File> {
    let name = name.as_ref();
    if let Some(dir) = name.parent() {
        create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {dir:?}"))?;
    }
    eprintln!("Writing completions to {name:?}");
    File::create(name).with_context(|| format!("Failed to create {name:?}"))
}
