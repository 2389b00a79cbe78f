use bkgeff::compression::Compression;

use clap::Parser;
use env_logger::Env;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

const GZIP_DEFAULT_LEVEL: u8 = 6;
const LZ4_DEFAULT_LEVEL: u8 = 0;
const ZSTD_DEFAULT_LEVEL: u8 = 0;

pub(crate) const LOG_ENV: &str = "BKGEFF_LOG";

lazy_static! {
    static ref COMPRESSION_RE: Regex =
        Regex::new(r"^(?P<algo>[[:alnum:]]+)(?P<lvl>_\d+)?$").unwrap();
}

fn parse_level(
    algo: &str,
    lvl: Option<regex::Match<'_>>,
    max: u8,
    default: u8,
) -> Result<u8, ParseCompressionErr> {
    let Some(lvl) = lvl else {
        return Ok(default);
    };
    match lvl.as_str()[1..].parse::<u8>() {
        Ok(l) if l <= max => Ok(l),
        _ => Err(ParseCompressionErr::UnsupportedLevel(
            lvl.as_str()[1..].to_owned(),
            algo.to_owned(),
        )),
    }
}

pub(crate) fn parse_compr(s: &str) -> Result<Compression, ParseCompressionErr> {
    use Compression::*;
    use ParseCompressionErr::*;

    let lower_case = s.to_ascii_lowercase();
    let Some(captures) = COMPRESSION_RE.captures(&lower_case) else {
        return Err(UnknownAlgorithm(s.to_owned()));
    };
    let algo = &captures["algo"];
    let lvl = captures.name("lvl");
    match algo {
        "bzip2" | "bz2" => match lvl {
            Some(lvl) => Err(UnsupportedLevel(lvl.as_str()[1..].to_owned(), algo.into())),
            None => Ok(Bzip2),
        },
        "gzip" | "gz" => Ok(Gzip(parse_level(algo, lvl, 9, GZIP_DEFAULT_LEVEL)?)),
        "lz4" => Ok(Lz4(parse_level(algo, lvl, 16, LZ4_DEFAULT_LEVEL)?)),
        "zstd" | "zstandard" => Ok(Zstd(parse_level(algo, lvl, 19, ZSTD_DEFAULT_LEVEL)?)),
        _ => Err(UnknownAlgorithm(s.to_string())),
    }
}

#[derive(Debug, Clone, Error)]
pub(crate) enum ParseCompressionErr {
    #[error("Unknown compression algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Level {0} not supported for {1} compression")]
    UnsupportedLevel(String, String),
}

#[derive(Debug, Clone, Parser)]
pub(crate) struct LogOpt {
    #[clap(
        short,
        long,
        default_value = "Info",
        help = "Verbosity level.
Possible values with increasing amount of output are
'off', 'error', 'warn', 'info', 'debug', 'trace'.
The BKGEFF_LOG environment variable takes precedence.\n"
    )]
    pub(crate) loglevel: String,
}

impl LogOpt {
    pub(crate) fn init(&self) {
        let env = Env::default().filter_or(LOG_ENV, &self.loglevel);
        env_logger::init_from_env(env);
    }
}

/// Expand `@file` arguments
pub(crate) fn expanded_args() -> anyhow::Result<Vec<std::ffi::OsString>> {
    use anyhow::Context;
    argfile::expand_args_from(
        std::env::args_os(),
        argfile::parse_fromfile,
        argfile::PREFIX,
    )
    .with_context(|| "Failed to read argument file")
}

pub(crate) fn log_version(name: &str) {
    use bkgeff::{FEATURES, GIT_BRANCH, GIT_REV, VERSION};
    use log::info;
    if let (Some(rev), Some(branch)) = (GIT_REV, GIT_BRANCH) {
        info!("{name} {VERSION} rev {rev} ({branch}) {FEATURES:?}");
    } else {
        info!("{name} {VERSION} {FEATURES:?}");
    }
}
