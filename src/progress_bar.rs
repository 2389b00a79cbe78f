pub use crate::traits::Progress;

use log::LevelFilter;

enum Display {
    Hidden,
    Terminal(indicatif::ProgressBar),
    Log(logbar::ProgressBar),
}

/// Progress over the pT bins of an extraction
///
/// Only shown at the default `info` log level. On an interactive
/// terminal this is an `indicatif` bar, otherwise a `logbar` bar.
/// Log output is suppressed while the bar is active and the previous
/// level is restored by [Progress::finish].
pub struct ProgressBar {
    display: Display,
    restore_level: Option<LevelFilter>,
}

impl Progress for ProgressBar {
    fn inc(&self, i: u64) {
        match &self.display {
            Display::Hidden => {}
            Display::Terminal(bar) => bar.inc(i),
            Display::Log(bar) => bar.inc(i as usize),
        }
    }

    fn finish(&self) {
        match &self.display {
            Display::Hidden => {}
            Display::Terminal(bar) => bar.finish_and_clear(),
            Display::Log(bar) => bar.finish(),
        }
        if let Some(level) = self.restore_level {
            log::set_max_level(level);
        }
    }
}

impl ProgressBar {
    /// A progress bar counting up to `len` with the given message
    pub fn new(len: u64, message: &str) -> Self {
        if log::max_level() != LevelFilter::Info || len == 0 {
            Self::hidden()
        } else if console::Term::stderr().features().is_attended() {
            Self::terminal(len, message)
        } else {
            Self::log(len, message)
        }
    }

    /// A progress bar that shows nothing
    pub fn hidden() -> Self {
        Self {
            display: Display::Hidden,
            restore_level: None,
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self.display, Display::Hidden)
    }

    fn terminal(len: u64, message: &str) -> Self {
        let bar = indicatif::ProgressBar::new(len);
        if let Ok(style) = indicatif::ProgressStyle::default_bar()
            .template("{bar:50.green/green} {msg} {pos}/{len} [{elapsed}]")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_owned());
        Self::silencing_log(Display::Terminal(bar))
    }

    fn log(len: u64, message: &str) -> Self {
        let style = logbar::Style::new().indicator('#');
        eprintln!("{message}");
        let bar = logbar::ProgressBar::with_style(len as usize, style);
        Self::silencing_log(Display::Log(bar))
    }

    fn silencing_log(display: Display) -> Self {
        let restore_level = Some(log::max_level());
        log::set_max_level(LevelFilter::Off);
        Self {
            display,
            restore_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bins() {
        let level = log::max_level();
        let bar = ProgressBar::new(0, "pT bins fitted:");
        assert!(bar.is_hidden());
        bar.inc(1);
        bar.finish();
        assert_eq!(log::max_level(), level);
    }
}
