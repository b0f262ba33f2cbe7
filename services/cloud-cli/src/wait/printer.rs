use std::io::Stderr;
use std::io::Write;
use std::time::Duration;

/// Receives progress updates while the waiter polls.
pub trait WaitPrinter: Send {
    fn print(&mut self, id: &str, elapsed: Duration, status: &str);

    /// Called once the wait is over, whatever its outcome.
    fn done(&mut self);
}

/// Prints nothing.
#[derive(Debug, Default)]
pub struct QuietWaitPrinter;

impl WaitPrinter for QuietWaitPrinter {
    fn print(&mut self, _id: &str, _elapsed: Duration, _status: &str) {}

    fn done(&mut self) {}
}

/// Rewrites a single progress line on every update.
#[derive(Debug)]
pub struct VerboseWaitPrinter<W: Write + Send = Stderr> {
    writer: W,
    printed: bool,
}

impl Default for VerboseWaitPrinter {
    fn default() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> VerboseWaitPrinter<W> {
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            printed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> WaitPrinter for VerboseWaitPrinter<W> {
    fn print(&mut self, id: &str, elapsed: Duration, status: &str) {
        // Progress output is best effort.
        let _ = write!(
            self.writer,
            "\rWaiting on {id} ... ({}s) Current status: {status:<7}",
            elapsed.as_secs()
        );
        let _ = self.writer.flush();
        self.printed = true;
    }

    fn done(&mut self) {
        if self.printed {
            let _ = writeln!(self.writer);
            let _ = self.writer.flush();
            self.printed = false;
        }
    }
}

/// Prints one line per status change.
#[derive(Debug)]
pub struct TransitionWaitPrinter<W: Write + Send = Stderr> {
    writer: W,
    last_status: Option<String>,
}

impl Default for TransitionWaitPrinter {
    fn default() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> TransitionWaitPrinter<W> {
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            last_status: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> WaitPrinter for TransitionWaitPrinter<W> {
    fn print(&mut self, id: &str, elapsed: Duration, status: &str) {
        if self.last_status.as_deref() == Some(status) {
            return;
        }

        let _ = writeln!(
            self.writer,
            "Waiting on {id} ... ({}s) Current status: {status}",
            elapsed.as_secs()
        );
        let _ = self.writer.flush();
        self.last_status = Some(status.to_string());
    }

    fn done(&mut self) {
        self.last_status = None;
    }
}

/// Printer selected with `--wait_printer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum WaitPrinterKind {
    Quiet,
    #[default]
    Verbose,
    Transition,
}

impl WaitPrinterKind {
    pub fn create(self) -> Box<dyn WaitPrinter> {
        match self {
            Self::Quiet => Box::new(QuietWaitPrinter),
            Self::Verbose => Box::new(VerboseWaitPrinter::default()),
            Self::Transition => Box::new(TransitionWaitPrinter::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn verbose_printer_rewrites_the_same_line() {
        let mut printer = VerboseWaitPrinter::new(Vec::new());

        printer.print("job_1", Duration::from_secs(0), "PENDING");
        printer.print("job_1", Duration::from_secs(3), "RUNNING");
        printer.done();

        assert_eq!(
            output(printer.into_inner()),
            "\rWaiting on job_1 ... (0s) Current status: PENDING\
             \rWaiting on job_1 ... (3s) Current status: RUNNING\n"
        );
    }

    #[test]
    fn verbose_printer_is_silent_when_nothing_was_printed() {
        let mut printer = VerboseWaitPrinter::new(Vec::new());

        printer.done();

        assert!(printer.into_inner().is_empty());
    }

    #[test]
    fn transition_printer_skips_repeated_statuses() {
        let mut printer = TransitionWaitPrinter::new(Vec::new());

        printer.print("op", Duration::from_secs(0), "PENDING");
        printer.print("op", Duration::from_secs(1), "PENDING");
        printer.print("op", Duration::from_secs(2), "RUNNING");
        printer.print("op", Duration::from_secs(3), "DONE");
        printer.done();

        assert_eq!(
            output(printer.into_inner()),
            "Waiting on op ... (0s) Current status: PENDING\n\
             Waiting on op ... (2s) Current status: RUNNING\n\
             Waiting on op ... (3s) Current status: DONE\n"
        );
    }
}
