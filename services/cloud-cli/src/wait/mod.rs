pub mod poller;
pub mod printer;
pub mod schedule;
pub mod waiter;

pub use poller::JobPoller;
pub use poller::OperationPoller;
pub use poller::PollResult;
pub use poller::Poller;
pub use printer::QuietWaitPrinter;
pub use printer::TransitionWaitPrinter;
pub use printer::VerboseWaitPrinter;
pub use printer::WaitPrinter;
pub use printer::WaitPrinterKind;
pub use schedule::PollSchedule;
pub use waiter::WaitOptions;
pub use waiter::Waiter;
