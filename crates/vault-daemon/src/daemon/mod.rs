pub mod activity;
pub mod detector;
pub mod lifecycle;
pub mod poller;
pub mod shutdown;
pub mod watcher;

pub use activity::ActivityLogObserver;
pub use detector::{Detector, DetectorContext, DetectorError};
pub use lifecycle::{Daemon, DaemonError, DaemonHandle};
pub use poller::{PollReport, PollingDetector};
pub use shutdown::{drain_transfers, wait_for_shutdown_signal};
pub use watcher::EventDetector;
