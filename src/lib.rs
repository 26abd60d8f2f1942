//! Live MJPEG distribution for camera devices
//!
//! One frame source feeds any number of HTTP clients, each receiving a
//! `multipart/x-mixed-replace` stream of JPEG frames. The design is "latest
//! frame only": there is no per-client queue. A bounded registry admits
//! subscribers, a periodic broadcast tick writes the current frame to each
//! of them, and a slower prune cycle drops the ones that went away.
//!
//! # Example
//! ```no_run
//! use mjpeg_fanout::frame::DirectorySource;
//! use mjpeg_fanout::{ServerConfig, StreamServer};
//!
//! # async fn example() -> mjpeg_fanout::error::Result<()> {
//! let source = DirectorySource::open("./frames", 2)?;
//! let server = StreamServer::new(ServerConfig::default(), source);
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fanout;
pub mod frame;
pub mod media;
pub mod registry;
pub mod server;
pub mod stats;
pub mod transport;

pub use error::{Error, Result};
pub use fanout::{FanoutConfig, FanoutService, TickOutcome};
pub use frame::{Frame, FrameSource};
pub use registry::{ClientRegistry, RegistryConfig};
pub use server::{ServerConfig, StreamServer};
pub use stats::StatsSnapshot;
pub use transport::Transport;
