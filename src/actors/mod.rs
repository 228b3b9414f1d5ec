//! Actor-based polling
//!
//! ## Architecture Overview
//!
//! ```text
//!                    ┌─────────────────┐
//!                    │   Hub (main)    │
//!                    └────────┬────────┘
//!                             │ spawns
//!                    ┌────────▼────────┐    commands (mpsc)
//!                    │   PollerActor   │◄─────────────── PollerHandle
//!                    └────────┬────────┘
//!                             │ one cycle at a time
//!                    ┌────────▼────────┐
//!                    │    PollCycle    │── fan-out ──► SessionClient (per target)
//!                    └────────┬────────┘
//!                             │ insert
//!                    ┌────────▼────────┐
//!                    │ TelemetryStore  │◄─────────────── Query API
//!                    └─────────────────┘
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: the poller has an mpsc command channel for control messages
//! 2. **Events**: each finished cycle is published as a `CycleReport` on a
//!    broadcast channel
//! 3. **Request/Response**: oneshot channels for synchronous queries

pub mod cycle;
pub mod messages;
pub mod poller;

pub use cycle::PollCycle;
pub use messages::{CycleReport, PollerCommand, PollerStats};
pub use poller::{PollerActor, PollerHandle};
