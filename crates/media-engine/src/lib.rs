//! Seamline Engine - plays discontinuous recordings as one seekable timeline
//!
//! A [`Timeline`] is built once from sorted [`SegmentDescriptor`]s. The
//! [`SegmentedPlayer`] maps seeks onto it with the Time Mapper, swaps media
//! handles through the [`SegmentLoader`], and keeps at most one player of an
//! [`InstanceRegistry`] playing at a time.
//!
//! [`SegmentDescriptor`]: seamline_core::SegmentDescriptor

mod error;
mod events;
mod loader;
mod mapper;
mod media;
mod notice;
mod player;
mod registry;
mod speed;
mod state;
mod timeline;

pub use error::{EngineError, EngineResult};
pub use events::{EventBus, PlayerEvent};
pub use loader::{SegmentLoader, SwapOutcome};
pub use mapper::{locate, locate_forward, Location};
pub use media::{
    bind, HandleId, LoadRequest, MediaError, MediaFactory, MediaHandle, MediaSignal,
    SignalEnvelope, SignalSink, Subscription,
};
pub use notice::{NoticeBoard, NoticeDuration};
pub use player::{SeekOutcome, SegmentedPlayer};
pub use registry::{InstanceId, InstanceRegistry, Preemptible};
pub use speed::Speed;
pub use state::{PlaybackState, PlayerStatus};
pub use timeline::{Gap, Segment, Timeline};

pub use seamline_config::{PlayerConfig, Preload};
