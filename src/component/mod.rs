//! Buffer-exchange decoder component
//!
//! Bridges a port-based buffer protocol (encoded buffers in, I420 pictures
//! out, one completion per buffer) to a [`DecoderEngine`](crate::codec::DecoderEngine).

pub mod buffer;
pub mod drain;
pub mod error;
pub mod extradata;
pub mod lifecycle;
pub mod params;
pub mod pipeline;
pub mod ports;
pub mod state;

pub use buffer::{BufferFlags, InputBuffer, OutputBuffer};
pub use drain::{select_timestamp, DecodeOutcome};
pub use error::{ComponentError, ComponentResult};
pub use extradata::{ExtradataBuffer, EXTRADATA_PADDING};
pub use lifecycle::DecoderLifecycle;
pub use params::{RvFormat, VideoParam, VideoParamIndex, VideoParamValue, WmvFormat};
pub use pipeline::SoftVideoDecoder;
pub use ports::{BufferPorts, HostEvent, PortIndex, PortQueues};
pub use state::{DecodeStateMachine, EosStatus, ErrorClass, ErrorLog};
