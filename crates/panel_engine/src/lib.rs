//! Panel engine: backend client, stream decoding and effect execution.
mod client;
mod engine;
mod frame;
mod persist;
mod sync;
mod types;

pub use client::{
    ClientSettings, PanelApi, QuerySink, ReqwestApi, DEFAULT_API_PREFIX, DEFAULT_BASE_URL,
    PREMATURE_CLOSE,
};
pub use engine::EngineHandle;
pub use frame::{FrameDecoder, FRAME_DELIMITER, FRAME_PREFIX};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use sync::{load_settings, save_settings};
pub use types::{EngineError, EngineEvent, StreamEnd};
