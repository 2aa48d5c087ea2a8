//! LLM access: message model, streaming contract, wire decoders and vendor adapters

pub mod json_array_decoder;
pub mod messages;
pub mod providers;
pub mod sse_decoder;
pub mod streaming;

pub use messages::{Choice, Message, Question, Response, Role, Usage};
pub use providers::{Provider, ProviderInstance, http_client};
pub use streaming::{
    ChunkAccumulator, ChunkSender, ResponseChunk, ResponseStream, StreamDecoder, collect_stream,
    drive_decoder,
};
