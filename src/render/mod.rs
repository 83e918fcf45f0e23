pub mod pipeline;
pub mod sdl;
pub mod sink;

pub use pipeline::{generate, run, ArtifactError, ArtifactResult, GenerationReport};
pub use sdl::{render_sdl, SCHEMA_FILE_NAME};
pub use sink::{ArtifactSink, FsSink, MemorySink};
