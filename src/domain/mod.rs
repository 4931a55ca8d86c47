//! Domain Layer - 领域层
//!
//! 流式分割器：把 LLM 的增量输出整理成适合语音合成的段落

mod segmenter;

pub use segmenter::{
    clean_fragment, is_boundary_char, SegmentConfig, SegmentReport, Segmenter,
    DEFAULT_MAX_BUFFER_CHARS, DEFAULT_MIN_BOUNDARY_INDEX,
};
