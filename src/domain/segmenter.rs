//! 流式文本分割器
//!
//! 将 LLM 逐步输出的文本片段（fragment）重新打包为适合语音合成的段落（segment）：
//! - 清洗 markdown 噪声字符
//! - 累积到缓冲区后查找断句标点
//! - 缓冲区过长时强制输出
//! - 流结束时输出剩余内容

use std::time::{Duration, Instant};

/// 断句标点的最小位置（按字符计，0 起始）
/// 位于此位置之前的标点不触发分割，避免输出过短的片段
pub const DEFAULT_MIN_BOUNDARY_INDEX: usize = 5;

/// 缓冲区最大字符数，超过后整体输出
pub const DEFAULT_MAX_BUFFER_CHARS: usize = 30;

/// 需要从片段中移除的 markdown 噪声字符
const NOISE_CHARS: [char; 3] = ['*', '#', '`'];

/// 分割配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentConfig {
    /// 断句标点的最小字符位置
    pub min_boundary_index: usize,
    /// 缓冲区最大字符数
    pub max_buffer_chars: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_boundary_index: DEFAULT_MIN_BOUNDARY_INDEX,
            max_buffer_chars: DEFAULT_MAX_BUFFER_CHARS,
        }
    }
}

/// 检查是否为断句标点（全角与半角）
#[inline]
pub fn is_boundary_char(ch: char) -> bool {
    matches!(ch, '，' | '。' | '！' | '？' | ',' | '.')
}

/// 移除片段中的 `*`、`#` 和反引号
pub fn clean_fragment(fragment: &str) -> String {
    fragment.chars().filter(|c| !NOISE_CHARS.contains(c)).collect()
}

/// 单次流的统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentReport {
    /// 已输出的段落数
    pub segments: usize,
    /// 首个段落相对流开始的耗时
    pub first_segment: Option<Duration>,
    /// 流结束（finish）相对流开始的耗时
    pub completed: Option<Duration>,
}

/// 流式分割器
///
/// 每个独立的流使用一个实例；缓冲区只由该实例持有和修改。
#[derive(Debug)]
pub struct Segmenter {
    config: SegmentConfig,
    buffer: String,
    started_at: Instant,
    report: SegmentReport,
}

impl Segmenter {
    /// 以当前时间作为流开始时间创建
    pub fn new(config: SegmentConfig) -> Self {
        Self::started_at(config, Instant::now())
    }

    /// 指定流开始时间（请求发出的时刻）
    pub fn started_at(config: SegmentConfig, started_at: Instant) -> Self {
        Self {
            config,
            buffer: String::new(),
            started_at,
            report: SegmentReport::default(),
        }
    }

    /// 当前尚未输出的缓冲内容
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    pub fn report(&self) -> &SegmentReport {
        &self.report
    }

    /// 处理一个片段，返回需要立即交给下游的段落（0~2 个，按顺序）
    ///
    /// 空片段直接跳过，不触发断句扫描；清洗后才变空的片段（如 `**`）照常扫描。
    pub fn process(&mut self, fragment: &str) -> Vec<String> {
        let mut segments = Vec::new();
        if fragment.is_empty() {
            return segments;
        }

        self.buffer.push_str(&clean_fragment(fragment));

        // 每次调用最多按标点分割一次，剩余标点留给后续调用
        if let Some(end) = self.find_boundary() {
            let rest = self.buffer.split_off(end);
            let head = std::mem::replace(&mut self.buffer, rest);
            self.emit(head, &mut segments);
        }

        if self.buffer.chars().count() > self.config.max_buffer_chars {
            let head = std::mem::take(&mut self.buffer);
            self.emit(head, &mut segments);
        }

        segments
    }

    /// 流结束：输出剩余内容并记录总耗时
    pub fn finish(&mut self) -> Option<String> {
        let rest = clean_fragment(&std::mem::take(&mut self.buffer));

        let mut segments = Vec::with_capacity(1);
        self.emit(rest, &mut segments);

        let elapsed = self.started_at.elapsed();
        self.report.completed = Some(elapsed);
        tracing::info!(
            elapsed_ms = elapsed.as_millis() as u64,
            segments = self.report.segments,
            "llm time to last chunk: {:.3}s",
            elapsed.as_secs_f64()
        );

        segments.pop()
    }

    /// 查找第一个满足位置要求的断句标点，返回其后的字节偏移
    fn find_boundary(&self) -> Option<usize> {
        self.buffer
            .char_indices()
            .enumerate()
            .find(|(index, (_, ch))| *index >= self.config.min_boundary_index && is_boundary_char(*ch))
            .map(|(_, (offset, ch))| offset + ch.len_utf8())
    }

    fn emit(&mut self, segment: String, out: &mut Vec<String>) {
        if segment.trim().is_empty() {
            return;
        }

        if self.report.first_segment.is_none() {
            let elapsed = self.started_at.elapsed();
            self.report.first_segment = Some(elapsed);
            tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "llm time to first segment: {:.3}s",
                elapsed.as_secs_f64()
            );
        }

        tracing::info!("llm: {}", segment);
        self.report.segments += 1;
        out.push(segment);
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(SegmentConfig::default())
    }
}
