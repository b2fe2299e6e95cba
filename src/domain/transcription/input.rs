//! Transcription Context - 转写参数
//!
//! 所有可选参数都有明确默认值；`Option` 字段为 `None` 时不出现在请求体中。

use serde::{Deserialize, Serialize};

/// Whisper 模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WhisperModel {
    #[serde(rename = "tiny")]
    Tiny,
    #[default]
    #[serde(rename = "base")]
    Base,
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "large-v1")]
    LargeV1,
    #[serde(rename = "large-v2")]
    LargeV2,
    #[serde(rename = "large-v3")]
    LargeV3,
}

/// 转写输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionFormat {
    #[default]
    PlainText,
    FormattedText,
    Srt,
    Vtt,
}

/// 转写任务输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionInput {
    /// 音频 URL（通常是签名下载 URL）
    pub audio: String,

    #[serde(default)]
    pub model: WhisperModel,

    #[serde(default)]
    pub transcription: TranscriptionFormat,

    /// 语言，None 表示自动检测
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default)]
    pub temperature: f64,

    #[serde(default = "default_best_of")]
    pub best_of: u32,

    #[serde(default = "default_beam_size")]
    pub beam_size: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patience: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_penalty: Option<f64>,

    #[serde(default = "default_suppress_tokens")]
    pub suppress_tokens: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_prompt: Option<String>,

    #[serde(default)]
    pub condition_on_previous_text: bool,

    #[serde(default = "default_temperature_increment_on_fallback")]
    pub temperature_increment_on_fallback: f64,

    #[serde(default = "default_compression_ratio_threshold")]
    pub compression_ratio_threshold: f64,

    #[serde(default = "default_logprob_threshold")]
    pub logprob_threshold: f64,

    #[serde(default = "default_no_speech_threshold")]
    pub no_speech_threshold: f64,

    #[serde(default)]
    pub enable_vad: bool,

    #[serde(default)]
    pub word_timestamps: bool,
}

fn default_best_of() -> u32 {
    5
}

fn default_beam_size() -> u32 {
    5
}

fn default_suppress_tokens() -> String {
    "-1".to_string()
}

fn default_temperature_increment_on_fallback() -> f64 {
    0.2
}

fn default_compression_ratio_threshold() -> f64 {
    2.4
}

fn default_logprob_threshold() -> f64 {
    -1.0
}

fn default_no_speech_threshold() -> f64 {
    0.6
}

impl TranscriptionInput {
    /// 使用默认参数创建
    pub fn new(audio_url: impl Into<String>) -> Self {
        Self {
            audio: audio_url.into(),
            model: WhisperModel::default(),
            transcription: TranscriptionFormat::default(),
            language: None,
            temperature: 0.0,
            best_of: default_best_of(),
            beam_size: default_beam_size(),
            patience: None,
            length_penalty: None,
            suppress_tokens: default_suppress_tokens(),
            initial_prompt: None,
            condition_on_previous_text: false,
            temperature_increment_on_fallback: default_temperature_increment_on_fallback(),
            compression_ratio_threshold: default_compression_ratio_threshold(),
            logprob_threshold: default_logprob_threshold(),
            no_speech_threshold: default_no_speech_threshold(),
            enable_vad: false,
            word_timestamps: false,
        }
    }

    pub fn with_model(mut self, model: WhisperModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_format(mut self, format: TranscriptionFormat) -> Self {
        self.transcription = format;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_best_of(mut self, best_of: u32) -> Self {
        self.best_of = best_of;
        self
    }

    pub fn with_beam_size(mut self, beam_size: u32) -> Self {
        self.beam_size = beam_size;
        self
    }

    pub fn with_patience(mut self, patience: f64) -> Self {
        self.patience = Some(patience);
        self
    }

    pub fn with_length_penalty(mut self, penalty: f64) -> Self {
        self.length_penalty = Some(penalty);
        self
    }

    pub fn with_suppress_tokens(mut self, tokens: impl Into<String>) -> Self {
        self.suppress_tokens = tokens.into();
        self
    }

    pub fn with_initial_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.initial_prompt = Some(prompt.into());
        self
    }

    pub fn with_condition_on_previous_text(mut self, condition: bool) -> Self {
        self.condition_on_previous_text = condition;
        self
    }

    pub fn with_temperature_increment_on_fallback(mut self, increment: f64) -> Self {
        self.temperature_increment_on_fallback = increment;
        self
    }

    pub fn with_compression_ratio_threshold(mut self, threshold: f64) -> Self {
        self.compression_ratio_threshold = threshold;
        self
    }

    pub fn with_logprob_threshold(mut self, threshold: f64) -> Self {
        self.logprob_threshold = threshold;
        self
    }

    pub fn with_no_speech_threshold(mut self, threshold: f64) -> Self {
        self.no_speech_threshold = threshold;
        self
    }

    pub fn with_vad(mut self, enable: bool) -> Self {
        self.enable_vad = enable;
        self
    }

    pub fn with_word_timestamps(mut self, enable: bool) -> Self {
        self.word_timestamps = enable;
        self
    }
}
