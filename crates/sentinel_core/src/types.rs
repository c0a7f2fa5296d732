//! Tipos do domínio: postura, alarmes e detecções.
//!
//! Porta dos valores trocados entre o dispositivo OpenMV e a estação de
//! monitoramento do sistema Python original.

use std::time::Instant;

// ──────────────────────────────────────────────
// Postura (lado do dispositivo)
// ──────────────────────────────────────────────

/// Classificação binária de postura transmitida a cada ciclo de amostragem.
///
/// No fio, exatamente 1 byte: `0` = normal, `1` = queda.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostureCode {
    Normal,
    Fall,
}

impl PostureCode {
    /// Valor de 1 byte do protocolo A.
    pub fn as_byte(self) -> u8 {
        match self {
            PostureCode::Normal => 0,
            PostureCode::Fall => 1,
        }
    }
}

/// Amostra de postura produzida uma vez por ciclo. Efêmera, nunca persistida.
#[derive(Debug, Clone, Copy)]
pub struct PostureSample {
    pub code: PostureCode,
    /// Maior confiança da classe "fall" observada no frame (também quando o
    /// veredito é Normal, para diagnóstico).
    pub confidence: f32,
    pub captured_at: Instant,
}

// ──────────────────────────────────────────────
// Detecções (saída bruta do detector externo)
// ──────────────────────────────────────────────

/// Bounding box de uma detecção.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Detecção como retornada pelo motor de inferência, antes de validação.
///
/// Campos ausentes marcam uma detecção malformada; o classificador a descarta
/// sem afetar as demais do mesmo frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDetection {
    pub confidence: Option<f32>,
    pub rect: Option<Rect>,
}

impl RawDetection {
    pub fn new(confidence: f32, rect: Rect) -> Self {
        Self {
            confidence: Some(confidence),
            rect: Some(rect),
        }
    }
}

// ──────────────────────────────────────────────
// Alarmes (lado da estação)
// ──────────────────────────────────────────────

/// Tipo de um registro de alarme reconstruído do stream de texto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmKind {
    Fall,
    Cleared,
}

/// Um registro de alarme reconstruído. Existe apenas durante um dispatch.
#[derive(Debug, Clone)]
pub struct AlarmEvent {
    pub kind: AlarmKind,
    /// Texto original do fragmento, preservado para o log.
    pub raw_text: String,
    pub arrival: Instant,
}

impl AlarmEvent {
    pub fn new(kind: AlarmKind, raw_text: impl Into<String>) -> Self {
        Self {
            kind,
            raw_text: raw_text.into(),
            arrival: Instant::now(),
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
