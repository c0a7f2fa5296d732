//! Wrapper de classificação de postura sobre o detector externo.
//!
//! O motor de inferência é uma capacidade de caixa-preta: recebe um frame e
//! devolve detecções por classe. O wrapper chama o detector com limiar
//! interno zero e aplica o limiar de confiança por conta própria, separando
//! a decisão de alerta de qualquer saída de visualização/debug.

use sentinel_core::types::{PostureCode, PostureSample, RawDetection};
use std::time::Instant;
use tracing::{debug, warn};

/// Índice da classe "fall" na saída do detector (0 = normal, 1 = queda).
pub const CLASS_FALL: usize = 1;

/// Um frame capturado. Opaco para o classificador; apenas repassado ao
/// detector.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub seq: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("falha de captura: {0}")]
pub struct CaptureError(pub String);

#[derive(Debug, thiserror::Error)]
#[error("falha do detector: {0}")]
pub struct DetectError(pub String);

/// Fonte de frames (câmera).
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<Frame, CaptureError>;
}

/// Motor de inferência. O índice externo do retorno é a classe.
pub trait Detector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        threshold: f32,
    ) -> Result<Vec<Vec<RawDetection>>, DetectError>;
}

/// Classificador de postura: reduz as detecções de um frame a um único
/// [`PostureCode`].
pub struct PostureClassifier {
    detector: Box<dyn Detector>,
    threshold: f32,
}

impl PostureClassifier {
    pub fn new(detector: Box<dyn Detector>, threshold: f32) -> Self {
        Self { detector, threshold }
    }

    /// Classifica um frame.
    ///
    /// Política: entre todas as detecções da classe "fall", toma a maior
    /// confiança; se ≥ limiar, a amostra é `Fall`, senão `Normal`. Uma
    /// detecção malformada (sem confiança ou sem bounding box) é descartada
    /// sem afetar as demais. Erro do detector como um todo resulta em
    /// `Normal` – fail-safe, nunca fail-alarm.
    pub fn classify(&mut self, frame: &Frame) -> PostureSample {
        let captured_at = Instant::now();

        // Limiar interno zero: o filtro de confiança é aplicado aqui
        let detections = match self.detector.detect(frame, 0.0) {
            Ok(d) => d,
            Err(e) => {
                warn!("Detector falhou no frame {}: {e} – assumindo postura normal", frame.seq);
                return PostureSample {
                    code: PostureCode::Normal,
                    confidence: 0.0,
                    captured_at,
                };
            }
        };

        let mut highest_fall = 0.0f32;
        if let Some(fall_detections) = detections.get(CLASS_FALL) {
            for det in fall_detections {
                let (Some(confidence), Some(_rect)) = (det.confidence, det.rect) else {
                    debug!("Detecção malformada descartada no frame {}", frame.seq);
                    continue;
                };
                if confidence > highest_fall {
                    highest_fall = confidence;
                }
            }
        }

        let code = if highest_fall >= self.threshold {
            PostureCode::Fall
        } else {
            PostureCode::Normal
        };

        PostureSample {
            code,
            confidence: highest_fall,
            captured_at,
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
