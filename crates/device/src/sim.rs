//! Capacidades externas em modo SITL (software-in-the-loop).
//!
//! Câmera, detector e associação de rede do hardware real substituídos por
//! implementações roteirizadas e determinísticas, para rodar a lógica do
//! firmware em um PC durante desenvolvimento e bancada.

use crate::classify::{CaptureError, DetectError, Detector, Frame, FrameSource};
use crate::error::FatalError;
use sentinel_core::types::{RawDetection, Rect};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Câmera simulada: um frame por captura, numerado em sequência.
pub struct SitlCamera {
    seq: u64,
}

impl SitlCamera {
    pub fn new() -> Self {
        Self { seq: 0 }
    }
}

impl Default for SitlCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for SitlCamera {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        self.seq += 1;
        Ok(Frame { seq: self.seq })
    }
}

/// Detector roteirizado: janelas de frames `[início, fim)` nas quais uma
/// detecção de queda é produzida com confiança fixa.
pub struct SitlDetector {
    fall_windows: Vec<(u64, u64)>,
    fall_confidence: f32,
}

impl SitlDetector {
    /// Verifica o asset do modelo e constrói o detector com o roteiro
    /// padrão. O arquivo não é interpretado; a ausência reproduz a condição
    /// fatal do firmware real (`trained.tflite` fora do filesystem).
    pub fn load(model_path: &Path) -> Result<Self, FatalError> {
        if !model_path.exists() {
            return Err(FatalError::ModelMissing(model_path.to_path_buf()));
        }
        info!("Modelo carregado: {}", model_path.display());
        Ok(Self::scripted(vec![(40, 70), (160, 200)], 0.93))
    }

    /// Detector com roteiro explícito.
    pub fn scripted(fall_windows: Vec<(u64, u64)>, fall_confidence: f32) -> Self {
        Self {
            fall_windows,
            fall_confidence,
        }
    }

    fn in_fall_window(&self, seq: u64) -> bool {
        self.fall_windows
            .iter()
            .any(|(start, end)| (*start..*end).contains(&seq))
    }
}

impl Detector for SitlDetector {
    fn detect(
        &mut self,
        frame: &Frame,
        _threshold: f32,
    ) -> Result<Vec<Vec<RawDetection>>, DetectError> {
        let person = Rect { x: 96, y: 40, w: 128, h: 200 };

        let normal = vec![RawDetection::new(0.60, person)];
        let fall = if self.in_fall_window(frame.seq) {
            vec![RawDetection::new(self.fall_confidence, person)]
        } else {
            vec![]
        };

        Ok(vec![normal, fall])
    }
}

/// Primitiva de associação de rede: bloqueia até a conectividade de enlace,
/// com o tempo de associação simulado por um atraso configurável.
pub struct SitlNetwork {
    association_delay: Duration,
}

impl SitlNetwork {
    pub fn new(association_delay: Duration) -> Self {
        Self { association_delay }
    }

    /// Espera a associação, limitada por `timeout`. Estourar o timeout é uma
    /// condição fatal de partida.
    pub fn join(&self, timeout: Duration) -> Result<(), FatalError> {
        if self.association_delay > timeout {
            return Err(FatalError::LinkJoinTimeout(timeout));
        }
        std::thread::sleep(self.association_delay);
        info!("Rede associada após {:?}", self.association_delay);
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{PostureClassifier, CLASS_FALL};
    use sentinel_core::types::PostureCode;

    #[test]
    fn camera_numbers_frames_sequentially() {
        let mut cam = SitlCamera::new();
        assert_eq!(cam.capture().unwrap().seq, 1);
        assert_eq!(cam.capture().unwrap().seq, 2);
    }

    #[test]
    fn missing_model_is_fatal() {
        let result = SitlDetector::load(Path::new("/nonexistent/trained.tflite"));
        assert!(matches!(result, Err(FatalError::ModelMissing(_))));
    }

    #[test]
    fn load_succeeds_with_asset_present() {
        let dir = std::env::temp_dir().join("sentinel_sim_model_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("trained.tflite");
        std::fs::write(&path, b"stub").unwrap();

        assert!(SitlDetector::load(&path).is_ok());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn scripted_windows_drive_the_classifier() {
        let detector = SitlDetector::scripted(vec![(5, 7)], 0.93);
        let mut classifier = PostureClassifier::new(Box::new(detector), 0.8);

        let codes: Vec<PostureCode> = (1..=8)
            .map(|seq| classifier.classify(&Frame { seq }).code)
            .collect();

        assert_eq!(codes[3], PostureCode::Normal); // frame 4
        assert_eq!(codes[4], PostureCode::Fall); // frame 5
        assert_eq!(codes[5], PostureCode::Fall); // frame 6
        assert_eq!(codes[6], PostureCode::Normal); // frame 7 (fim exclusivo)
    }

    #[test]
    fn detector_reports_both_classes() {
        let mut detector = SitlDetector::scripted(vec![(1, 2)], 0.9);
        let out = detector.detect(&Frame { seq: 1 }, 0.0).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[CLASS_FALL].len(), 1);
    }

    #[test]
    fn join_within_timeout_succeeds() {
        let net = SitlNetwork::new(Duration::from_millis(5));
        assert!(net.join(Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn join_past_timeout_is_fatal() {
        let net = SitlNetwork::new(Duration::from_secs(60));
        assert!(matches!(
            net.join(Duration::from_millis(10)),
            Err(FatalError::LinkJoinTimeout(_))
        ));
    }
}
