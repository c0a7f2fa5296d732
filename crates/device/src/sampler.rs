//! Loop de amostragem do dispositivo.
//!
//! Cadência fixa: captura → classifica → envia, uma amostra por ciclo.
//! Nenhum erro transitório aborta o loop; desconectado, tenta no máximo uma
//! reconexão por ciclo antes de desistir daquele ciclo.

use crate::classify::{FrameSource, PostureClassifier};
use crate::link::DeviceLinkManager;
use sentinel_core::types::PostureCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Resultado de um ciclo, para observabilidade e testes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Sent(PostureCode),
    CaptureFailed,
    Offline,
    SendFailed,
}

pub struct Sampler {
    camera: Box<dyn FrameSource>,
    classifier: PostureClassifier,
    link: DeviceLinkManager,
    interval: Duration,
}

impl Sampler {
    pub fn new(
        camera: Box<dyn FrameSource>,
        classifier: PostureClassifier,
        link: DeviceLinkManager,
        interval: Duration,
    ) -> Self {
        Self {
            camera,
            classifier,
            link,
            interval,
        }
    }

    /// Executa um ciclo de amostragem.
    pub fn tick(&mut self) -> CycleOutcome {
        let frame = match self.camera.capture() {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Falha de captura: {e}");
                return CycleOutcome::CaptureFailed;
            }
        };

        let sample = self.classifier.classify(&frame);

        if !self.link.is_connected() {
            info!("Conexão perdida (fase {:?}), tentando reconectar...", self.link.phase());
            if let Err(e) = self.link.connect() {
                // Retry suave em regime: uma tentativa por ciclo, sem teto
                warn!(
                    "Reconexão falhou ({} tentativas desde a última sessão): {e}",
                    self.link.retry_count()
                );
                return CycleOutcome::Offline;
            }
        }

        match self.link.send_posture(sample.code) {
            Ok(()) => {
                match sample.code {
                    PostureCode::Fall => info!(
                        "→ postura 1 (⚠️ queda detectada, confiança {:.2})",
                        sample.confidence
                    ),
                    PostureCode::Normal => debug!(
                        "→ postura 0 (normal, maior confiança fall {:.2})",
                        sample.confidence
                    ),
                }
                CycleOutcome::Sent(sample.code)
            }
            Err(e) => {
                error!("Erro ao enviar postura: {e}");
                CycleOutcome::SendFailed
            }
        }
    }

    /// Loop de amostragem em cadência fixa até o shutdown ser sinalizado.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        while !shutdown.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            self.tick();

            // Dorme pelo tempo restante do intervalo
            let elapsed = cycle_start.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        info!("Loop de amostragem encerrado");
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
