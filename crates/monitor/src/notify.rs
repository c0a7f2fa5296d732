//! Notificador de alarmes: linha de log + padrão sonoro.
//!
//! O beep é uma capacidade externa de caixa-preta (um tom de frequência e
//! duração dadas). O padrão de queda – 3 repetições com pausa curta – toca
//! em uma thread dedicada alimentada por um channel limitado, para que o
//! dispatch nunca bloqueie um handler de conexão.

use crossbeam_channel::{bounded, Sender};
use sentinel_core::config::BeepConfig;
use sentinel_core::types::{AlarmEvent, AlarmKind};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info};

/// Primitiva externa de áudio.
pub trait Beeper: Send {
    fn beep(&self, frequency_hz: u32, duration_ms: u64);
}

/// Implementação padrão: campainha do terminal (BEL), segurando a duração
/// do tom. A frequência é ignorada – o terminal toca o que tiver.
pub struct TerminalBell;

impl Beeper for TerminalBell {
    fn beep(&self, _frequency_hz: u32, duration_ms: u64) {
        print!("\x07");
        let _ = std::io::stdout().flush();
        std::thread::sleep(Duration::from_millis(duration_ms));
    }
}

/// Destino dos eventos que o gate decide emitir.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &AlarmEvent);
}

/// Notificador com alerta sonoro.
///
/// `Fall` → linha de log + padrão de beeps na thread de áudio; `Cleared` →
/// linha de log apenas. O enfileiramento do beep é não-bloqueante: se a
/// thread de áudio ainda está tocando um padrão atrasado, o novo beep é
/// descartado e o log permanece.
pub struct AudioNotifier {
    tx: Option<Sender<()>>,
}

impl AudioNotifier {
    pub fn new(cfg: BeepConfig) -> Self {
        Self::with_beeper(cfg, Box::new(TerminalBell))
    }

    pub fn with_beeper(cfg: BeepConfig, beeper: Box<dyn Beeper>) -> Self {
        if !cfg.enabled {
            return Self { tx: None };
        }

        let (tx, rx) = bounded::<()>(8);
        std::thread::Builder::new()
            .name("audio-alert".into())
            .spawn(move || {
                for () in rx.iter() {
                    for i in 0..cfg.repetitions {
                        beeper.beep(cfg.frequency_hz, cfg.duration_ms);
                        if i + 1 < cfg.repetitions {
                            std::thread::sleep(Duration::from_millis(cfg.gap_ms));
                        }
                    }
                }
            })
            .expect("Falha ao criar thread de áudio");

        Self { tx: Some(tx) }
    }
}

impl Notifier for AudioNotifier {
    fn notify(&self, event: &AlarmEvent) {
        match event.kind {
            AlarmKind::Fall => {
                info!("🚨 Alarme recebido: {}", event.raw_text);
                if let Some(tx) = &self.tx {
                    if tx.try_send(()).is_err() {
                        debug!("Canal de áudio cheio, beep descartado");
                    }
                }
            }
            AlarmKind::Cleared => {
                info!("✅ Alarme recebido: {}", event.raw_text);
            }
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
