//! Política de retry com espera cancelável.
//!
//! Substitui o sleep-and-loop do firmware original por um objeto de política
//! explícito, para que contagem de tentativas, intervalos e cancelamento
//! sejam testáveis sem socket.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Estratégia de espaçamento entre tentativas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Intervalo constante entre tentativas.
    Fixed(Duration),
    /// Intervalo dobrado a cada tentativa, limitado por `cap`.
    Exponential { base: Duration, cap: Duration },
}

/// Política de retry: backoff + número máximo de tentativas.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    backoff: Backoff,
    max_attempts: u32,
}

/// Granularidade da espera cancelável.
const WAIT_SLICE: Duration = Duration::from_millis(50);

impl RetryPolicy {
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            backoff: Backoff::Fixed(interval),
            max_attempts,
        }
    }

    pub fn exponential(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self {
            backoff: Backoff::Exponential { base, cap },
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Intervalo antes da próxima tentativa. `attempt` é 1-based (a espera
    /// acontece depois da tentativa `attempt` falhar).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(interval) => interval,
            Backoff::Exponential { base, cap } => {
                let factor = 1u32 << attempt.saturating_sub(1).min(16);
                base.saturating_mul(factor).min(cap)
            }
        }
    }

    /// Dorme o intervalo da tentativa em fatias, observando `cancel` entre
    /// elas. Retorna `false` se o cancelamento foi sinalizado.
    pub fn wait(&self, attempt: u32, cancel: &AtomicBool) -> bool {
        let mut remaining = self.delay_for(attempt);

        while remaining > Duration::ZERO {
            if cancel.load(Ordering::Relaxed) {
                return false;
            }
            let slice = remaining.min(WAIT_SLICE);
            std::thread::sleep(slice);
            remaining -= slice;
        }

        !cancel.load(Ordering::Relaxed)
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
