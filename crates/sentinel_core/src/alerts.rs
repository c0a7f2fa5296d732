//! Gate de dedup e cooldown dos alarmes da estação.
//!
//! Uma única instância por processo, compartilhada por todos os handlers de
//! conexão sob `Arc<Mutex<_>>`. O estado só muda por uma transição
//! classificada ou por um re-emit de heartbeat após o cooldown, nunca
//! espontaneamente.

use crate::types::AlarmKind;
use std::time::{Duration, Instant};

/// Estado corrente da estação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostureState {
    Normal,
    Fall,
}

impl From<AlarmKind> for PostureState {
    fn from(kind: AlarmKind) -> Self {
        match kind {
            AlarmKind::Fall => PostureState::Fall,
            AlarmKind::Cleared => PostureState::Normal,
        }
    }
}

/// Motivo de um dispatch emitido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitReason {
    /// Mudança de estado – sempre emitida, independente do tempo.
    Transition,
    /// Estado repetido após o cooldown expirar (re-alerta periódico).
    Heartbeat,
}

/// Decisão do gate para um evento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Emit(EmitReason),
    Suppress,
}

impl Decision {
    pub fn is_emit(self) -> bool {
        matches!(self, Decision::Emit(_))
    }
}

/// Gate de transição de estado com re-alerta limitado por cooldown.
#[derive(Debug)]
pub struct CooldownGate {
    current: PostureState,
    last_emit: Instant,
    cooldown: Duration,
}

impl CooldownGate {
    /// Estado inicial: `Normal`, com o relógio de cooldown semeado em `now`
    /// (a estação original semeia `last_alarm_time` na partida).
    pub fn new(cooldown: Duration, now: Instant) -> Self {
        Self {
            current: PostureState::Normal,
            last_emit: now,
            cooldown,
        }
    }

    pub fn current(&self) -> PostureState {
        self.current
    }

    /// Aplica um evento em ordem de chegada e decide emitir ou suprimir.
    ///
    /// - Estado diferente do corrente: transição, emite incondicionalmente.
    /// - Mesmo estado: suprime, a menos que `now - last_emit > cooldown`,
    ///   caso em que re-emite como heartbeat e renova o relógio.
    pub fn decide(&mut self, kind: AlarmKind, now: Instant) -> Decision {
        let target = PostureState::from(kind);

        if target != self.current {
            self.current = target;
            self.last_emit = now;
            return Decision::Emit(EmitReason::Transition);
        }

        if now.duration_since(self.last_emit) > self.cooldown {
            self.last_emit = now;
            return Decision::Emit(EmitReason::Heartbeat);
        }

        Decision::Suppress
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(5);

    fn gate(now: Instant) -> CooldownGate {
        CooldownGate::new(COOLDOWN, now)
    }

    #[test]
    fn first_fall_is_a_transition() {
        let t0 = Instant::now();
        let mut g = gate(t0);
        assert_eq!(
            g.decide(AlarmKind::Fall, t0 + Duration::from_millis(10)),
            Decision::Emit(EmitReason::Transition)
        );
        assert_eq!(g.current(), PostureState::Fall);
    }

    #[test]
    fn duplicate_fall_within_cooldown_is_suppressed() {
        let t0 = Instant::now();
        let mut g = gate(t0);
        assert!(g.decide(AlarmKind::Fall, t0).is_emit());
        assert_eq!(
            g.decide(AlarmKind::Fall, t0 + Duration::from_secs(2)),
            Decision::Suppress
        );
    }

    #[test]
    fn duplicate_fall_after_cooldown_reemits_as_heartbeat() {
        let t0 = Instant::now();
        let mut g = gate(t0);
        assert!(g.decide(AlarmKind::Fall, t0).is_emit());
        assert_eq!(
            g.decide(AlarmKind::Fall, t0 + Duration::from_secs(6)),
            Decision::Emit(EmitReason::Heartbeat)
        );
        // O heartbeat renova o relógio: outro duplicado logo depois suprime
        assert_eq!(
            g.decide(AlarmKind::Fall, t0 + Duration::from_secs(7)),
            Decision::Suppress
        );
    }

    #[test]
    fn every_transition_emits_regardless_of_timing() {
        let t0 = Instant::now();
        let mut g = gate(t0);
        let mut emitted = 0;
        for (kind, dt_ms) in [
            (AlarmKind::Fall, 0),
            (AlarmKind::Cleared, 50),
            (AlarmKind::Fall, 100),
        ] {
            if g.decide(kind, t0 + Duration::from_millis(dt_ms)).is_emit() {
                emitted += 1;
            }
        }
        assert_eq!(emitted, 3);
    }

    #[test]
    fn initial_cleared_within_cooldown_is_suppressed() {
        // Estado já é Normal na partida; um Cleared imediato não emite
        let t0 = Instant::now();
        let mut g = gate(t0);
        assert_eq!(
            g.decide(AlarmKind::Cleared, t0 + Duration::from_secs(1)),
            Decision::Suppress
        );
    }

    #[test]
    fn fall_pair_more_than_cooldown_apart_emits_twice() {
        let t0 = Instant::now();
        let mut g = gate(t0);
        assert!(g.decide(AlarmKind::Fall, t0).is_emit());
        assert!(g.decide(AlarmKind::Fall, t0 + Duration::from_secs(6)).is_emit());
    }
}
