//! # Sentinel Core
//!
//! Crate compartilhada que define os tipos de dados, os dois protocolos de
//! fio (postura binária e texto de alarme), a política de retry, o gate de
//! dedup/cooldown e a configuração TOML do sistema Sentinela.
//!
//! ## Módulos
//! - [`types`] – Structs e enums do domínio (postura, alarmes, detecções)
//! - [`protocol`] – Protocolo A (byte de postura) e B (reframing de alarmes)
//! - [`alerts`] – Gate de transição de estado com cooldown de re-alerta
//! - [`retry`] – Política de backoff com espera cancelável
//! - [`config`] – Configuração unificada via TOML

pub mod types;
pub mod protocol;
pub mod alerts;
pub mod retry;
pub mod config;

// Re-exports convenientes
pub use types::{AlarmEvent, AlarmKind, PostureCode, PostureSample};
pub use protocol::{decode_posture, encode_posture, split_alarms};
pub use alerts::{CooldownGate, Decision};
pub use retry::RetryPolicy;
pub use config::{AppConfig, DeviceConfig, MonitorConfig};
