//! # Sentinela Monitor
//!
//! Estação de monitoramento: recebe do relay o stream de texto de alarmes
//! (protocolo B), reconstrói registros discretos, deduplica transições de
//! estado com cooldown de re-alerta e dispara o padrão sonoro nas quedas.

mod notify;
mod server;

use notify::{AudioNotifier, Notifier};
use sentinel_core::alerts::CooldownGate;
use sentinel_core::config::AppConfig;
use server::AlarmServer;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, warn};

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }
    for e in config.validate() {
        warn!("Config: {e}");
    }

    let cfg = &config.monitor;

    // ── Estado compartilhado + notificador ──
    let gate = Arc::new(Mutex::new(CooldownGate::new(
        Duration::from_secs_f64(cfg.cooldown_secs),
        Instant::now(),
    )));
    let notifier: Arc<dyn Notifier> = Arc::new(AudioNotifier::new(cfg.beep.clone()));

    // ── Listener ──
    let server = match AlarmServer::bind(cfg, gate, notifier) {
        Ok(server) => server,
        Err(e) => {
            error!("❌ Falha ao escutar em {}:{}: {e}", cfg.bind_ip, cfg.port);
            std::process::exit(1);
        }
    };

    // ── Banner ──
    let listen_addr = server
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| format!("{}:{}", cfg.bind_ip, cfg.port));
    println!();
    println!("══════════════════════════════════════════════");
    println!("   🖥️ SENTINELA MONITOR – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    println!("  Escutando:  {listen_addr}");
    println!("  Cooldown:   {:.1}s", cfg.cooldown_secs);
    println!("  Alerta:     {} Hz × {} ({}ms)", cfg.beep.frequency_hz, cfg.beep.repetitions, cfg.beep.duration_ms);
    println!("══════════════════════════════════════════════");
    println!();

    // Timeouts são o único cancelamento de primeira classe; o flag existe
    // para testes e para embutir o servidor
    let shutdown = AtomicBool::new(false);
    server.run(&shutdown);
}
