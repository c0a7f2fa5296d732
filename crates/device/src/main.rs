//! # Sentinela Device
//!
//! Lado do dispositivo de sensoriamento: classifica a postura frame a frame
//! e transmite um byte por ciclo ao relay via TCP (protocolo A).
//!
//! Sequência de partida, em ordem fixa e com falha fatal em cada etapa:
//! associação de rede → carga do modelo → conexão inicial com retry
//! limitado. Depois disso o loop de amostragem nunca aborta por erro
//! transitório.

mod classify;
mod error;
mod link;
mod sampler;
mod sim;

use classify::PostureClassifier;
use error::FatalError;
use link::DeviceLinkManager;
use sampler::Sampler;
use sentinel_core::config::AppConfig;
use sentinel_core::retry::RetryPolicy;
use sim::{SitlCamera, SitlDetector, SitlNetwork};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
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

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }
    for e in config.validate() {
        warn!("Config: {e}");
    }

    let cfg = &config.device;
    let endpoint = format!("{}:{}", cfg.relay_ip, cfg.relay_port);
    let interval = Duration::from_secs_f64(cfg.sample_interval_secs);

    // Timeouts são o único cancelamento de primeira classe; o flag existe
    // para testes e para embutir o loop
    let shutdown = AtomicBool::new(false);

    // ── Capacidades externas (SITL no PC) ──
    let network = SitlNetwork::new(Duration::from_millis(200));
    if let Err(e) = network.join(Duration::from_secs_f64(cfg.link_join_timeout_secs)) {
        fatal(e);
    }

    let detector = match SitlDetector::load(Path::new(&cfg.model_path)) {
        Ok(d) => d,
        Err(e) => fatal(e),
    };
    let classifier = PostureClassifier::new(Box::new(detector), cfg.confidence_threshold);

    // ── Conexão inicial com retry limitado ──
    let mut link = DeviceLinkManager::new(
        endpoint.clone(),
        Duration::from_secs_f64(cfg.connect_timeout_secs),
    );
    let policy = RetryPolicy::fixed(
        Duration::from_secs_f64(cfg.startup_retry_secs),
        cfg.startup_max_attempts,
    );
    if let Err(e) = link.ensure_startup_connection(&policy, &shutdown) {
        fatal(e);
    }

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   📷 SENTINELA DEVICE – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    println!("  Relay:      {endpoint}");
    println!("  Intervalo:  {:.0}ms", cfg.sample_interval_secs * 1000.0);
    println!("  Limiar:     {:.2}", cfg.confidence_threshold);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop de amostragem ──
    Sampler::new(Box::new(SitlCamera::new()), classifier, link, interval).run(&shutdown);
}

/// Condição fatal de partida: erro observável e fim do processo, nunca uma
/// espera infinita em silêncio.
fn fatal(err: FatalError) -> ! {
    error!("❌ Condição fatal na partida: {err}");
    std::process::exit(1);
}
