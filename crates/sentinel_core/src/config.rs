//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável cobre dispositivo e estação;
//! cada binário lê apenas a sua seção.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuração do dispositivo de sensoriamento (cliente TCP).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// IP do relay (servidor STM32 no sistema original)
    pub relay_ip: String,
    /// Porta TCP do relay
    pub relay_port: u16,
    /// Timeout de conexão em segundos
    pub connect_timeout_secs: f64,
    /// Cadência do ciclo de amostragem em segundos
    pub sample_interval_secs: f64,
    /// Máximo de tentativas de conexão na partida
    pub startup_max_attempts: u32,
    /// Intervalo entre tentativas de partida (segundos)
    pub startup_retry_secs: f64,
    /// Limiar de confiança para classificar queda (0.0–1.0)
    pub confidence_threshold: f32,
    /// Caminho do modelo de inferência
    pub model_path: String,
    /// Timeout aguardando conectividade de rede na partida (segundos)
    pub link_join_timeout_secs: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            relay_ip: "192.168.137.211".into(),
            relay_port: 8081,
            connect_timeout_secs: 5.0,
            sample_interval_secs: 0.1,
            startup_max_attempts: 20,
            startup_retry_secs: 2.0,
            confidence_threshold: 0.8,
            model_path: "trained.tflite".into(),
            link_join_timeout_secs: 30.0,
        }
    }
}

/// Configuração do padrão sonoro de alerta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeepConfig {
    pub enabled: bool,
    /// Frequência do tom (Hz)
    pub frequency_hz: u32,
    /// Duração de cada tom (ms)
    pub duration_ms: u64,
    /// Repetições do tom por alerta
    pub repetitions: u32,
    /// Pausa entre repetições (ms)
    pub gap_ms: u64,
}

impl Default for BeepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency_hz: 1000,
            duration_ms: 500,
            repetitions: 3,
            gap_ms: 200,
        }
    }
}

/// Configuração da estação de monitoramento (servidor TCP).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// IP de bind (0.0.0.0 = todas as interfaces)
    pub bind_ip: String,
    /// Porta TCP de escuta
    pub port: u16,
    /// Cooldown de re-alerta para estado repetido (segundos)
    pub cooldown_secs: f64,
    /// Intervalo do poll de accept, para observar shutdown (segundos)
    pub accept_poll_secs: f64,
    /// Tamanho do chunk de leitura por conexão (bytes)
    pub read_buffer_bytes: usize,
    /// Padrão sonoro
    pub beep: BeepConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            bind_ip: "0.0.0.0".into(),
            port: 8888,
            cooldown_secs: 5.0,
            accept_poll_secs: 1.0,
            read_buffer_bytes: 1024,
            beep: BeepConfig::default(),
        }
    }
}

/// Configuração raiz do aplicativo (unifica dispositivo e estação).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub monitor: MonitorConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, content).map_err(|e| e.to_string())?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.device.relay_port == 0 {
            errors.push("Porta do relay não pode ser 0".into());
        }
        if self.device.sample_interval_secs < 0.01 || self.device.sample_interval_secs > 60.0 {
            errors.push(format!(
                "Intervalo de amostragem inválido: {} (0.01–60.0)",
                self.device.sample_interval_secs
            ));
        }
        if self.device.startup_max_attempts == 0 {
            errors.push("startup_max_attempts deve ser >= 1".into());
        }
        if !(0.0..=1.0).contains(&self.device.confidence_threshold) {
            errors.push(format!(
                "Limiar de confiança inválido: {} (0.0–1.0)",
                self.device.confidence_threshold
            ));
        }
        if self.monitor.port == 0 {
            errors.push("Porta da estação não pode ser 0".into());
        }
        if self.monitor.read_buffer_bytes == 0 {
            errors.push("read_buffer_bytes deve ser >= 1".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.device.relay_port, parsed.device.relay_port);
        assert_eq!(config.monitor.cooldown_secs, parsed.monitor.cooldown_secs);
        assert_eq!(config.monitor.beep.repetitions, parsed.monitor.beep.repetitions);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[monitor]
port = 9999
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.monitor.port, 9999);
        // Outros campos devem ter valor padrão
        assert_eq!(config.monitor.cooldown_secs, 5.0);
        assert_eq!(config.device.relay_port, 8081);
        assert_eq!(config.device.startup_max_attempts, 20);
    }

    #[test]
    fn invalid_threshold_is_reported() {
        let config = AppConfig {
            device: DeviceConfig {
                confidence_threshold: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!config.validate().is_empty());
    }
}
